//! Reviewer assignment and pull request lifecycle engine
//!
//! The crate holds no I/O of its own. Durable state lives behind the
//! [`ReviewStore`] trait, and correctness under concurrent requests relies on
//! that store's transactional guarantees rather than on in-process locks.

pub mod assignment;
pub mod error;
pub mod model;
pub mod service;
pub mod store;

pub use assignment::{AssignmentError, ReviewerSelector, MAX_INITIAL_REVIEWERS};
pub use error::{ErrorCode, ServiceError, ServiceResult};
pub use model::{PrStatus, PullRequest, PullRequestShort, Team, TeamMember, User};
pub use service::ReviewService;
pub use store::{ReviewStore, StoreError, StoreResult};

// Re-export so store implementors don't need their own dependency
pub use async_trait::async_trait;
