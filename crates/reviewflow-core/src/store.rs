//! Persistent store contract consumed by the review service
//!
//! Implementations must provide atomic multi-row writes and storage-level
//! uniqueness for team names and pull request ids. Conditional writes
//! (`merge_if_open`, `swap_reviewer_atomic`) must be evaluated inside the
//! same transaction that performs them, so that lost races surface as
//! `Ok(false)` / [`StoreError::NoMatchingRow`] rather than as corrupted rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{PullRequest, PullRequestShort, Team, TeamMember, User};

/// Store operation outcomes
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row for the requested key
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint rejected the write
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A compare-and-set write found no row in the expected state
    #[error("no matching row")]
    NoMatchingRow,

    /// The pull request was merged before the write could apply
    #[error("pull request is merged")]
    Merged,

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn team_exists(&self, name: &str) -> StoreResult<bool>;

    /// Insert the team row and upsert every member in one transaction.
    /// Fails with `AlreadyExists` if the team name is taken.
    async fn create_team_atomic(&self, team: &Team) -> StoreResult<()>;

    /// Members currently stored under `name`. `NotFound` if there are none.
    async fn get_team_members(&self, name: &str) -> StoreResult<Vec<TeamMember>>;

    /// Insert or update a user by id. The user's team must exist.
    async fn upsert_user(&self, user: &User) -> StoreResult<()>;

    async fn get_user(&self, id: &str) -> StoreResult<User>;

    async fn set_user_active(&self, id: &str, active: bool) -> StoreResult<User>;

    /// Active members of `team`, excluding `exclude_id`
    async fn list_active_team_members(&self, team: &str, exclude_id: &str)
        -> StoreResult<Vec<User>>;

    /// Insert the pull request and its reviewer rows in one transaction.
    /// Fails with `AlreadyExists` if the id is taken.
    async fn create_pr_atomic(&self, pr: &PullRequest) -> StoreResult<()>;

    async fn get_pr(&self, id: &str) -> StoreResult<PullRequest>;

    /// Transition OPEN -> MERGED in a single conditional write.
    /// Returns whether a row was affected.
    async fn merge_if_open(&self, id: &str, merged_at: DateTime<Utc>) -> StoreResult<bool>;

    /// Replace the `(pr_id, old_id)` assignment with `(pr_id, new_id)`.
    ///
    /// Re-checks inside the transaction that the pull request is still open
    /// (`Merged` otherwise) and that `old_id` is still assigned
    /// (`NoMatchingRow` otherwise).
    async fn swap_reviewer_atomic(&self, pr_id: &str, old_id: &str, new_id: &str)
        -> StoreResult<()>;

    /// Pull requests `user_id` reviews, newest first
    async fn list_prs_reviewed_by(&self, user_id: &str) -> StoreResult<Vec<PullRequestShort>>;

    async fn is_reviewer_assigned(&self, pr_id: &str, user_id: &str) -> StoreResult<bool>;
}
