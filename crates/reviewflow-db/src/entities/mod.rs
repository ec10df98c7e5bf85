//! Database entities

pub mod pr_reviewer;
pub mod pull_request;
pub mod team;
pub mod user;

pub use pr_reviewer::Entity as PrReviewer;
pub use pull_request::Entity as PullRequest;
pub use team::Entity as Team;
pub use user::Entity as User;

pub mod prelude {
    pub use super::pr_reviewer::Entity as PrReviewer;
    pub use super::pull_request::Entity as PullRequest;
    pub use super::team::Entity as Team;
    pub use super::user::Entity as User;
}
