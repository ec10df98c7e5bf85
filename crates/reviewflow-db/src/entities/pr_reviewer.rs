//! Reviewer assignment: one row per (pull request, reviewer) pair

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pr_reviewers")]
pub struct Model {
    /// Pull request id (composite primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub pull_request_id: String,

    /// Reviewer user id (composite primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    /// When the reviewer was assigned
    pub assigned_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pull_request::Entity",
        from = "Column::PullRequestId",
        to = "super::pull_request::Column::PullRequestId",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    PullRequest,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::UserId",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::pull_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PullRequest.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
