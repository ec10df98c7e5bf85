//! Pull request entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Pull request status as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PrStatus {
    #[sea_orm(string_value = "OPEN")]
    Open,

    /// Terminal
    #[sea_orm(string_value = "MERGED")]
    Merged,
}

impl From<PrStatus> for reviewflow_core::PrStatus {
    fn from(status: PrStatus) -> Self {
        match status {
            PrStatus::Open => reviewflow_core::PrStatus::Open,
            PrStatus::Merged => reviewflow_core::PrStatus::Merged,
        }
    }
}

impl From<reviewflow_core::PrStatus> for PrStatus {
    fn from(status: reviewflow_core::PrStatus) -> Self {
        match status {
            reviewflow_core::PrStatus::Open => PrStatus::Open,
            reviewflow_core::PrStatus::Merged => PrStatus::Merged,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pull_requests")]
pub struct Model {
    /// Pull request identifier (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub pull_request_id: String,

    pub pull_request_name: String,

    pub author_id: String,

    pub status: PrStatus,

    pub created_at: ChronoDateTimeUtc,

    /// Set only when the pull request is merged
    pub merged_at: Option<ChronoDateTimeUtc>,

    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::UserId",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Author,

    #[sea_orm(has_many = "super::pr_reviewer::Entity")]
    Reviewers,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::pr_reviewer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviewers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
