//! User entity. Each user belongs to exactly one team.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// External user identifier (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    /// Display name
    pub username: String,

    /// Name of the team the user currently belongs to
    pub team_name: String,

    /// Whether the user can be picked as a reviewer
    pub is_active: bool,

    pub created_at: ChronoDateTimeUtc,

    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::team::Entity",
        from = "Column::TeamName",
        to = "super::team::Column::TeamName",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Team,

    /// Pull requests authored by the user
    #[sea_orm(has_many = "super::pull_request::Entity")]
    AuthoredPullRequests,

    /// Review assignments held by the user
    #[sea_orm(has_many = "super::pr_reviewer::Entity")]
    ReviewAssignments,
}

impl Related<super::team::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl Related<super::pull_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthoredPullRequests.def()
    }
}

impl Related<super::pr_reviewer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReviewAssignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
