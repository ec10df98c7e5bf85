//! SeaORM implementation of the review store
//!
//! Uniqueness of team names and pull request ids is enforced by primary keys
//! and detected with `ON CONFLICT DO NOTHING` inserts, so two concurrent
//! creators cannot both succeed. Conditional transitions are single
//! `UPDATE ... WHERE` / `DELETE ... WHERE` statements whose affected-row
//! count decides the outcome. Multi-row writes run in one transaction; a
//! transaction dropped before commit is rolled back.

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use tracing::{debug, info};

use reviewflow_core::{
    async_trait, PullRequest, PullRequestShort, ReviewStore, StoreError, StoreResult, Team,
    TeamMember, User,
};

use crate::entities::pull_request::PrStatus;
use crate::entities::{pr_reviewer, pull_request, team, user};

/// [`ReviewStore`] backed by a SeaORM connection (SQLite or PostgreSQL)
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn backend(err: DbErr) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Map a write error, turning uniqueness violations into `AlreadyExists`
fn classify(err: DbErr, key: &str) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::AlreadyExists(key.to_string()),
        _ => backend(err),
    }
}

fn to_user(model: user::Model) -> User {
    User {
        user_id: model.user_id,
        username: model.username,
        team_name: model.team_name,
        is_active: model.is_active,
    }
}

fn to_member(model: user::Model) -> TeamMember {
    TeamMember {
        user_id: model.user_id,
        username: model.username,
        is_active: model.is_active,
    }
}

fn to_short(model: pull_request::Model) -> PullRequestShort {
    PullRequestShort {
        pull_request_id: model.pull_request_id,
        pull_request_name: model.pull_request_name,
        author_id: model.author_id,
        status: model.status.into(),
    }
}

async fn upsert_user_in<C: ConnectionTrait>(
    conn: &C,
    user: &User,
    now: DateTime<Utc>,
) -> Result<(), DbErr> {
    let model = user::ActiveModel {
        user_id: Set(user.user_id.clone()),
        username: Set(user.username.clone()),
        team_name: Set(user.team_name.clone()),
        is_active: Set(user.is_active),
        created_at: Set(now),
        updated_at: Set(now),
    };

    user::Entity::insert(model)
        .on_conflict(
            OnConflict::column(user::Column::UserId)
                .update_columns([
                    user::Column::Username,
                    user::Column::TeamName,
                    user::Column::IsActive,
                    user::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    Ok(())
}

/// Insert-if-absent keyed on the primary key. Returns false when the key was taken.
async fn insert_team_if_absent<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    now: DateTime<Utc>,
) -> Result<bool, DbErr> {
    let inserted = team::Entity::insert(team::ActiveModel {
        team_name: Set(name.to_string()),
        created_at: Set(now),
    })
    .on_conflict(
        OnConflict::column(team::Column::TeamName)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    Ok(inserted > 0)
}

#[async_trait]
impl ReviewStore for SeaOrmStore {
    async fn team_exists(&self, name: &str) -> StoreResult<bool> {
        let found = team::Entity::find_by_id(name.to_string())
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(found.is_some())
    }

    async fn create_team_atomic(&self, team: &Team) -> StoreResult<()> {
        let now = Utc::now();
        let txn = self.db.begin().await.map_err(backend)?;

        let inserted = insert_team_if_absent(&txn, &team.team_name, now)
            .await
            .map_err(|e| classify(e, &team.team_name))?;
        if !inserted {
            txn.rollback().await.map_err(backend)?;
            return Err(StoreError::AlreadyExists(team.team_name.clone()));
        }

        let ids: Vec<String> = team.members.iter().map(|m| m.user_id.clone()).collect();
        let existing = user::Entity::find()
            .filter(user::Column::UserId.is_in(ids))
            .all(&txn)
            .await
            .map_err(backend)?;
        for previous in existing.iter().filter(|u| u.team_name != team.team_name) {
            info!(
                "User '{}' moves from team '{}' to '{}'",
                previous.user_id, previous.team_name, team.team_name
            );
        }

        for member in &team.members {
            let user = User {
                user_id: member.user_id.clone(),
                username: member.username.clone(),
                team_name: team.team_name.clone(),
                is_active: member.is_active,
            };
            upsert_user_in(&txn, &user, now).await.map_err(backend)?;
        }

        txn.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn get_team_members(&self, name: &str) -> StoreResult<Vec<TeamMember>> {
        let members = user::Entity::find()
            .filter(user::Column::TeamName.eq(name))
            .order_by_asc(user::Column::UserId)
            .all(&self.db)
            .await
            .map_err(backend)?;

        if members.is_empty() {
            return Err(StoreError::NotFound(format!("team {}", name)));
        }

        Ok(members.into_iter().map(to_member).collect())
    }

    async fn upsert_user(&self, user: &User) -> StoreResult<()> {
        upsert_user_in(&self.db, user, Utc::now())
            .await
            .map_err(backend)
    }

    async fn get_user(&self, id: &str) -> StoreResult<User> {
        user::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(backend)?
            .map(to_user)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    async fn set_user_active(&self, id: &str, active: bool) -> StoreResult<User> {
        let txn = self.db.begin().await.map_err(backend)?;

        let result = user::Entity::update_many()
            .set(user::ActiveModel {
                is_active: Set(active),
                updated_at: Set(Utc::now()),
                ..Default::default()
            })
            .filter(user::Column::UserId.eq(id))
            .exec(&txn)
            .await
            .map_err(backend)?;

        if result.rows_affected == 0 {
            txn.rollback().await.map_err(backend)?;
            return Err(StoreError::NotFound(format!("user {}", id)));
        }

        let updated = user::Entity::find_by_id(id.to_string())
            .one(&txn)
            .await
            .map_err(backend)?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;

        txn.commit().await.map_err(backend)?;
        Ok(to_user(updated))
    }

    async fn list_active_team_members(
        &self,
        team: &str,
        exclude_id: &str,
    ) -> StoreResult<Vec<User>> {
        let users = user::Entity::find()
            .filter(user::Column::TeamName.eq(team))
            .filter(user::Column::IsActive.eq(true))
            .filter(user::Column::UserId.ne(exclude_id))
            .order_by_asc(user::Column::UserId)
            .all(&self.db)
            .await
            .map_err(backend)?;

        Ok(users.into_iter().map(to_user).collect())
    }

    async fn create_pr_atomic(&self, pr: &PullRequest) -> StoreResult<()> {
        let now = Utc::now();
        let txn = self.db.begin().await.map_err(backend)?;

        let inserted = pull_request::Entity::insert(pull_request::ActiveModel {
            pull_request_id: Set(pr.pull_request_id.clone()),
            pull_request_name: Set(pr.pull_request_name.clone()),
            author_id: Set(pr.author_id.clone()),
            status: Set(PrStatus::from(pr.status)),
            created_at: Set(pr.created_at),
            merged_at: Set(pr.merged_at),
            updated_at: Set(now),
        })
        .on_conflict(
            OnConflict::column(pull_request::Column::PullRequestId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await
        .map_err(|e| classify(e, &pr.pull_request_id))?;

        if inserted == 0 {
            txn.rollback().await.map_err(backend)?;
            return Err(StoreError::AlreadyExists(pr.pull_request_id.clone()));
        }

        if !pr.assigned_reviewers.is_empty() {
            let rows = pr
                .assigned_reviewers
                .iter()
                .map(|reviewer| pr_reviewer::ActiveModel {
                    pull_request_id: Set(pr.pull_request_id.clone()),
                    user_id: Set(reviewer.clone()),
                    assigned_at: Set(now),
                });

            pr_reviewer::Entity::insert_many(rows)
                .exec_without_returning(&txn)
                .await
                .map_err(|e| classify(e, &pr.pull_request_id))?;
        }

        txn.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn get_pr(&self, id: &str) -> StoreResult<PullRequest> {
        let model = pull_request::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(backend)?
            .ok_or_else(|| StoreError::NotFound(format!("pull request {}", id)))?;

        let reviewers: Vec<String> = pr_reviewer::Entity::find()
            .select_only()
            .column(pr_reviewer::Column::UserId)
            .filter(pr_reviewer::Column::PullRequestId.eq(id))
            .order_by_asc(pr_reviewer::Column::AssignedAt)
            .order_by_asc(pr_reviewer::Column::UserId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(backend)?;

        Ok(PullRequest {
            pull_request_id: model.pull_request_id,
            pull_request_name: model.pull_request_name,
            author_id: model.author_id,
            status: model.status.into(),
            assigned_reviewers: reviewers,
            created_at: model.created_at,
            merged_at: model.merged_at,
        })
    }

    async fn merge_if_open(&self, id: &str, merged_at: DateTime<Utc>) -> StoreResult<bool> {
        let result = pull_request::Entity::update_many()
            .set(pull_request::ActiveModel {
                status: Set(PrStatus::Merged),
                merged_at: Set(Some(merged_at)),
                updated_at: Set(merged_at),
                ..Default::default()
            })
            .filter(pull_request::Column::PullRequestId.eq(id))
            .filter(pull_request::Column::Status.eq(PrStatus::Open))
            .exec(&self.db)
            .await
            .map_err(backend)?;

        Ok(result.rows_affected > 0)
    }

    async fn swap_reviewer_atomic(
        &self,
        pr_id: &str,
        old_id: &str,
        new_id: &str,
    ) -> StoreResult<()> {
        let now = Utc::now();
        let txn = self.db.begin().await.map_err(backend)?;

        // Touching the row only while OPEN serialises this swap against a
        // concurrent merge of the same pull request.
        let still_open = pull_request::Entity::update_many()
            .set(pull_request::ActiveModel {
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(pull_request::Column::PullRequestId.eq(pr_id))
            .filter(pull_request::Column::Status.eq(PrStatus::Open))
            .exec(&txn)
            .await
            .map_err(backend)?;

        if still_open.rows_affected == 0 {
            let exists = pull_request::Entity::find_by_id(pr_id.to_string())
                .one(&txn)
                .await
                .map_err(backend)?
                .is_some();
            txn.rollback().await.map_err(backend)?;
            return Err(if exists {
                StoreError::Merged
            } else {
                StoreError::NotFound(format!("pull request {}", pr_id))
            });
        }

        let removed = pr_reviewer::Entity::delete_many()
            .filter(pr_reviewer::Column::PullRequestId.eq(pr_id))
            .filter(pr_reviewer::Column::UserId.eq(old_id))
            .exec(&txn)
            .await
            .map_err(backend)?;

        if removed.rows_affected == 0 {
            txn.rollback().await.map_err(backend)?;
            return Err(StoreError::NoMatchingRow);
        }

        let inserted = pr_reviewer::Entity::insert(pr_reviewer::ActiveModel {
            pull_request_id: Set(pr_id.to_string()),
            user_id: Set(new_id.to_string()),
            assigned_at: Set(now),
        })
        .on_conflict(
            OnConflict::columns([
                pr_reviewer::Column::PullRequestId,
                pr_reviewer::Column::UserId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&txn)
        .await
        .map_err(|e| classify(e, new_id))?;

        if inserted == 0 {
            txn.rollback().await.map_err(backend)?;
            return Err(StoreError::AlreadyExists(format!(
                "reviewer {} on pull request {}",
                new_id, pr_id
            )));
        }

        txn.commit().await.map_err(backend)?;
        debug!("Swapped reviewer on '{}': '{}' -> '{}'", pr_id, old_id, new_id);
        Ok(())
    }

    async fn list_prs_reviewed_by(&self, user_id: &str) -> StoreResult<Vec<PullRequestShort>> {
        let prs = pull_request::Entity::find()
            .inner_join(pr_reviewer::Entity)
            .filter(pr_reviewer::Column::UserId.eq(user_id))
            .order_by_desc(pull_request::Column::CreatedAt)
            .order_by_desc(pull_request::Column::PullRequestId)
            .all(&self.db)
            .await
            .map_err(backend)?;

        Ok(prs.into_iter().map(to_short).collect())
    }

    async fn is_reviewer_assigned(&self, pr_id: &str, user_id: &str) -> StoreResult<bool> {
        let found = pr_reviewer::Entity::find_by_id((pr_id.to_string(), user_id.to_string()))
            .one(&self.db)
            .await
            .map_err(backend)?;
        Ok(found.is_some())
    }
}
