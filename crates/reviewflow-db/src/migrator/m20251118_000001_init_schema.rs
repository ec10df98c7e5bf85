//! Initial schema: teams, users, pull requests and reviewer assignments

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // 1. Create teams table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Team::Table)
                    .if_not_exists()
                    .col(string_len(Team::TeamName, 255).primary_key())
                    .col(
                        timestamp_with_time_zone(Team::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 2. Create users table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(string_len(User::UserId, 255).primary_key())
                    .col(string_len(User::Username, 255).not_null())
                    .col(string_len(User::TeamName, 255).not_null())
                    .col(boolean(User::IsActive).not_null().default(true))
                    .col(
                        timestamp_with_time_zone(User::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(User::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_team_name")
                            .from(User::Table, User::TeamName)
                            .to(Team::Table, Team::TeamName)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Candidate lookups filter on team + active flag
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_users_team_name_is_active")
                    .table(User::Table)
                    .col(User::TeamName)
                    .col(User::IsActive)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 3. Create pull_requests table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(PullRequest::Table)
                    .if_not_exists()
                    .col(string_len(PullRequest::PullRequestId, 255).primary_key())
                    .col(string_len(PullRequest::PullRequestName, 255).not_null())
                    .col(string_len(PullRequest::AuthorId, 255).not_null())
                    .col(
                        string_len(PullRequest::Status, 16)
                            .not_null()
                            .default("OPEN"),
                    )
                    .col(
                        timestamp_with_time_zone(PullRequest::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(PullRequest::MergedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        timestamp_with_time_zone(PullRequest::UpdatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pull_requests_author_id")
                            .from(PullRequest::Table, PullRequest::AuthorId)
                            .to(User::Table, User::UserId)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_pull_requests_author_id")
                    .table(PullRequest::Table)
                    .col(PullRequest::AuthorId)
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // 4. Create pr_reviewers junction table
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(PrReviewer::Table)
                    .if_not_exists()
                    .col(string_len(PrReviewer::PullRequestId, 255).not_null())
                    .col(string_len(PrReviewer::UserId, 255).not_null())
                    .col(
                        timestamp_with_time_zone(PrReviewer::AssignedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(PrReviewer::PullRequestId)
                            .col(PrReviewer::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pr_reviewers_pull_request_id")
                            .from(PrReviewer::Table, PrReviewer::PullRequestId)
                            .to(PullRequest::Table, PullRequest::PullRequestId)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pr_reviewers_user_id")
                            .from(PrReviewer::Table, PrReviewer::UserId)
                            .to(User::Table, User::UserId)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_pr_reviewers_user_id")
                    .table(PrReviewer::Table)
                    .col(PrReviewer::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PrReviewer::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PullRequest::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Team::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Team {
    #[sea_orm(iden = "teams")]
    Table,
    TeamName,
    CreatedAt,
}

#[derive(DeriveIden)]
enum User {
    #[sea_orm(iden = "users")]
    Table,
    UserId,
    Username,
    TeamName,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PullRequest {
    #[sea_orm(iden = "pull_requests")]
    Table,
    PullRequestId,
    PullRequestName,
    AuthorId,
    Status,
    CreatedAt,
    MergedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PrReviewer {
    #[sea_orm(iden = "pr_reviewers")]
    Table,
    PullRequestId,
    UserId,
    AssignedAt,
}
