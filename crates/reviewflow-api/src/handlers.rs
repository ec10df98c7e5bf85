use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{invalid_body, invalid_query, service_error, ApiResult};
use crate::models::*;
use crate::AppState;

/// Create a team and upsert its members
#[utoipa::path(
    post,
    path = "/team/add",
    request_body = Team,
    responses(
        (status = 201, description = "Team created", body = TeamResponse),
        (status = 400, description = "Invalid input or team already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "teams"
)]
pub async fn add_team(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Team>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TeamResponse>)> {
    let Json(team) = payload.map_err(invalid_body)?;
    info!("Creating team: {}", team.team_name);

    let created = state
        .service
        .create_team(team.into())
        .await
        .map_err(service_error)?;

    Ok((
        StatusCode::CREATED,
        Json(TeamResponse {
            team: created.into(),
        }),
    ))
}

/// Get a team with its members
#[utoipa::path(
    get,
    path = "/team/get",
    params(TeamQuery),
    responses(
        (status = 200, description = "Team found", body = Team),
        (status = 400, description = "Missing team name", body = ErrorResponse),
        (status = 404, description = "Team not found", body = ErrorResponse)
    ),
    tag = "teams"
)]
pub async fn get_team(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> ApiResult<Json<Team>> {
    let Query(query) = query.map_err(invalid_query)?;
    debug!("Getting team: {}", query.team_name);

    let team = state
        .service
        .get_team(&query.team_name)
        .await
        .map_err(service_error)?;

    Ok(Json(team.into()))
}

/// Create a user in an existing team, or update it in place
#[utoipa::path(
    post,
    path = "/users/add",
    request_body = UpsertUserRequest,
    responses(
        (status = 201, description = "User stored", body = UserResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Team not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn add_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpsertUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let Json(req) = payload.map_err(invalid_body)?;
    info!("Upserting user {} into team {}", req.user_id, req.team_name);

    let user = state
        .service
        .upsert_user(reviewflow_core::User {
            user_id: req.user_id,
            username: req.username,
            team_name: req.team_name,
            is_active: req.is_active,
        })
        .await
        .map_err(service_error)?;

    Ok((StatusCode::CREATED, Json(UserResponse { user: user.into() })))
}

/// Set whether a user can be picked as a reviewer
#[utoipa::path(
    post,
    path = "/users/setIsActive",
    request_body = SetIsActiveRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn set_is_active(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SetIsActiveRequest>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let Json(req) = payload.map_err(invalid_body)?;
    info!("Setting is_active={} for user {}", req.is_active, req.user_id);

    let user = state
        .service
        .set_user_active(&req.user_id, req.is_active)
        .await
        .map_err(service_error)?;

    Ok(Json(UserResponse { user: user.into() }))
}

/// List pull requests a user is reviewing, newest first
#[utoipa::path(
    get,
    path = "/users/getReview",
    params(UserQuery),
    responses(
        (status = 200, description = "Review requests", body = UserReviewsResponse),
        (status = 400, description = "Missing user id", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user_reviews(
    State(state): State<Arc<AppState>>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<Json<UserReviewsResponse>> {
    let Query(query) = query.map_err(invalid_query)?;
    debug!("Listing review requests for user: {}", query.user_id);

    let prs = state
        .service
        .get_user_review_requests(&query.user_id)
        .await
        .map_err(service_error)?;

    Ok(Json(UserReviewsResponse {
        user_id: query.user_id,
        pull_requests: prs.into_iter().map(Into::into).collect(),
    }))
}

/// Open a pull request and assign up to two reviewers
#[utoipa::path(
    post,
    path = "/pullRequest/create",
    request_body = CreatePullRequestRequest,
    responses(
        (status = 201, description = "Pull request created", body = PullRequestResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Author or team not found", body = ErrorResponse),
        (status = 409, description = "Pull request already exists", body = ErrorResponse)
    ),
    tag = "pull-requests"
)]
pub async fn create_pull_request(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreatePullRequestRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PullRequestResponse>)> {
    let Json(req) = payload.map_err(invalid_body)?;
    info!(
        "Creating pull request {} by {}",
        req.pull_request_id, req.author_id
    );

    let pr = state
        .service
        .create_pull_request(&req.pull_request_id, &req.pull_request_name, &req.author_id)
        .await
        .map_err(service_error)?;

    Ok((
        StatusCode::CREATED,
        Json(PullRequestResponse { pr: pr.into() }),
    ))
}

/// Merge a pull request (idempotent)
#[utoipa::path(
    post,
    path = "/pullRequest/merge",
    request_body = MergePullRequestRequest,
    responses(
        (status = 200, description = "Pull request merged", body = PullRequestResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Pull request not found", body = ErrorResponse)
    ),
    tag = "pull-requests"
)]
pub async fn merge_pull_request(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MergePullRequestRequest>, JsonRejection>,
) -> ApiResult<Json<PullRequestResponse>> {
    let Json(req) = payload.map_err(invalid_body)?;
    info!("Merging pull request {}", req.pull_request_id);

    let pr = state
        .service
        .merge_pull_request(&req.pull_request_id)
        .await
        .map_err(service_error)?;

    Ok(Json(PullRequestResponse { pr: pr.into() }))
}

/// Replace one reviewer with another active member of their team
#[utoipa::path(
    post,
    path = "/pullRequest/reassign",
    request_body = ReassignRequest,
    responses(
        (status = 200, description = "Reviewer replaced", body = ReassignResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Pull request or user not found", body = ErrorResponse),
        (status = 409, description = "Merged, not assigned, or no candidate", body = ErrorResponse)
    ),
    tag = "pull-requests"
)]
pub async fn reassign_reviewer(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> ApiResult<Json<ReassignResponse>> {
    let Json(req) = payload.map_err(invalid_body)?;
    info!(
        "Reassigning reviewer {} on pull request {}",
        req.old_user_id, req.pull_request_id
    );

    let (pr, replaced_by) = state
        .service
        .reassign_reviewer(&req.pull_request_id, &req.old_user_id)
        .await
        .map_err(service_error)?;

    Ok(Json(ReassignResponse {
        pr: pr.into(),
        replaced_by,
    }))
}

/// Get a pull request with its current reviewers
#[utoipa::path(
    get,
    path = "/pullRequest/get",
    params(PullRequestQuery),
    responses(
        (status = 200, description = "Pull request found", body = PullRequestResponse),
        (status = 400, description = "Missing pull request id", body = ErrorResponse),
        (status = 404, description = "Pull request not found", body = ErrorResponse)
    ),
    tag = "pull-requests"
)]
pub async fn get_pull_request(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PullRequestQuery>, QueryRejection>,
) -> ApiResult<Json<PullRequestResponse>> {
    let Query(query) = query.map_err(invalid_query)?;
    debug!("Getting pull request: {}", query.pull_request_id);

    let pr = state
        .service
        .get_pull_request(&query.pull_request_id)
        .await
        .map_err(service_error)?;

    Ok(Json(PullRequestResponse { pr: pr.into() }))
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
