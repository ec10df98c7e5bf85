use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use reviewflow_core::model as core;

/// Pull request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PullRequestStatus {
    Open,
    Merged,
}

impl From<core::PrStatus> for PullRequestStatus {
    fn from(status: core::PrStatus) -> Self {
        match status {
            core::PrStatus::Open => PullRequestStatus::Open,
            core::PrStatus::Merged => PullRequestStatus::Merged,
        }
    }
}

/// Team member as submitted with and returned from a team
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamMember {
    /// Stable user identifier
    pub user_id: String,
    /// Display name
    pub username: String,
    /// Whether the user may be picked as a reviewer
    pub is_active: bool,
}

impl From<core::TeamMember> for TeamMember {
    fn from(member: core::TeamMember) -> Self {
        Self {
            user_id: member.user_id,
            username: member.username,
            is_active: member.is_active,
        }
    }
}

impl From<TeamMember> for core::TeamMember {
    fn from(member: TeamMember) -> Self {
        Self {
            user_id: member.user_id,
            username: member.username,
            is_active: member.is_active,
        }
    }
}

/// Team with its members
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Team {
    /// Unique team name
    pub team_name: String,
    /// Team members
    pub members: Vec<TeamMember>,
}

impl From<core::Team> for Team {
    fn from(team: core::Team) -> Self {
        Self {
            team_name: team.team_name,
            members: team.members.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Team> for core::Team {
    fn from(team: Team) -> Self {
        Self {
            team_name: team.team_name,
            members: team.members.into_iter().map(Into::into).collect(),
        }
    }
}

/// User information
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub user_id: String,
    pub username: String,
    /// Team the user belongs to
    pub team_name: String,
    pub is_active: bool,
}

impl From<core::User> for User {
    fn from(user: core::User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            team_name: user.team_name,
            is_active: user.is_active,
        }
    }
}

/// Pull request with its current reviewers
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PullRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
    /// Currently assigned reviewer ids (0 to 2 at creation)
    pub assigned_reviewers: Vec<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Merge timestamp, present once merged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
}

impl From<core::PullRequest> for PullRequest {
    fn from(pr: core::PullRequest) -> Self {
        Self {
            pull_request_id: pr.pull_request_id,
            pull_request_name: pr.pull_request_name,
            author_id: pr.author_id,
            status: pr.status.into(),
            assigned_reviewers: pr.assigned_reviewers,
            created_at: pr.created_at,
            merged_at: pr.merged_at,
        }
    }
}

/// Pull request summary used in review listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PullRequestShort {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,
}

impl From<core::PullRequestShort> for PullRequestShort {
    fn from(pr: core::PullRequestShort) -> Self {
        Self {
            pull_request_id: pr.pull_request_id,
            pull_request_name: pr.pull_request_name,
            author_id: pr.author_id,
            status: pr.status.into(),
        }
    }
}

/// Response wrapping a created team
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TeamResponse {
    pub team: Team,
}

/// Query for a team lookup
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TeamQuery {
    /// Team name
    pub team_name: String,
}

/// Request to create or update a single user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpsertUserRequest {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Request to toggle reviewer eligibility
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SetIsActiveRequest {
    pub user_id: String,
    pub is_active: bool,
}

/// Response wrapping a user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub user: User,
}

/// Query for a user's review requests
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    /// User ID
    pub user_id: String,
}

/// Pull requests a user is currently reviewing, newest first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserReviewsResponse {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestShort>,
}

/// Request to open a pull request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatePullRequestRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

/// Request to merge a pull request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MergePullRequestRequest {
    pub pull_request_id: String,
}

/// Request to replace one reviewer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReassignRequest {
    pub pull_request_id: String,
    /// Reviewer being replaced
    pub old_user_id: String,
}

/// Query for a pull request lookup
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PullRequestQuery {
    /// Pull request ID
    pub pull_request_id: String,
}

/// Response wrapping a pull request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PullRequestResponse {
    pub pr: PullRequest,
}

/// Reassignment result
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReassignResponse {
    pub pr: PullRequest,
    /// ID of the reviewer that took over
    pub replaced_by: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Error details
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Stable error code, e.g. `PR_MERGED`
    pub code: String,
    /// Human-readable message
    pub message: String,
}

/// Error response envelope: `{"error": {"code", "message"}}`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}
