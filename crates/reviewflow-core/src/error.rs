//! Error taxonomy surfaced to callers of the review service
//!
//! Every failure is terminal for the current request; nothing here retries.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::assignment::AssignmentError;
use crate::store::StoreError;

/// Stable, machine-readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidInput,
    TeamExists,
    NotFound,
    PrExists,
    PrMerged,
    NotAssigned,
    NoCandidate,
    #[serde(rename = "INTERNAL_ERROR")]
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::TeamExists => "TEAM_EXISTS",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::PrExists => "PR_EXISTS",
            ErrorCode::PrMerged => "PR_MERGED",
            ErrorCode::NotAssigned => "NOT_ASSIGNED",
            ErrorCode::NoCandidate => "NO_CANDIDATE",
            ErrorCode::Internal => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by [`crate::ReviewService`] operations
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A required field was missing or empty
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("team '{0}' already exists")]
    TeamExists(String),

    /// Team, user or pull request absent for the requested key
    #[error("{0}")]
    NotFound(String),

    #[error("pull request '{0}' already exists")]
    PrExists(String),

    #[error("cannot reassign on merged pull request '{0}'")]
    PrMerged(String),

    #[error("reviewer '{reviewer_id}' is not assigned to pull request '{pr_id}'")]
    NotAssigned { pr_id: String, reviewer_id: String },

    #[error("no active replacement candidate in team")]
    NoCandidate,

    /// Unclassified storage failure
    #[error("internal error: {0}")]
    Internal(#[source] StoreError),
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::InvalidInput(_) => ErrorCode::InvalidInput,
            ServiceError::TeamExists(_) => ErrorCode::TeamExists,
            ServiceError::NotFound(_) => ErrorCode::NotFound,
            ServiceError::PrExists(_) => ErrorCode::PrExists,
            ServiceError::PrMerged(_) => ErrorCode::PrMerged,
            ServiceError::NotAssigned { .. } => ErrorCode::NotAssigned,
            ServiceError::NoCandidate => ErrorCode::NoCandidate,
            ServiceError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Message safe to hand to a client. Storage details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub(crate) fn invalid(what: &str) -> Self {
        ServiceError::InvalidInput(format!("{} is required", what))
    }

    pub(crate) fn not_found(kind: &str, key: &str) -> Self {
        ServiceError::NotFound(format!("{} '{}' not found", kind, key))
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::Internal(err)
    }
}

impl From<AssignmentError> for ServiceError {
    fn from(err: AssignmentError) -> Self {
        match err {
            AssignmentError::NoCandidate => ServiceError::NoCandidate,
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
