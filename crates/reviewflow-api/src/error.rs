//! Translation of service errors into HTTP responses

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    Json,
};
use tracing::{error, warn};

use reviewflow_core::{ErrorCode, ServiceError};

use crate::models::{ErrorDetail, ErrorResponse};

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<T, ApiError>;

pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidInput | ErrorCode::TeamExists => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::PrExists
        | ErrorCode::PrMerged
        | ErrorCode::NotAssigned
        | ErrorCode::NoCandidate => StatusCode::CONFLICT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond(code: ErrorCode, message: String) -> ApiError {
    (
        status_for(code),
        Json(ErrorResponse {
            error: ErrorDetail {
                code: code.as_str().to_string(),
                message,
            },
        }),
    )
}

pub fn service_error(err: ServiceError) -> ApiError {
    let code = err.code();
    match &err {
        ServiceError::Internal(source) => error!("Internal error: {}", source),
        other => warn!("Request failed ({}): {}", code, other),
    }
    respond(code, err.public_message())
}

pub fn invalid_body(rejection: JsonRejection) -> ApiError {
    warn!("Rejected request body: {}", rejection.body_text());
    respond(ErrorCode::InvalidInput, rejection.body_text())
}

pub fn invalid_query(rejection: QueryRejection) -> ApiError {
    warn!("Rejected query string: {}", rejection.body_text());
    respond(ErrorCode::InvalidInput, rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reviewflow_core::StoreError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorCode::InvalidInput), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorCode::TeamExists), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorCode::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorCode::PrExists), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorCode::PrMerged), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorCode::NotAssigned), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorCode::NoCandidate), StatusCode::CONFLICT);
        assert_eq!(
            status_for(ErrorCode::Internal),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_error_hides_details() {
        let err = ServiceError::Internal(StoreError::Backend(
            "connection refused at 10.0.0.5".to_string(),
        ));
        let (status, Json(body)) = service_error(err);

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert!(!body.error.message.contains("10.0.0.5"));
    }
}
