use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Shared error vocabulary for the HTTP surface. Domain outcomes that are
/// not errors (duplicate, quarantined, ...) are carried on 2xx response
/// bodies instead and never constructed as `ApiError`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request body is not valid JSON")]
    InvalidJson,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("status must be 'open' or 'resolved'")]
    InvalidStatus,
    #[error("action must be one of the supported resolution actions")]
    InvalidAction,
    #[error("canonical_raw_id does not reference an existing raw event")]
    InvalidCanonicalRawId,
    #[error("canonical raw event belongs to a different tenant")]
    CanonicalRawTenantMismatch,
    #[error("patched payload has no event_type")]
    MissingEventTypeInPayload,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("exception is already resolved")]
    AlreadyResolved,
    #[error("no idempotency record exists for this exception's key")]
    MissingIdempotencyRecord,
    #[error("replay validation failed: {0}")]
    ReplayValidationFailed(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidJson => "INVALID_JSON",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::InvalidStatus => "INVALID_STATUS",
            ApiError::InvalidAction => "INVALID_ACTION",
            ApiError::InvalidCanonicalRawId => "INVALID_CANONICAL_RAW_ID",
            ApiError::CanonicalRawTenantMismatch => "CANONICAL_RAW_TENANT_MISMATCH",
            ApiError::MissingEventTypeInPayload => "MISSING_EVENT_TYPE_IN_PAYLOAD",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::AlreadyResolved => "ALREADY_RESOLVED",
            ApiError::MissingIdempotencyRecord => "MISSING_IDEMPOTENCY_RECORD",
            ApiError::ReplayValidationFailed(_) => "REPLAY_VALIDATION_FAILED",
            ApiError::Database(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson
            | ApiError::Validation(_)
            | ApiError::InvalidStatus
            | ApiError::InvalidAction
            | ApiError::InvalidCanonicalRawId
            | ApiError::CanonicalRawTenantMismatch
            | ApiError::MissingEventTypeInPayload => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AlreadyResolved
            | ApiError::MissingIdempotencyRecord
            | ApiError::ReplayValidationFailed(_) => StatusCode::CONFLICT,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, ApiError::Database(_)) {
            tracing::error!(error = %self, "infrastructure error");
        }
        let status = self.status();
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
