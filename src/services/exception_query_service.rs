//! Read-only query surface over the exception registry.

use sqlx::PgPool;
use uuid::Uuid;

use crate::contracts::exceptions::{ExceptionDetailResponse, ListExceptionsResponse};
use crate::error::ApiError;
use crate::repos::{exception_repo, idempotency_repo, raw_event_repo};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

pub async fn list_exceptions(
    pool: &PgPool,
    status: &str,
    tenant_id: Option<&str>,
    limit: Option<i64>,
) -> Result<ListExceptionsResponse, ApiError> {
    if status != "open" && status != "resolved" {
        return Err(ApiError::InvalidStatus);
    }
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let items = exception_repo::list(pool, status, tenant_id, limit).await?;
    Ok(ListExceptionsResponse { items })
}

/// Returns the exception, the raw event that triggered it, the current
/// idempotency record for its key, and the first/last raw events referenced
/// by that record — enough for an operator to compare the original and
/// conflicting submissions side by side.
pub async fn get_exception(
    pool: &PgPool,
    exception_id: Uuid,
) -> Result<ExceptionDetailResponse, ApiError> {
    let exception = exception_repo::find_pool(pool, exception_id)
        .await?
        .ok_or(ApiError::NotFound("exception"))?;

    let raw_event = raw_event_repo::fetch(pool, exception.raw_id).await?;

    let events_processed =
        idempotency_repo::find_pool(pool, &exception.tenant_id, &exception.idempotency_key).await?;

    let (first_raw_event, last_raw_event) = match &events_processed {
        Some(record) => (
            raw_event_repo::fetch(pool, record.first_raw_id).await?,
            raw_event_repo::fetch(pool, record.last_raw_id).await?,
        ),
        None => (None, None),
    };

    Ok(ExceptionDetailResponse {
        exception,
        raw_event,
        events_processed,
        first_raw_event,
        last_raw_event,
    })
}
