use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;

use crate::error::ApiError;
use crate::services::ingest_service;

/// `POST /v1/events`. The status code varies with the classification
/// outcome (201/200/202), so the handler builds the response directly
/// rather than going through a uniform `Json<T>` return type.
pub async fn ingest_event(
    State(pool): State<Arc<PgPool>>,
    body: axum::body::Bytes,
) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(_) => return ApiError::InvalidJson.into_response(),
    };

    match ingest_service::ingest_event(&pool, &payload).await {
        Ok((status, response)) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);
            (status, Json(response)).into_response()
        }
        Err(e) => e.into_response(),
    }
}
