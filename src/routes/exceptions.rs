use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::contracts::exceptions::{ListExceptionsQuery, ResolveRequest};
use crate::services::{exception_query_service, resolve_service};

pub async fn list_exceptions(
    State(pool): State<Arc<PgPool>>,
    Query(params): Query<ListExceptionsQuery>,
) -> Response {
    let status = params.status.as_deref().unwrap_or("open");
    match exception_query_service::list_exceptions(
        &pool,
        status,
        params.tenant_id.as_deref(),
        params.limit,
    )
    .await
    {
        Ok(response) => Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_exception(
    State(pool): State<Arc<PgPool>>,
    Path(exception_id): Path<Uuid>,
) -> Response {
    match exception_query_service::get_exception(&pool, exception_id).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn resolve_exception(
    State(pool): State<Arc<PgPool>>,
    Path(exception_id): Path<Uuid>,
    Json(body): Json<ResolveRequest>,
) -> Response {
    match resolve_service::resolve_exception(&pool, exception_id, body).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}
