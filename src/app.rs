use axum::routing::{get, post};
use axum::Router;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::{health::health, routes};

/// Builds the HTTP surface described by the external interfaces: health,
/// event ingestion, and the exception registry's query + resolve
/// endpoints. Shared between `main` and HTTP-boundary tests so both wire
/// the routes identically.
pub fn router(pool: Arc<PgPool>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/events", post(routes::events::ingest_event))
        .route("/v1/exceptions", get(routes::exceptions::list_exceptions))
        .route("/v1/exceptions/{exception_id}", get(routes::exceptions::get_exception))
        .route(
            "/v1/exceptions/{exception_id}/resolve",
            post(routes::exceptions::resolve_exception),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(pool)
}
