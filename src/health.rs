use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;

/// `GET /v1/health`. Never fails the HTTP layer: any database error is
/// reported as `status: "degraded"` rather than surfaced as a 5xx, so
/// monitoring can distinguish "service up, database unhappy" from "service
/// down".
pub async fn health(State(pool): State<Arc<PgPool>>) -> Json<Value> {
    match fetch_counts(&pool).await {
        Ok(counts) => Json(json!({
            "status": "ok",
            "db": "ok",
            "db_time": counts.db_time,
            "counts": {
                "events_raw": counts.events_raw,
                "exceptions_open": counts.exceptions_open,
                "idempotency": {
                    "processed": counts.idempotency_processed,
                    "quarantined": counts.idempotency_quarantined,
                    "ignored": counts.idempotency_ignored,
                }
            }
        })),
        Err(e) => {
            tracing::error!(error = %e, "health check database query failed");
            Json(json!({
                "status": "degraded",
                "db": "error",
            }))
        }
    }
}

struct Counts {
    db_time: chrono::DateTime<chrono::Utc>,
    events_raw: i64,
    exceptions_open: i64,
    idempotency_processed: i64,
    idempotency_quarantined: i64,
    idempotency_ignored: i64,
}

async fn fetch_counts(pool: &PgPool) -> Result<Counts, sqlx::Error> {
    let db_time: chrono::DateTime<chrono::Utc> = sqlx::query_scalar("SELECT now()")
        .fetch_one(pool)
        .await?;

    let events_raw: i64 = sqlx::query_scalar("SELECT count(*) FROM events_raw")
        .fetch_one(pool)
        .await?;

    let exceptions_open: i64 =
        sqlx::query_scalar("SELECT count(*) FROM exceptions WHERE status = 'open'")
            .fetch_one(pool)
            .await?;

    let (idempotency_processed, idempotency_quarantined, idempotency_ignored): (i64, i64, i64) =
        sqlx::query_as(
            "SELECT \
                count(*) FILTER (WHERE status = 'processed'), \
                count(*) FILTER (WHERE status = 'quarantined'), \
                count(*) FILTER (WHERE status = 'ignored') \
             FROM events_processed",
        )
        .fetch_one(pool)
        .await?;

    Ok(Counts {
        db_time,
        events_raw,
        exceptions_open,
        idempotency_processed,
        idempotency_quarantined,
        idempotency_ignored,
    })
}
