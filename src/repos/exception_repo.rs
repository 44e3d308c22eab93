//! The exception registry: operator-visible quarantine records.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct Exception {
    pub exception_id: Uuid,
    pub tenant_id: String,
    pub raw_id: i64,
    pub idempotency_key: String,
    pub reason_code: String,
    pub details_json: Value,
    pub status: String,
    pub assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_action: Option<String>,
    pub resolution_notes: Option<String>,
    pub resolution_actor: Option<String>,
    pub override_patch: Option<Value>,
    pub replay_attempts: i32,
    pub last_replay_at: Option<DateTime<Utc>>,
    pub last_replay_status: Option<String>,
}

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct ExceptionSummary {
    pub exception_id: Uuid,
    pub tenant_id: String,
    pub raw_id: i64,
    pub idempotency_key: String,
    pub reason_code: String,
    pub status: String,
    pub assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub replay_attempts: i32,
    pub last_replay_status: Option<String>,
}

/// Opens a new exception row. The partial unique index on
/// `(tenant_id, idempotency_key) WHERE status = 'open'` is what actually
/// enforces "at most one open exception per key" — this insert relies on
/// callers only reaching it when that invariant is about to hold (see
/// `services::ingest_service`).
pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    raw_id: i64,
    idempotency_key: &str,
    reason_code: &str,
    details_json: &Value,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO exceptions (tenant_id, raw_id, idempotency_key, reason_code, details_json, status)
         VALUES ($1, $2, $3, $4, $5, 'open')
         RETURNING exception_id",
    )
    .bind(tenant_id)
    .bind(raw_id)
    .bind(idempotency_key)
    .bind(reason_code)
    .bind(details_json)
    .fetch_one(&mut **tx)
    .await
}

pub async fn find_pool(
    pool: &PgPool,
    exception_id: Uuid,
) -> Result<Option<Exception>, sqlx::Error> {
    sqlx::query_as::<_, Exception>("SELECT * FROM exceptions WHERE exception_id = $1")
        .bind(exception_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_tx(
    tx: &mut Transaction<'_, Postgres>,
    exception_id: Uuid,
) -> Result<Option<Exception>, sqlx::Error> {
    sqlx::query_as::<_, Exception>("SELECT * FROM exceptions WHERE exception_id = $1")
        .bind(exception_id)
        .fetch_optional(&mut **tx)
        .await
}

pub async fn list(
    pool: &PgPool,
    status: &str,
    tenant_id: Option<&str>,
    limit: i64,
) -> Result<Vec<ExceptionSummary>, sqlx::Error> {
    sqlx::query_as::<_, ExceptionSummary>(
        "SELECT exception_id, tenant_id, raw_id, idempotency_key, reason_code, status,
                assigned_to, created_at, resolved_at, replay_attempts, last_replay_status
           FROM exceptions
          WHERE status = $1 AND ($2::text IS NULL OR tenant_id = $2)
          ORDER BY created_at DESC
          LIMIT $3",
    )
    .bind(status)
    .bind(tenant_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn resolve_no_replay(
    tx: &mut Transaction<'_, Postgres>,
    exception_id: Uuid,
    actor: &str,
    notes: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exceptions
            SET status = 'resolved',
                resolved_at = now(),
                resolution_action = 'mark_resolved_no_replay',
                resolution_notes = $1,
                resolution_actor = $2,
                last_replay_status = 'not_replayed'
          WHERE exception_id = $3",
    )
    .bind(notes)
    .bind(actor)
    .bind(exception_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn resolve_and_replay(
    tx: &mut Transaction<'_, Postgres>,
    exception_id: Uuid,
    actor: &str,
    notes: &str,
    override_patch: &Value,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exceptions
            SET status = 'resolved',
                resolved_at = now(),
                resolution_action = 'override_and_replay',
                resolution_notes = $1,
                resolution_actor = $2,
                override_patch = $3,
                replay_attempts = replay_attempts + 1,
                last_replay_at = now(),
                last_replay_status = 'processed'
          WHERE exception_id = $4",
    )
    .bind(notes)
    .bind(actor)
    .bind(override_patch)
    .bind(exception_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
