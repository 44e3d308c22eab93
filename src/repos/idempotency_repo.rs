//! The idempotency ledger: one mutable row per `(tenant_id, idempotency_key)`.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct IdempotencyRecord {
    pub tenant_id: String,
    pub idempotency_key: String,
    pub status: String,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub first_raw_id: i64,
    pub last_raw_id: i64,
    pub payload_hash_first: String,
    pub payload_hash_last: String,
    pub processed_at: Option<DateTime<Utc>>,
    pub last_error_code: Option<String>,
    pub last_exception_id: Option<Uuid>,
}

/// Result of the single-statement upsert that drives the Ingest Transition's
/// classification. `inserted = true` means this was the first sighting of
/// the key; the other fields reflect the row as it stood before the update
/// folded in (for an existing row) or the freshly-inserted values (for a
/// new one).
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub inserted: bool,
    pub status: String,
    pub first_raw_id: i64,
    pub payload_hash_first: String,
    pub last_exception_id: Option<Uuid>,
}

/// `INSERT ... ON CONFLICT (tenant_id, idempotency_key) DO UPDATE ...
/// RETURNING (xmax = 0) AS inserted, ...` in one round trip. The `xmax = 0`
/// trick distinguishes "this statement inserted the row" from "this
/// statement updated an existing row" without a prior SELECT, which is what
/// lets two concurrent ingests of the same key serialize correctly: exactly
/// one observes `inserted = true`.
pub async fn upsert(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    idempotency_key: &str,
    raw_id: i64,
    payload_hash: &str,
) -> Result<UpsertOutcome, sqlx::Error> {
    let row: (bool, String, i64, String, Option<Uuid>) = sqlx::query_as(
        "INSERT INTO events_processed (
            tenant_id, idempotency_key,
            first_seen_at, last_seen_at,
            status, first_raw_id, last_raw_id,
            payload_hash_first, payload_hash_last,
            processed_at, last_error_code, last_exception_id
         )
         VALUES ($1, $2, now(), now(), 'processed', $3, $3, $4, $4, now(), NULL, NULL)
         ON CONFLICT (tenant_id, idempotency_key)
         DO UPDATE SET
             last_seen_at = now(),
             last_raw_id = EXCLUDED.last_raw_id,
             payload_hash_last = EXCLUDED.payload_hash_last
         RETURNING
             (xmax = 0) AS inserted,
             status,
             first_raw_id,
             payload_hash_first,
             last_exception_id",
    )
    .bind(tenant_id)
    .bind(idempotency_key)
    .bind(raw_id)
    .bind(payload_hash)
    .fetch_one(&mut **tx)
    .await?;

    Ok(UpsertOutcome {
        inserted: row.0,
        status: row.1,
        first_raw_id: row.2,
        payload_hash_first: row.3,
        last_exception_id: row.4,
    })
}

/// Opens a quarantine on the ledger row: flips `status`, records the reason
/// and the new exception pointer, and clears `processed_at`.
pub async fn quarantine(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    idempotency_key: &str,
    reason_code: &str,
    exception_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE events_processed
            SET status = 'quarantined',
                last_error_code = $1,
                last_exception_id = $2,
                processed_at = NULL
          WHERE tenant_id = $3 AND idempotency_key = $4",
    )
    .bind(reason_code)
    .bind(exception_id)
    .bind(tenant_id)
    .bind(idempotency_key)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn find(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    idempotency_key: &str,
) -> Result<Option<IdempotencyRecord>, sqlx::Error> {
    sqlx::query_as::<_, IdempotencyRecord>(
        "SELECT * FROM events_processed WHERE tenant_id = $1 AND idempotency_key = $2",
    )
    .bind(tenant_id)
    .bind(idempotency_key)
    .fetch_optional(&mut **tx)
    .await
}

pub async fn find_pool(
    pool: &PgPool,
    tenant_id: &str,
    idempotency_key: &str,
) -> Result<Option<IdempotencyRecord>, sqlx::Error> {
    sqlx::query_as::<_, IdempotencyRecord>(
        "SELECT * FROM events_processed WHERE tenant_id = $1 AND idempotency_key = $2",
    )
    .bind(tenant_id)
    .bind(idempotency_key)
    .fetch_optional(pool)
    .await
}

/// `mark_resolved_no_replay`: the key is retired as operator-ignored.
pub async fn mark_ignored(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    idempotency_key: &str,
    exception_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE events_processed
            SET status = 'ignored',
                processed_at = now(),
                last_error_code = 'IGNORED_BY_OPERATOR',
                last_exception_id = $1
          WHERE tenant_id = $2 AND idempotency_key = $3",
    )
    .bind(exception_id)
    .bind(tenant_id)
    .bind(idempotency_key)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// `override_and_replay`: rewrites `payload_hash_first` to the patched
/// payload's hash, the deliberate asymmetry that makes the replayed payload
/// the new de-duplication anchor for this key.
pub async fn mark_processed_with_hash(
    tx: &mut Transaction<'_, Postgres>,
    tenant_id: &str,
    idempotency_key: &str,
    final_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE events_processed
            SET status = 'processed',
                processed_at = now(),
                payload_hash_first = $1,
                payload_hash_last = $1,
                last_error_code = NULL,
                last_exception_id = NULL
          WHERE tenant_id = $2 AND idempotency_key = $3",
    )
    .bind(final_hash)
    .bind(tenant_id)
    .bind(idempotency_key)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
