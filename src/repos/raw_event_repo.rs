//! Bronze: the append-only raw event log.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

#[derive(Debug, Clone, FromRow, serde::Serialize)]
pub struct RawEvent {
    pub raw_id: i64,
    pub tenant_id: String,
    pub store_id: String,
    pub source_system: String,
    pub schema_version: String,
    pub received_at: DateTime<Utc>,
    pub occurred_at: DateTime<Utc>,
    pub event_id: String,
    pub source_event_id: Option<String>,
    pub event_type: String,
    pub txn_id: String,
    pub payload_hash: String,
    pub payload_json: Value,
}

pub struct NewRawEvent<'a> {
    pub tenant_id: &'a str,
    pub store_id: &'a str,
    pub source_system: &'a str,
    pub schema_version: &'a str,
    pub occurred_at: DateTime<Utc>,
    pub event_id: &'a str,
    pub source_event_id: Option<&'a str>,
    pub event_type: &'a str,
    pub txn_id: &'a str,
    pub payload_hash: &'a str,
    pub payload_json: &'a Value,
}

/// Inserts one row and returns the assigned `raw_id`. No update/delete is
/// ever exposed on this table.
pub async fn append(
    tx: &mut Transaction<'_, Postgres>,
    event: NewRawEvent<'_>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO events_raw (
            tenant_id, store_id, source_system, schema_version, occurred_at,
            event_id, source_event_id, event_type, txn_id,
            payload_hash, payload_json
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         RETURNING raw_id",
    )
    .bind(event.tenant_id)
    .bind(event.store_id)
    .bind(event.source_system)
    .bind(event.schema_version)
    .bind(event.occurred_at)
    .bind(event.event_id)
    .bind(event.source_event_id)
    .bind(event.event_type)
    .bind(event.txn_id)
    .bind(event.payload_hash)
    .bind(event.payload_json)
    .fetch_one(&mut **tx)
    .await
}

pub async fn fetch(pool: &PgPool, raw_id: i64) -> Result<Option<RawEvent>, sqlx::Error> {
    sqlx::query_as::<_, RawEvent>("SELECT * FROM events_raw WHERE raw_id = $1")
        .bind(raw_id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_tx(
    tx: &mut Transaction<'_, Postgres>,
    raw_id: i64,
) -> Result<Option<RawEvent>, sqlx::Error> {
    sqlx::query_as::<_, RawEvent>("SELECT * FROM events_raw WHERE raw_id = $1")
        .bind(raw_id)
        .fetch_optional(&mut **tx)
        .await
}
