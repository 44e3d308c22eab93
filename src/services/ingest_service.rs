//! The Ingest Transition: Bronze append + idempotency upsert + quarantine
//! classification, all inside one database transaction.

use serde_json::{json, Value};
use sqlx::PgPool;

use crate::error::ApiError;
use crate::repos::{audit_repo, exception_repo, idempotency_repo, raw_event_repo};
use crate::repos::raw_event_repo::NewRawEvent;
use crate::services::canonicalizer::content_hash;
use crate::validation::{is_allowed_event_type, validate_envelope, ALLOWED_EVENT_TYPES};
use crate::contracts::events::IngestResponse;

/// Runs the Ingest Transition for one submitted payload. `payload` is
/// stored verbatim in Bronze, including any fields not used for
/// classification.
pub async fn ingest_event(pool: &PgPool, payload: &Value) -> Result<(u16, IngestResponse), ApiError> {
    let envelope = validate_envelope(payload).map_err(|e| ApiError::Validation(e.to_string()))?;
    let payload_hash = content_hash(payload);
    let idempotency_key = envelope.event_id.clone();

    let mut tx = pool.begin().await?;

    let raw_id = raw_event_repo::append(
        &mut tx,
        NewRawEvent {
            tenant_id: &envelope.tenant_id,
            store_id: &envelope.store_id,
            source_system: &envelope.source_system,
            schema_version: &envelope.schema_version,
            occurred_at: envelope.occurred_at,
            event_id: &envelope.event_id,
            source_event_id: envelope.source_event_id.as_deref(),
            event_type: &envelope.event_type,
            txn_id: &envelope.txn_id,
            payload_hash: &payload_hash,
            payload_json: payload,
        },
    )
    .await?;

    let outcome = idempotency_repo::upsert(
        &mut tx,
        &envelope.tenant_id,
        &idempotency_key,
        raw_id,
        &payload_hash,
    )
    .await?;

    let response = if outcome.inserted {
        if is_allowed_event_type(&envelope.event_type) {
            // Case A
            tx.commit().await?;
            tracing::info!(tenant_id = %envelope.tenant_id, idempotency_key = %idempotency_key, raw_id, "event processed");
            (
                201,
                IngestResponse {
                    tenant_id: envelope.tenant_id,
                    idempotency_key,
                    raw_id,
                    result: "processed",
                    exception_id: None,
                    reason_code: None,
                },
            )
        } else {
            // Case B
            let details = json!({
                "event_type": envelope.event_type,
                "allowed_event_types": ALLOWED_EVENT_TYPES,
                "message": "Event type is not supported by the ingestion MVP.",
            });
            let exception_id = quarantine(
                &mut tx,
                &envelope.tenant_id,
                raw_id,
                &idempotency_key,
                "UNKNOWN_EVENT_TYPE",
                &details,
            )
            .await?;
            tx.commit().await?;
            tracing::warn!(tenant_id = %envelope.tenant_id, idempotency_key = %idempotency_key, raw_id, %exception_id, "event quarantined: unknown event type");
            (
                202,
                IngestResponse {
                    tenant_id: envelope.tenant_id,
                    idempotency_key,
                    raw_id,
                    result: "quarantined",
                    exception_id: Some(exception_id),
                    reason_code: Some("UNKNOWN_EVENT_TYPE"),
                },
            )
        }
    } else if outcome.payload_hash_first == payload_hash {
        if outcome.status == "quarantined" {
            // Case D
            tx.commit().await?;
            (
                202,
                IngestResponse {
                    tenant_id: envelope.tenant_id,
                    idempotency_key,
                    raw_id,
                    result: "quarantined",
                    exception_id: outcome.last_exception_id,
                    reason_code: Some("ALREADY_QUARANTINED"),
                },
            )
        } else {
            // Case C
            tx.commit().await?;
            (
                200,
                IngestResponse {
                    tenant_id: envelope.tenant_id,
                    idempotency_key,
                    raw_id,
                    result: "duplicate",
                    exception_id: None,
                    reason_code: None,
                },
            )
        }
    } else {
        // Case E
        let details = json!({
            "message": "Same idempotency_key seen with different payload hash.",
            "existing_payload_hash": outcome.payload_hash_first,
            "new_payload_hash": payload_hash,
            "first_raw_id": outcome.first_raw_id,
            "new_raw_id": raw_id,
        });
        let exception_id = quarantine(
            &mut tx,
            &envelope.tenant_id,
            raw_id,
            &idempotency_key,
            "IDEMPOTENCY_CONFLICT",
            &details,
        )
        .await?;
        tx.commit().await?;
        tracing::warn!(tenant_id = %envelope.tenant_id, idempotency_key = %idempotency_key, raw_id, %exception_id, "event quarantined: idempotency conflict");
        (
            202,
            IngestResponse {
                tenant_id: envelope.tenant_id,
                idempotency_key,
                raw_id,
                result: "quarantined",
                exception_id: Some(exception_id),
                reason_code: Some("IDEMPOTENCY_CONFLICT"),
            },
        )
    };

    Ok(response)
}

async fn quarantine(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    tenant_id: &str,
    raw_id: i64,
    idempotency_key: &str,
    reason_code: &str,
    details: &Value,
) -> Result<uuid::Uuid, sqlx::Error> {
    let exception_id = exception_repo::insert(
        tx,
        tenant_id,
        raw_id,
        idempotency_key,
        reason_code,
        details,
    )
    .await?;

    idempotency_repo::quarantine(tx, tenant_id, idempotency_key, reason_code, exception_id).await?;

    audit_repo::append(
        tx,
        "system",
        "quarantine",
        "exception",
        &exception_id.to_string(),
        Some(reason_code),
        &json!({"reason_code": reason_code, "raw_id": raw_id}),
    )
    .await?;

    Ok(exception_id)
}
