//! The Resolve Transition: closes an exception and either ignores it or
//! replays it under an operator-supplied patch.

use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::contracts::exceptions::{ReplayInfo, ResolveRequest, ResolveResponse, ALLOWED_RESOLUTION_ACTIONS};
use crate::error::ApiError;
use crate::repos::{audit_repo, exception_repo, idempotency_repo, raw_event_repo};
use crate::services::canonicalizer::content_hash;
use crate::services::patch_engine::merge_patch;
use crate::validation::{is_allowed_event_type, normalize_event_type};

pub async fn resolve_exception(
    pool: &PgPool,
    exception_id: Uuid,
    body: ResolveRequest,
) -> Result<ResolveResponse, ApiError> {
    if !ALLOWED_RESOLUTION_ACTIONS.contains(&body.action.as_str()) {
        return Err(ApiError::InvalidAction);
    }

    if body.actor.trim().is_empty() {
        return Err(ApiError::Validation("actor must not be empty".to_string()));
    }

    let mut tx = pool.begin().await?;

    let exception = exception_repo::find_tx(&mut tx, exception_id)
        .await?
        .ok_or(ApiError::NotFound("exception"))?;

    if exception.status != "open" {
        return Err(ApiError::AlreadyResolved);
    }

    idempotency_repo::find(&mut tx, &exception.tenant_id, &exception.idempotency_key)
        .await?
        .ok_or(ApiError::MissingIdempotencyRecord)?;

    let response = match body.action.as_str() {
        "mark_resolved_no_replay" => {
            exception_repo::resolve_no_replay(
                &mut tx,
                exception_id,
                &body.actor,
                &body.resolution_notes,
            )
            .await?;
            idempotency_repo::mark_ignored(
                &mut tx,
                &exception.tenant_id,
                &exception.idempotency_key,
                exception_id,
            )
            .await?;
            audit_repo::append(
                &mut tx,
                &body.actor,
                "resolve_no_replay",
                "exception",
                &exception_id.to_string(),
                Some(&body.resolution_notes),
                &json!({
                    "action": body.action,
                    "idempotency_key": exception.idempotency_key,
                }),
            )
            .await?;

            ResolveResponse {
                exception_id,
                status: "resolved",
                replay: ReplayInfo {
                    attempted: false,
                    ..Default::default()
                },
            }
        }
        "override_and_replay" => {
            let canonical_raw_id = body.canonical_raw_id.unwrap_or(exception.raw_id);

            let canonical_raw = raw_event_repo::fetch_tx(&mut tx, canonical_raw_id)
                .await?
                .ok_or(ApiError::InvalidCanonicalRawId)?;

            if canonical_raw.tenant_id != exception.tenant_id {
                return Err(ApiError::CanonicalRawTenantMismatch);
            }

            let final_payload = merge_patch(&canonical_raw.payload_json, &body.override_patch);
            let final_event_type = normalize_event_type(&final_payload);
            if final_event_type.is_empty() {
                return Err(ApiError::MissingEventTypeInPayload);
            }
            if !is_allowed_event_type(&final_event_type) {
                return Err(ApiError::ReplayValidationFailed(format!(
                    "UNKNOWN_EVENT_TYPE: {final_event_type}"
                )));
            }

            let final_hash = content_hash(&final_payload);

            idempotency_repo::mark_processed_with_hash(
                &mut tx,
                &exception.tenant_id,
                &exception.idempotency_key,
                &final_hash,
            )
            .await?;

            exception_repo::resolve_and_replay(
                &mut tx,
                exception_id,
                &body.actor,
                &body.resolution_notes,
                &body.override_patch,
            )
            .await?;

            audit_repo::append(
                &mut tx,
                &body.actor,
                "resolve_and_replay",
                "exception",
                &exception_id.to_string(),
                Some(&body.resolution_notes),
                &json!({
                    "action": body.action,
                    "idempotency_key": exception.idempotency_key,
                    "canonical_raw_id": canonical_raw_id,
                    "final_payload_hash": final_hash,
                }),
            )
            .await?;

            ResolveResponse {
                exception_id,
                status: "resolved",
                replay: ReplayInfo {
                    attempted: true,
                    result: Some("processed"),
                    canonical_raw_id: Some(canonical_raw_id),
                    final_payload_hash: Some(final_hash),
                },
            }
        }
        _ => unreachable!("action checked against ALLOWED_RESOLUTION_ACTIONS above"),
    };

    tx.commit().await?;
    tracing::info!(%exception_id, action = %body.action, "exception resolved");
    Ok(response)
}
