//! Envelope validation for inbound events.

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// Event types accepted by the ingestion core; anything else is quarantined
/// rather than rejected outright.
pub const ALLOWED_EVENT_TYPES: [&str; 5] = ["SALE", "RETURN", "CORRECTION", "CANCEL", "VOID"];

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("missing or empty required field: {0}")]
    MissingField(&'static str),
    #[error("occurred_at is not a valid timestamp")]
    InvalidOccurredAt,
}

/// The fields the Ingest Transition needs out of an otherwise-opaque
/// submitted payload. Unknown fields stay in the original `Value` and are
/// preserved verbatim when the payload is written to Bronze.
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub tenant_id: String,
    pub store_id: String,
    pub source_system: String,
    pub schema_version: String,
    pub event_id: String,
    pub source_event_id: Option<String>,
    pub event_type: String,
    pub txn_id: String,
    pub occurred_at: DateTime<Utc>,
}

fn required_str(payload: &Value, field: &'static str) -> Result<String, ValidationError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(ValidationError::MissingField(field))
}

/// Extracts and validates the envelope fields spec'd for an inbound event.
/// `event_type` is normalized by trim+uppercase; everything else is stored
/// as submitted (trimmed of surrounding whitespace).
pub fn validate_envelope(payload: &Value) -> Result<EventEnvelope, ValidationError> {
    let tenant_id = required_str(payload, "tenant_id")?;
    let store_id = required_str(payload, "store_id")?;
    let source_system = required_str(payload, "source_system")?;
    let schema_version = required_str(payload, "schema_version")?;
    let event_id = required_str(payload, "event_id")?;
    let txn_id = required_str(payload, "txn_id")?;
    let event_type = required_str(payload, "event_type")?.to_uppercase();

    let source_event_id = payload
        .get("source_event_id")
        .and_then(Value::as_str)
        .map(str::to_string);

    let occurred_at_raw = payload
        .get("occurred_at")
        .and_then(Value::as_str)
        .ok_or(ValidationError::InvalidOccurredAt)?;
    let occurred_at = DateTime::parse_from_rfc3339(occurred_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ValidationError::InvalidOccurredAt)?;

    Ok(EventEnvelope {
        tenant_id,
        store_id,
        source_system,
        schema_version,
        event_id,
        source_event_id,
        event_type,
        txn_id,
        occurred_at,
    })
}

pub fn is_allowed_event_type(event_type: &str) -> bool {
    ALLOWED_EVENT_TYPES.contains(&event_type)
}

/// Normalizes a replayed payload's `event_type` the same way
/// [`validate_envelope`] does, for the Resolve Transition's re-validation
/// step. Returns an empty string if the field is absent or not a string.
pub fn normalize_event_type(payload: &Value) -> String {
    payload
        .get("event_type")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_uppercase()
}
