//! `POST /v1/events` wire types.

use serde::Serialize;
use uuid::Uuid;

/// Response body for every non-error outcome of the Ingest Transition.
/// `exception_id`/`reason_code` are always present, `null` on the
/// plain-accept and duplicate paths.
#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub tenant_id: String,
    pub idempotency_key: String,
    pub raw_id: i64,
    pub result: &'static str,
    pub exception_id: Option<Uuid>,
    pub reason_code: Option<&'static str>,
}
