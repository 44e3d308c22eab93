//! `/v1/exceptions*` wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::repos::exception_repo::{Exception, ExceptionSummary};
use crate::repos::idempotency_repo::IdempotencyRecord;
use crate::repos::raw_event_repo::RawEvent;

pub const ALLOWED_RESOLUTION_ACTIONS: [&str; 2] = ["mark_resolved_no_replay", "override_and_replay"];

#[derive(Debug, Clone, Deserialize)]
pub struct ListExceptionsQuery {
    pub status: Option<String>,
    pub tenant_id: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListExceptionsResponse {
    pub items: Vec<ExceptionSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExceptionDetailResponse {
    pub exception: Exception,
    pub raw_event: Option<RawEvent>,
    pub events_processed: Option<IdempotencyRecord>,
    pub first_raw_event: Option<RawEvent>,
    pub last_raw_event: Option<RawEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveRequest {
    pub action: String,
    pub actor: String,
    #[serde(default)]
    pub resolution_notes: String,
    #[serde(default = "default_override_patch")]
    pub override_patch: Value,
    pub canonical_raw_id: Option<i64>,
}

fn default_override_patch() -> Value {
    Value::Object(serde_json::Map::new())
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolveResponse {
    pub exception_id: Uuid,
    pub status: &'static str,
    pub replay: ReplayInfo,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayInfo {
    pub attempted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_raw_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_payload_hash: Option<String>,
}
