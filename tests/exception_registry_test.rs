mod common;

use chrono::Utc;
use ingest_rs::error::ApiError;
use ingest_rs::services::{exception_query_service, ingest_service};
use serde_json::json;
use serial_test::serial;

fn sale_event(tenant_id: &str, event_id: &str, txn_id: &str) -> serde_json::Value {
    json!({
        "tenant_id": tenant_id,
        "store_id": "S1",
        "source_system": "pos",
        "schema_version": "1",
        "event_id": event_id,
        "event_type": "SALE",
        "txn_id": txn_id,
        "occurred_at": Utc::now().to_rfc3339(),
    })
}

#[tokio::test]
#[serial]
async fn list_exceptions_rejects_invalid_status() {
    let pool = common::get_test_pool().await;
    let result = exception_query_service::list_exceptions(pool, "pending", None, None).await;
    assert!(matches!(result, Err(ApiError::InvalidStatus)));
}

#[tokio::test]
#[serial]
async fn list_and_get_exception_round_trip() {
    let pool = common::get_test_pool().await;
    let tenant_id = common::unique_tenant("q1");

    ingest_service::ingest_event(pool, &sale_event(&tenant_id, "e1", "x"))
        .await
        .unwrap();
    let (_, quarantined) = ingest_service::ingest_event(pool, &sale_event(&tenant_id, "e1", "y"))
        .await
        .unwrap();
    let exception_id = quarantined.exception_id.unwrap();

    let list = exception_query_service::list_exceptions(pool, "open", Some(&tenant_id), None)
        .await
        .unwrap();
    assert!(list.items.iter().any(|e| e.exception_id == exception_id));

    let detail = exception_query_service::get_exception(pool, exception_id)
        .await
        .unwrap();
    assert_eq!(detail.exception.exception_id, exception_id);
    assert_eq!(detail.exception.reason_code, "IDEMPOTENCY_CONFLICT");
    assert!(detail.raw_event.is_some());
    assert!(detail.first_raw_event.is_some());
    assert!(detail.last_raw_event.is_some());

    common::cleanup_test_tenant(pool, &tenant_id).await;
}

#[tokio::test]
#[serial]
async fn get_exception_not_found() {
    let pool = common::get_test_pool().await;
    let result = exception_query_service::get_exception(pool, uuid::Uuid::new_v4()).await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}
