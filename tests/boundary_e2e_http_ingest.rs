mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use ingest_rs::app;
use serde_json::{json, Value};
use serial_test::serial;
use std::sync::Arc;
use tower::ServiceExt;

async fn post_json(router: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(router: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
#[serial]
async fn health_endpoint_reports_ok() {
    let pool = common::get_test_pool().await;
    let router = app::router(Arc::new(pool.clone()));

    let (status, body) = get(&router, "/v1/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["counts"]["events_raw"].is_i64());
}

#[tokio::test]
#[serial]
async fn post_events_end_to_end_accept_then_duplicate() {
    let pool = common::get_test_pool().await;
    let router = app::router(Arc::new(pool.clone()));
    let tenant_id = common::unique_tenant("http1");

    let payload = json!({
        "tenant_id": tenant_id,
        "store_id": "S1",
        "source_system": "pos",
        "schema_version": "1",
        "event_id": "e1",
        "event_type": "SALE",
        "txn_id": "x",
        "occurred_at": Utc::now().to_rfc3339(),
    });

    let (status, body) = post_json(&router, "/v1/events", payload.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["result"], "processed");

    let (status, body) = post_json(&router, "/v1/events", payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "duplicate");

    common::cleanup_test_tenant(pool, &tenant_id).await;
}

#[tokio::test]
#[serial]
async fn post_events_rejects_invalid_json() {
    let pool = common::get_test_pool().await;
    let router = app::router(Arc::new(pool.clone()));

    let request = Request::builder()
        .method("POST")
        .uri("/v1/events")
        .header("content-type", "application/json")
        .body(Body::from("not json"))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[serial]
async fn resolve_unknown_exception_returns_not_found() {
    let pool = common::get_test_pool().await;
    let router = app::router(Arc::new(pool.clone()));

    let (status, body) = post_json(
        &router,
        &format!("/v1/exceptions/{}/resolve", uuid::Uuid::new_v4()),
        json!({
            "action": "mark_resolved_no_replay",
            "actor": "operator:dana",
            "resolution_notes": "",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}
