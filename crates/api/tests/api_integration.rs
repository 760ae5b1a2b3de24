//! Integration tests for the observability server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use futures_util::FutureExt;
use messaging::{DeadLetterEntry, DeadLetterQueue, InMemoryDeadLetterQueue, IntegrationEvent};
use metrics_exporter_prometheus::PrometheusHandle;
use monitor::{ConsistencyMonitor, FnCheck};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup(monitor: ConsistencyMonitor, dead_letters: InMemoryDeadLetterQueue) -> axum::Router {
    let state = Arc::new(api::AppState {
        monitor: Arc::new(monitor),
        dead_letters: Arc::new(dead_letters),
    });
    api::create_app(state, get_metrics_handle())
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn health_reports_ok() {
    let app = setup(ConsistencyMonitor::new(), InMemoryDeadLetterQueue::new());

    let (status, json) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn checks_expose_latest_run() {
    let monitor = ConsistencyMonitor::new()
        .register_check(Arc::new(FnCheck::new("always-passes", || {
            async { Ok(true) }.boxed()
        })))
        .register_check(Arc::new(FnCheck::new("always-fails", || {
            async { Ok(false) }.boxed()
        })));
    monitor.run_checks().await;

    let app = setup(monitor, InMemoryDeadLetterQueue::new());
    let (status, json) = get_json(app, "/checks").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["checks"]["always-passes"], true);
    assert_eq!(json["checks"]["always-fails"], false);
    assert_eq!(json["all_passed"], false);
}

#[tokio::test]
async fn checks_are_empty_before_first_run() {
    let monitor = ConsistencyMonitor::new().register_check(Arc::new(FnCheck::new(
        "never-ran",
        || async { Ok(true) }.boxed(),
    )));

    let app = setup(monitor, InMemoryDeadLetterQueue::new());
    let (status, json) = get_json(app, "/checks").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["checks"].as_object().unwrap().is_empty());
    assert_eq!(json["all_passed"], true);
}

#[tokio::test]
async fn dead_letters_list_parked_events() {
    let dead_letters = InMemoryDeadLetterQueue::new();
    let event = IntegrationEvent::builder()
        .event_type("OrderPaid")
        .source("Order")
        .payload_raw(serde_json::json!({"order_id": "o-1"}))
        .build();
    let event_id = event.id;
    dead_letters
        .push(DeadLetterEntry {
            event,
            error: "schema version 3 is newer than any registered handler".to_string(),
            attempt_count: 1,
            failed_at: Utc::now(),
        })
        .await
        .unwrap();

    let app = setup(ConsistencyMonitor::new(), dead_letters);
    let (status, json) = get_json(app, "/dead-letters").await;

    assert_eq!(status, StatusCode::OK);
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["event_id"], event_id.to_string());
    assert_eq!(entries[0]["event_type"], "OrderPaid");
    assert_eq!(entries[0]["attempt_count"], 1);
}

#[tokio::test]
async fn metrics_endpoint_renders_prometheus_text() {
    let app = setup(ConsistencyMonitor::new(), InMemoryDeadLetterQueue::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/plain"));
}
