//! HTTP trigger over a real orchestrator and fake provider

use crate::test_utils::*;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use fleetwatch_dispatch::LoadStatus;
use fleetwatch_node::{app, AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

async fn trigger(deployment: &Deployment, method: Method, uri: &str) -> (StatusCode, Value) {
    let state = Arc::new(AppState::new(deployment.orchestrator.clone()));
    let response = app(state)
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_run_reports_counts() {
    init_tracing();
    let provider = FakeProvider::start().await;
    let deployment = Deployment::in_memory(&provider);
    deployment.seed_load("l-1", LoadStatus::Scheduled, Some("501"));

    provider.set_position(501, north_of(DEPOT, 600.0), base_time());
    let (status, body) = trigger(&deployment, Method::POST, "/monitor/run").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["loads_checked"], 1);
    assert_eq!(body["events_detected"], 0);

    provider.set_position(501, north_of(DEPOT, 200.0), base_time() + chrono::Duration::minutes(1));
    let (status, body) = trigger(&deployment, Method::GET, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events_detected"], 1);
    assert_eq!(deployment.status("l-1"), LoadStatus::Loading);
}

#[tokio::test]
async fn test_no_loads_message() {
    init_tracing();
    let provider = FakeProvider::start().await;
    let deployment = Deployment::in_memory(&provider);

    let (status, body) = trigger(&deployment, Method::POST, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "No trackable loads");
    assert_eq!(provider.token_calls(), 0);
}

#[tokio::test]
async fn test_token_failure_is_service_unavailable() {
    init_tracing();
    let provider = FakeProvider::start().await;
    provider.fail_token(500);
    let deployment = Deployment::in_memory(&provider);
    deployment.seed_load("l-1", LoadStatus::Scheduled, Some("501"));

    let (status, body) = trigger(&deployment, Method::POST, "/monitor/run").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
    assert_eq!(deployment.ledger.events().count().unwrap(), 0);
}
