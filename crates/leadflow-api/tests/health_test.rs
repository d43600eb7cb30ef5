//! Health, liveness and service info endpoints.

#![allow(clippy::unwrap_used)]

mod common;

use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
async fn health_check_reports_healthy_storage() {
    let app = TestApp::new();

    let (response, body) = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"]["status"], "up");
    assert!(body["checks"]["database"].get("message").is_none());
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn health_check_reports_unavailable_storage() {
    let app = TestApp::new();
    app.storage.fail_begin("connection refused");

    let (response, body) = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["checks"]["database"]["status"], "down");

    let (ready, _) = app.get("/ready").await;
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn liveness_ignores_storage() {
    let app = TestApp::new();
    app.storage.fail_begin("connection refused");

    let (response, body) = app.get("/live").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body["status"], "alive");
    assert_eq!(body["service"], "leadflow-api");
}

#[tokio::test]
async fn api_root_describes_service_without_auth() {
    let app = TestApp::new();

    let (response, body) = app.get("/api").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body["name"], "Leadflow API");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = TestApp::new();

    let (response, _) = app.get("/api/unknown").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
