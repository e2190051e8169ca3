//! Health Check API Tests

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::Value;

use crate::common::TestApp;

fn server() -> TestServer {
    TestServer::new(TestApp::new().router).unwrap()
}

#[tokio::test]
async fn test_health_check_returns_ok() {
    let response = server().get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_liveness_probe() {
    let response = server().get("/health/live").await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "alive");
}

#[tokio::test]
async fn test_readiness_with_in_memory_backends() {
    let response = server().get("/health/ready").await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["database"]["status"], "healthy");
    assert_eq!(body["checks"]["redis"]["status"], "healthy");
    assert!(body["checks"]["database"]["message"]
        .as_str()
        .unwrap()
        .contains("not configured"));
}

#[tokio::test]
async fn test_metrics_endpoint_is_prometheus_text() {
    let server = server();
    server.get("/health").await.assert_status_ok();

    let response = server.get("/metrics").await;
    response.assert_status_ok();
    let content_type = response.header("content-type");
    assert!(content_type.to_str().unwrap().starts_with("text/plain"));
}
