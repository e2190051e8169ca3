//! Authentication Tests
//!
//! Every `/api/v1` route requires a valid identity token.

use axum::http::{Method, StatusCode};
use chrono::Duration;

use crate::common::{sign, TestApp, SECRET};

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new();

    let (status, body) = app
        .request(Method::GET, "/api/v1/users/@me", None, None)
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Missing authorization header");
    assert_eq!(body["code"], 10003);
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let app = TestApp::new();
    let token = sign("vol-1", Duration::hours(-2), SECRET);

    let (status, body) = app.get("/api/v1/users/@me", &token).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token expired");
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let app = TestApp::new();
    let token = sign("vol-1", Duration::hours(1), "some-other-secret-0123456789abcdef");

    let (status, body) = app.get("/api/v1/opportunities", &token).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[tokio::test]
async fn test_non_bearer_scheme_is_rejected() {
    let app = TestApp::new();

    let response = {
        use axum::body::Body;
        use axum::http::Request;
        use tower::ServiceExt;

        app.router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/users/@me")
                    .header("Authorization", "Basic dXNlcjpwYXNz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    };

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
