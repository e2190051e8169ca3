//! Login, profile and onboarding tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{email_for, token_for, TestApp};

#[tokio::test]
async fn test_first_login_creates_profile_and_sends_welcome_once() {
    let app = TestApp::new();
    let token = token_for("newcomer");

    let (status, body) = app.post("/api/v1/users/@me/login", &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], true);
    assert_eq!(body["welcome_email_sent"], true);
    assert_eq!(body["profile"]["email"], "newcomer@example.com");
    assert_eq!(body["profile"]["display_name"], "User newcomer");
    assert_eq!(body["onboarding"]["redirect"], "/onboarding/role");

    let (status, body) = app.post("/api/v1/users/@me/login", &token, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], false);
    assert_eq!(body["welcome_email_sent"], false);

    let welcome: Vec<_> = app
        .outbox
        .messages_to(&email_for("newcomer"))
        .into_iter()
        .filter(|m| m.subject == "Welcome to Volunteer Match")
        .collect();
    assert_eq!(welcome.len(), 1);
}

#[tokio::test]
async fn test_profile_requires_login_first() {
    let app = TestApp::new();

    let (status, _) = app.get("/api/v1/users/@me", &token_for("ghost")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_onboarding_moves_from_role_to_profile_to_dashboard() {
    let app = TestApp::new();
    let token = token_for("vol-a");
    app.post("/api/v1/users/@me/login", &token, json!({})).await;

    let (_, body) = app.get("/api/v1/users/@me/onboarding", &token).await;
    assert_eq!(body["redirect"], "/onboarding/role");

    let (status, body) = app
        .patch("/api/v1/users/@me", &token, json!({ "role": "volunteer" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile_complete"], false);

    let (_, body) = app.get("/api/v1/users/@me/onboarding", &token).await;
    assert_eq!(body["redirect"], "/onboarding/profile");
    assert_eq!(body["missing_fields"], json!(["phone", "location"]));

    app.patch(
        "/api/v1/users/@me",
        &token,
        json!({ "phone": "+1 555 0100", "location": "Springfield" }),
    )
    .await;

    let (_, body) = app.get("/api/v1/users/@me/onboarding", &token).await;
    assert_eq!(body["redirect"], "/dashboard/volunteer");
    assert_eq!(body["profile_complete"], true);
}

#[tokio::test]
async fn test_role_cannot_be_changed_once_set() {
    let app = TestApp::new();
    let token = app.volunteer("vol-b").await;

    let (status, _) = app
        .patch("/api/v1/users/@me", &token, json!({ "role": "volunteer" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .patch("/api/v1/users/@me", &token, json!({ "role": "organization" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_overlong_field_fails_validation() {
    let app = TestApp::new();
    let token = app.volunteer("vol-c").await;

    let (status, body) = app
        .patch("/api/v1/users/@me", &token, json!({ "phone": "9".repeat(40) }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 10007);
}

#[tokio::test]
async fn test_public_profile_hides_contact_details() {
    let app = TestApp::new();
    let token = app.volunteer("vol-d").await;
    let other = app.volunteer("vol-e").await;

    let (status, body) = app.get("/api/v1/users/vol-d", &other).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "vol-d");
    assert!(body.get("email").is_none());
    assert!(body.get("phone").is_none());

    let (status, _) = app.get("/api/v1/users/nobody", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
