//! Feedback API tests

use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;

use crate::common::TestApp;

#[tokio::test]
async fn test_feedback_before_the_event_ends() {
    let app = TestApp::new();
    let org = app.organization("org-1").await;
    let accepted = app.volunteer("vol-1").await;
    let bystander = app.volunteer("vol-2").await;
    let id = app.opportunity(&org, Duration::days(3), 2).await;

    app.post(
        &format!("/api/v1/opportunities/{}/applications", id),
        &accepted,
        json!({}),
    )
    .await;
    app.post(
        &format!("/api/v1/applications/{}_vol-1/accept", id),
        &org,
        json!({}),
    )
    .await;

    let uri = format!("/api/v1/opportunities/{}/feedback", id);

    let (status, _) = app.post(&uri, &bystander, json!({ "rating": 5 })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.post(&uri, &accepted, json!({ "rating": 5 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.post(&uri, &accepted, json!({ "rating": 9 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 10007);
}

#[tokio::test]
async fn test_feedback_list_for_opportunity() {
    let app = TestApp::new();
    let org = app.organization("org-3").await;
    let id = app.opportunity(&org, Duration::days(3), 2).await;

    let (status, body) = app
        .get(&format!("/api/v1/opportunities/{}/feedback", id), &org)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert!(body["average_rating"].is_null());

    let (status, _) = app.get("/api/v1/opportunities/999/feedback", &org).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
