//! Opportunity API tests

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use crate::common::TestApp;

#[tokio::test]
async fn test_organization_posts_and_reads_opportunity() {
    let app = TestApp::new();
    let org = app.organization("org-1").await;
    let id = app.opportunity(&org, Duration::days(3), 4).await;

    let (status, body) = app.get(&format!("/api/v1/opportunities/{}", id), &org).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["organization_id"], "org-1");
    assert_eq!(body["status"], "open");
    assert_eq!(body["remaining_seats"], 4);
    assert_eq!(body["accepting_applications"], true);
}

#[tokio::test]
async fn test_volunteer_cannot_post_opportunity() {
    let app = TestApp::new();
    let volunteer = app.volunteer("vol-1").await;
    let start = Utc::now() + Duration::days(2);

    let (status, _) = app
        .post(
            "/api/v1/opportunities",
            &volunteer,
            json!({
                "title": "Beach cleanup",
                "description": "Pick up litter",
                "location": "North beach",
                "start_time": start.to_rfc3339(),
                "end_time": (start + Duration::hours(2)).to_rfc3339(),
                "total_seats": 10
            }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_end_before_start_is_rejected() {
    let app = TestApp::new();
    let org = app.organization("org-2").await;
    let start = Utc::now() + Duration::days(2);

    let (status, _) = app
        .post(
            "/api/v1/opportunities",
            &org,
            json!({
                "title": "Beach cleanup",
                "description": "Pick up litter",
                "location": "North beach",
                "start_time": start.to_rfc3339(),
                "end_time": (start - Duration::hours(1)).to_rfc3339(),
                "total_seats": 10
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_invalid_id_in_path() {
    let app = TestApp::new();
    let org = app.organization("org-3").await;

    let (status, body) = app.get("/api/v1/opportunities/not-a-number", &org).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid opportunity ID");

    let (status, _) = app.get("/api/v1/opportunities/12345", &org).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_only_owner_can_edit() {
    let app = TestApp::new();
    let owner = app.organization("org-4").await;
    let other = app.organization("org-5").await;
    let id = app.opportunity(&owner, Duration::days(3), 4).await;
    let uri = format!("/api/v1/opportunities/{}", id);

    let (status, _) = app.patch(&uri, &other, json!({ "title": "Hijacked" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.patch(&uri, &owner, json!({ "title": "Pantry restock" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Pantry restock");
}

#[tokio::test]
async fn test_closed_opportunity_refuses_applications() {
    let app = TestApp::new();
    let org = app.organization("org-6").await;
    let volunteer = app.volunteer("vol-6").await;
    let id = app.opportunity(&org, Duration::days(3), 4).await;

    let (status, body) = app
        .post(
            &format!("/api/v1/opportunities/{}/status", id),
            &org,
            json!({ "status": "closed" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accepting_applications"], false);

    let (status, _) = app
        .post(
            &format!("/api/v1/opportunities/{}/applications", id),
            &volunteer,
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_list_filters_by_organization() {
    let app = TestApp::new();
    let first = app.organization("org-7").await;
    let second = app.organization("org-8").await;
    app.opportunity(&first, Duration::days(2), 2).await;
    app.opportunity(&first, Duration::days(4), 2).await;
    app.opportunity(&second, Duration::days(3), 2).await;

    let (status, body) = app
        .get("/api/v1/opportunities?organization_id=org-7", &second)
        .await;

    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|o| o["organization_id"] == "org-7"));

    let (_, body) = app.get("/api/v1/opportunities?limit=1", &second).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_refused_while_seats_are_held() {
    let app = TestApp::new();
    let org = app.organization("org-9").await;
    let volunteer = app.volunteer("vol-9").await;
    let id = app.opportunity(&org, Duration::days(3), 2).await;

    app.post(
        &format!("/api/v1/opportunities/{}/applications", id),
        &volunteer,
        json!({}),
    )
    .await;

    let uri = format!("/api/v1/opportunities/{}", id);
    let (status, _) = app.delete(&uri, &org).await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.delete(&format!("{}/applications/@me", uri), &volunteer).await;

    let (status, _) = app.delete(&uri, &org).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&uri, &org).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
