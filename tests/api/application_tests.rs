//! Application lifecycle tests

use axum::http::StatusCode;
use chrono::Duration;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{email_for, TestApp};

#[tokio::test]
async fn test_apply_reserves_seat_and_notifies_both_sides() {
    let app = TestApp::new();
    let org = app.organization("org-1").await;
    let volunteer = app.volunteer("vol-1").await;
    let id = app.opportunity(&org, Duration::days(3), 2).await;

    let (status, body) = app
        .post(
            &format!("/api/v1/opportunities/{}/applications", id),
            &volunteer,
            json!({ "message": "  Happy to help  " }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], format!("{}_vol-1", id));
    assert_eq!(body["status"], "pending");
    assert_eq!(body["message"], "Happy to help");

    let (_, opportunity) = app.get(&format!("/api/v1/opportunities/{}", id), &org).await;
    assert_eq!(opportunity["filled_seats"], 1);

    assert!(app
        .outbox
        .messages_to(&email_for("vol-1"))
        .iter()
        .any(|m| m.subject == "Application received: Pantry sorting"));
    assert!(app
        .outbox
        .messages_to(&email_for("org-1"))
        .iter()
        .any(|m| m.subject == "New application for Pantry sorting"));
}

#[tokio::test]
async fn test_apply_without_body() {
    let app = TestApp::new();
    let org = app.organization("org-2").await;
    let volunteer = app.volunteer("vol-2").await;
    let id = app.opportunity(&org, Duration::days(3), 2).await;

    let (status, body) = app
        .request(
            axum::http::Method::POST,
            &format!("/api/v1/opportunities/{}/applications", id),
            Some(&volunteer),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body["message"].is_null());
}

#[tokio::test]
async fn test_duplicate_application_conflicts() {
    let app = TestApp::new();
    let org = app.organization("org-3").await;
    let volunteer = app.volunteer("vol-3").await;
    let id = app.opportunity(&org, Duration::days(3), 5).await;
    let uri = format!("/api/v1/opportunities/{}/applications", id);

    let (status, _) = app.post(&uri, &volunteer, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.post(&uri, &volunteer, json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, opportunity) = app.get(&format!("/api/v1/opportunities/{}", id), &org).await;
    assert_eq!(opportunity["filled_seats"], 1);
}

#[tokio::test]
async fn test_full_opportunity_rejects_next_volunteer() {
    let app = TestApp::new();
    let org = app.organization("org-4").await;
    let first = app.volunteer("vol-4a").await;
    let second = app.volunteer("vol-4b").await;
    let id = app.opportunity(&org, Duration::days(3), 1).await;
    let uri = format!("/api/v1/opportunities/{}/applications", id);

    let (status, _) = app.post(&uri, &first, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.post(&uri, &second, json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);

    let (_, opportunity) = app.get(&format!("/api/v1/opportunities/{}", id), &org).await;
    assert_eq!(opportunity["remaining_seats"], 0);
}

#[tokio::test]
async fn test_organization_cannot_apply() {
    let app = TestApp::new();
    let org = app.organization("org-5").await;
    let id = app.opportunity(&org, Duration::days(3), 1).await;

    let (status, _) = app
        .post(
            &format!("/api/v1/opportunities/{}/applications", id),
            &org,
            json!({}),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_withdraw_inside_cutoff_is_refused() {
    let app = TestApp::new();
    let org = app.organization("org-6").await;
    let volunteer = app.volunteer("vol-6").await;
    let id = app.opportunity(&org, Duration::hours(6), 3).await;
    let uri = format!("/api/v1/opportunities/{}/applications", id);

    let (status, _) = app.post(&uri, &volunteer, json!({})).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.delete(&format!("{}/@me", uri), &volunteer).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, mine) = app.get("/api/v1/users/@me/applications", &volunteer).await;
    assert_eq!(mine[0]["status"], "pending");
    assert_eq!(mine[0]["can_withdraw"], false);
}

#[tokio::test]
async fn test_withdraw_releases_seat_and_reapply_reopens() {
    let app = TestApp::new();
    let org = app.organization("org-7").await;
    let volunteer = app.volunteer("vol-7").await;
    let id = app.opportunity(&org, Duration::days(3), 1).await;
    let uri = format!("/api/v1/opportunities/{}/applications", id);

    app.post(&uri, &volunteer, json!({})).await;

    let (status, body) = app.delete(&format!("{}/@me", uri), &volunteer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "withdrawn");

    let (_, opportunity) = app.get(&format!("/api/v1/opportunities/{}", id), &org).await;
    assert_eq!(opportunity["filled_seats"], 0);

    let (status, body) = app.post(&uri, &volunteer, json!({ "message": "Back again" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], format!("{}_vol-7", id));
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn test_owner_accepts_and_rejects() {
    let app = TestApp::new();
    let org = app.organization("org-8").await;
    let other_org = app.organization("org-8x").await;
    let first = app.volunteer("vol-8a").await;
    let second = app.volunteer("vol-8b").await;
    let id = app.opportunity(&org, Duration::days(3), 2).await;
    let uri = format!("/api/v1/opportunities/{}/applications", id);

    app.post(&uri, &first, json!({})).await;
    app.post(&uri, &second, json!({})).await;

    let (status, applicants) = app.get(&uri, &org).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(applicants.as_array().unwrap().len(), 2);
    assert!(applicants[0]["volunteer"]["display_name"].is_string());

    let (status, _) = app.get(&uri, &other_org).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let accept = format!("/api/v1/applications/{}_vol-8a/accept", id);
    let (status, _) = app.post(&accept, &other_org, json!({})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.post(&accept, &org, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");
    assert!(body["decided_at"].is_string());

    let (status, _) = app.post(&accept, &org, json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let reject = format!("/api/v1/applications/{}_vol-8b/reject", id);
    let (status, body) = app.post(&reject, &org, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");

    let (_, opportunity) = app.get(&format!("/api/v1/opportunities/{}", id), &org).await;
    assert_eq!(opportunity["filled_seats"], 1);

    assert!(app
        .outbox
        .messages_to(&email_for("vol-8a"))
        .iter()
        .any(|m| m.subject == "You're in: Pantry sorting"));

    let (status, _) = app
        .post("/api/v1/applications/missing_key/accept", &org, json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboards_reflect_activity() {
    let app = TestApp::new();
    let org = app.organization("org-9").await;
    let volunteer = app.volunteer("vol-9").await;
    let id = app.opportunity(&org, Duration::days(3), 3).await;

    // one view
    app.get(&format!("/api/v1/opportunities/{}", id), &volunteer).await;
    app.post(
        &format!("/api/v1/opportunities/{}/applications", id),
        &volunteer,
        json!({}),
    )
    .await;

    let (status, body) = app.get("/api/v1/dashboard/volunteer", &volunteer).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applications"]["pending"], 1);
    assert_eq!(body["applications"]["total"], 1);
    assert_eq!(body["upcoming"], json!([]));

    let (status, body) = app.get("/api/v1/dashboard/organization", &org).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totals"]["opportunities"], 1);
    assert_eq!(body["totals"]["pending_applications"], 1);
    assert_eq!(body["totals"]["filled_seats"], 1);
    assert_eq!(body["opportunities"][0]["views"], 1);

    app.post(
        &format!("/api/v1/applications/{}_vol-9/accept", id),
        &org,
        json!({}),
    )
    .await;

    let (_, body) = app.get("/api/v1/dashboard/volunteer", &volunteer).await;
    assert_eq!(body["applications"]["accepted"], 1);
    assert_eq!(body["upcoming"][0]["id"], id);

    let (status, _) = app.get("/api/v1/dashboard/organization", &volunteer).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
