//! Common Test Utilities
//!
//! The test application runs the real router over the in-memory store,
//! in-memory analytics counters and the outbox mailer.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use volunteer_match::config::Settings;
use volunteer_match::infrastructure::email::OutboxMailer;
use volunteer_match::presentation::middleware::IdentityClaims;
use volunteer_match::startup::{build_router, AppState};

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Test application
pub struct TestApp {
    pub router: Router,
    pub outbox: Arc<OutboxMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        let settings = Settings::in_memory(SECRET).expect("test settings");
        let state = AppState::in_memory(settings);
        let outbox = state.outbox.clone().expect("log mailer outbox");

        Self {
            router: build_router(state),
            outbox,
        }
    }

    /// Send a request and decode the JSON body (`Null` when empty)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Log in and complete a volunteer profile; returns the token
    pub async fn volunteer(&self, uid: &str) -> String {
        let token = token_for(uid);
        let (status, _) = self.post("/api/v1/users/@me/login", &token, json!({})).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = self
            .patch(
                "/api/v1/users/@me",
                &token,
                json!({
                    "role": "volunteer",
                    "display_name": format!("Volunteer {}", uid),
                    "phone": "+1 555 0100",
                    "location": "Springfield"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        token
    }

    /// Log in and complete an organization profile; returns the token
    pub async fn organization(&self, uid: &str) -> String {
        let token = token_for(uid);
        let (status, _) = self.post("/api/v1/users/@me/login", &token, json!({})).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = self
            .patch(
                "/api/v1/users/@me",
                &token,
                json!({
                    "role": "organization",
                    "display_name": "Coordinator",
                    "phone": "+1 555 0199",
                    "organization_name": "Food Bank"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        token
    }

    /// Post an opportunity starting `starts_in` from now; returns its id
    pub async fn opportunity(&self, org_token: &str, starts_in: Duration, seats: i32) -> String {
        let start = Utc::now() + starts_in;
        let end = start + Duration::hours(3);
        let (status, body) = self
            .post(
                "/api/v1/opportunities",
                org_token,
                json!({
                    "title": "Pantry sorting",
                    "description": "Sort donated food",
                    "location": "Warehouse 4",
                    "category": "food",
                    "start_time": start.to_rfc3339(),
                    "end_time": end.to_rfc3339(),
                    "total_seats": seats
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }
}

pub fn email_for(uid: &str) -> String {
    format!("{}@example.com", uid)
}

/// Sign an identity token the way the identity provider would
pub fn sign(uid: &str, expires_in: Duration, secret: &str) -> String {
    let now = Utc::now();
    let claims = IdentityClaims {
        sub: uid.to_string(),
        email: email_for(uid),
        name: Some(format!("User {}", uid)),
        exp: (now + expires_in).timestamp(),
        iat: now.timestamp(),
        iss: None,
        aud: None,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn token_for(uid: &str) -> String {
    sign(uid, Duration::hours(1), SECRET)
}
