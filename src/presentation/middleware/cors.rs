//! CORS Middleware Configuration

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

use crate::config::CorsSettings;

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(3600);

/// Create CORS layer from settings
///
/// An empty origin list, or a literal `*`, allows any origin.
pub fn create_cors_layer(settings: &CorsSettings) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let base = CorsLayer::new()
        .allow_methods(methods)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(PREFLIGHT_MAX_AGE);

    if settings.allowed_origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = settings
        .allowed_origins
        .iter()
        .filter_map(|o| o.trim_end_matches('/').parse().ok())
        .collect();

    if origins.is_empty() {
        base.allow_origin(Any)
    } else {
        base.allow_origin(origins)
    }
}
