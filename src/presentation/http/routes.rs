//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{auth_middleware, track_metrics};
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(track_metrics))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes, all behind identity-token authentication
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/users", user_routes())
        .nest("/opportunities", opportunity_routes())
        .nest("/applications", application_routes())
        .nest("/dashboard", dashboard_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/@me/login", post(handlers::user::login))
        .route(
            "/@me",
            get(handlers::user::get_current_user).patch(handlers::user::update_current_user),
        )
        .route("/@me/onboarding", get(handlers::user::get_onboarding))
        .route("/@me/applications", get(handlers::user::get_my_applications))
        .route("/{user_id}", get(handlers::user::get_user))
}

fn opportunity_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::opportunity::list_opportunities)
                .post(handlers::opportunity::create_opportunity),
        )
        .route(
            "/{opportunity_id}",
            get(handlers::opportunity::get_opportunity)
                .patch(handlers::opportunity::update_opportunity)
                .delete(handlers::opportunity::delete_opportunity),
        )
        .route(
            "/{opportunity_id}/status",
            post(handlers::opportunity::change_status),
        )
        .route(
            "/{opportunity_id}/applications",
            get(handlers::application::list_applications)
                .post(handlers::application::submit_application),
        )
        .route(
            "/{opportunity_id}/applications/@me",
            delete(handlers::application::withdraw_application),
        )
        .route(
            "/{opportunity_id}/feedback",
            get(handlers::feedback::list_feedback).post(handlers::feedback::submit_feedback),
        )
}

fn application_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{application_id}/accept",
            post(handlers::application::accept_application),
        )
        .route(
            "/{application_id}/reject",
            post(handlers::application::reject_application),
        )
}

fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/volunteer", get(handlers::dashboard::volunteer_dashboard))
        .route(
            "/organization",
            get(handlers::dashboard::organization_dashboard),
        )
}
