//! Dashboard Handlers

use axum::{
    extract::{Extension, State},
    Json,
};

use crate::application::dto::response::{
    OrganizationDashboardResponse, VolunteerDashboardResponse,
};
use crate::application::services::DashboardService;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

pub async fn volunteer_dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<VolunteerDashboardResponse>, AppError> {
    let dashboard = state
        .dashboard_service()
        .volunteer_dashboard(&auth.uid)
        .await?;

    Ok(Json(VolunteerDashboardResponse::from_dashboard(
        dashboard,
        state.withdrawal_cutoff_hours(),
    )))
}

pub async fn organization_dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<OrganizationDashboardResponse>, AppError> {
    let dashboard = state
        .dashboard_service()
        .organization_dashboard(&auth.uid)
        .await?;

    Ok(Json(OrganizationDashboardResponse::from_dashboard(
        dashboard,
        state.withdrawal_cutoff_hours(),
    )))
}
