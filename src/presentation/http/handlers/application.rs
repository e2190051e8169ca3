//! Application Handlers
//!
//! Volunteers apply and withdraw; the owning organization accepts or rejects.

use axum::{
    body::Bytes,
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use super::parse_id;
use crate::application::dto::request::SubmitApplicationRequest;
use crate::application::dto::response::{ApplicantResponse, ApplicationResponse};
use crate::application::services::ApplicationService;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validate_body;
use crate::startup::AppState;

/// Apply to an opportunity
///
/// The body is optional; an empty POST applies without a message.
pub async fn submit_application(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(opportunity_id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApplicationResponse>), AppError> {
    let opportunity_id = parse_id(&opportunity_id, "opportunity")?;
    let body: SubmitApplicationRequest = if body.is_empty() {
        SubmitApplicationRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?
    };
    validate_body(&body)?;

    let application = state
        .application_service()
        .submit_application(opportunity_id, &auth.uid, body.message)
        .await?;

    Ok((StatusCode::CREATED, Json(ApplicationResponse::from(application))))
}

/// Withdraw the caller's application
pub async fn withdraw_application(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(opportunity_id): Path<String>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let opportunity_id = parse_id(&opportunity_id, "opportunity")?;

    let application = state
        .application_service()
        .withdraw_application(opportunity_id, &auth.uid)
        .await?;

    Ok(Json(ApplicationResponse::from(application)))
}

/// Applicants for an opportunity (owner only)
pub async fn list_applications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(opportunity_id): Path<String>,
) -> Result<Json<Vec<ApplicantResponse>>, AppError> {
    let opportunity_id = parse_id(&opportunity_id, "opportunity")?;

    let entries = state
        .application_service()
        .list_for_opportunity(opportunity_id, &auth.uid)
        .await?;

    Ok(Json(entries.into_iter().map(ApplicantResponse::from).collect()))
}

/// Accept an application
pub async fn accept_application(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(application_id): Path<String>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let application = state
        .application_service()
        .accept_application(&application_id, &auth.uid)
        .await?;

    Ok(Json(ApplicationResponse::from(application)))
}

/// Reject an application
pub async fn reject_application(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(application_id): Path<String>,
) -> Result<Json<ApplicationResponse>, AppError> {
    let application = state
        .application_service()
        .reject_application(&application_id, &auth.uid)
        .await?;

    Ok(Json(ApplicationResponse::from(application)))
}
