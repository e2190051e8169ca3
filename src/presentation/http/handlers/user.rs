//! User Handlers

use axum::{
    extract::{Extension, Path, State},
    Json,
};

use crate::application::dto::request::UpdateProfileRequest;
use crate::application::dto::response::{
    LoginResponse, MyApplicationResponse, OnboardingResponse, ProfileResponse,
    PublicProfileResponse,
};
use crate::application::services::{ApplicationService, LoginIdentity, UserService};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validate_body;
use crate::startup::AppState;

/// Sign-in bookkeeping for the authenticated identity
///
/// Creates the profile on first login and sends the welcome email once.
pub async fn login(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<LoginResponse>, AppError> {
    let identity = LoginIdentity {
        uid: auth.uid,
        email: auth.email,
        name: auth.name,
    };

    let outcome = state.user_service().record_login(identity).await?;

    Ok(Json(LoginResponse::from(outcome)))
}

/// Get current authenticated user
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = state.user_service().get_profile(&auth.uid).await?;

    Ok(Json(ProfileResponse::from(profile)))
}

/// Update current user profile
pub async fn update_current_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    validate_body(&body)?;

    let profile = state
        .user_service()
        .update_profile(&auth.uid, body.into())
        .await?;

    Ok(Json(ProfileResponse::from(profile)))
}

/// Onboarding gate: role and required profile fields
pub async fn get_onboarding(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<OnboardingResponse>, AppError> {
    let status = state.user_service().onboarding_status(&auth.uid).await?;

    Ok(Json(OnboardingResponse::from(status)))
}

/// The caller's applications, newest first
pub async fn get_my_applications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<MyApplicationResponse>>, AppError> {
    let cutoff = state.withdrawal_cutoff_hours();
    let entries = state
        .application_service()
        .list_for_volunteer(&auth.uid)
        .await?;

    Ok(Json(
        entries
            .into_iter()
            .map(|entry| MyApplicationResponse::from_entry(entry, cutoff))
            .collect(),
    ))
}

/// Get another user's public profile
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<PublicProfileResponse>, AppError> {
    let profile = state.user_service().get_public_profile(&user_id).await?;

    Ok(Json(PublicProfileResponse::from(profile)))
}
