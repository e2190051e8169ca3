//! Feedback Handlers

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use super::parse_id;
use crate::application::dto::request::SubmitFeedbackRequest;
use crate::application::dto::response::{FeedbackListResponse, FeedbackResponse};
use crate::application::services::FeedbackService;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validate_body;
use crate::startup::AppState;

/// Rate a finished opportunity
pub async fn submit_feedback(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(opportunity_id): Path<String>,
    Json(body): Json<SubmitFeedbackRequest>,
) -> Result<(StatusCode, Json<FeedbackResponse>), AppError> {
    let opportunity_id = parse_id(&opportunity_id, "opportunity")?;
    validate_body(&body)?;

    let feedback = state
        .feedback_service()
        .submit_feedback(opportunity_id, &auth.uid, body.rating, body.comment)
        .await?;

    Ok((StatusCode::CREATED, Json(FeedbackResponse::from(feedback))))
}

/// Feedback for an opportunity with its average rating
pub async fn list_feedback(
    State(state): State<AppState>,
    Path(opportunity_id): Path<String>,
) -> Result<Json<FeedbackListResponse>, AppError> {
    let opportunity_id = parse_id(&opportunity_id, "opportunity")?;

    let summary = state
        .feedback_service()
        .list_for_opportunity(opportunity_id)
        .await?;

    Ok(Json(FeedbackListResponse::from(summary)))
}
