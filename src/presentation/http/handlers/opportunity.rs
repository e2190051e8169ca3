//! Opportunity Handlers

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

use super::parse_id;
use crate::application::dto::request::{
    ChangeStatusRequest, CreateOpportunityRequest, ListOpportunitiesParams,
    UpdateOpportunityRequest,
};
use crate::application::dto::response::OpportunityResponse;
use crate::application::services::OpportunityService;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validate_body;
use crate::startup::AppState;

/// List opportunities, soonest first
pub async fn list_opportunities(
    State(state): State<AppState>,
    Query(params): Query<ListOpportunitiesParams>,
) -> Result<Json<Vec<OpportunityResponse>>, AppError> {
    let cutoff = state.withdrawal_cutoff_hours();
    let opportunities = state
        .opportunity_service()
        .list_opportunities(params.into())
        .await?;

    Ok(Json(
        opportunities
            .into_iter()
            .map(|o| OpportunityResponse::from_opportunity(o, cutoff))
            .collect(),
    ))
}

/// Post a new opportunity
pub async fn create_opportunity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateOpportunityRequest>,
) -> Result<(StatusCode, Json<OpportunityResponse>), AppError> {
    validate_body(&body)?;

    let opportunity = state
        .opportunity_service()
        .create_opportunity(&auth.uid, body.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(OpportunityResponse::from_opportunity(
            opportunity,
            state.withdrawal_cutoff_hours(),
        )),
    ))
}

/// Get opportunity by ID
pub async fn get_opportunity(
    State(state): State<AppState>,
    Path(opportunity_id): Path<String>,
) -> Result<Json<OpportunityResponse>, AppError> {
    let opportunity_id = parse_id(&opportunity_id, "opportunity")?;

    let opportunity = state
        .opportunity_service()
        .get_opportunity(opportunity_id)
        .await?;

    Ok(Json(OpportunityResponse::from_opportunity(
        opportunity,
        state.withdrawal_cutoff_hours(),
    )))
}

/// Update opportunity
pub async fn update_opportunity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(opportunity_id): Path<String>,
    Json(body): Json<UpdateOpportunityRequest>,
) -> Result<Json<OpportunityResponse>, AppError> {
    let opportunity_id = parse_id(&opportunity_id, "opportunity")?;
    validate_body(&body)?;

    let opportunity = state
        .opportunity_service()
        .update_opportunity(opportunity_id, &auth.uid, body.into())
        .await?;

    Ok(Json(OpportunityResponse::from_opportunity(
        opportunity,
        state.withdrawal_cutoff_hours(),
    )))
}

/// Open, close or complete an opportunity
pub async fn change_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(opportunity_id): Path<String>,
    Json(body): Json<ChangeStatusRequest>,
) -> Result<Json<OpportunityResponse>, AppError> {
    let opportunity_id = parse_id(&opportunity_id, "opportunity")?;

    let opportunity = state
        .opportunity_service()
        .change_status(opportunity_id, &auth.uid, body.status)
        .await?;

    Ok(Json(OpportunityResponse::from_opportunity(
        opportunity,
        state.withdrawal_cutoff_hours(),
    )))
}

/// Delete opportunity
pub async fn delete_opportunity(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(opportunity_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let opportunity_id = parse_id(&opportunity_id, "opportunity")?;

    state
        .opportunity_service()
        .delete_opportunity(opportunity_id, &auth.uid)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
