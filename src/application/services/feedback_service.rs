//! Feedback Service
//!
//! Post-event ratings from accepted volunteers.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument};

use crate::domain::{
    average_rating, ApplicationKey, ApplicationRepository, ApplicationStatus, Feedback,
    FeedbackRepository, OpportunityRepository, MAX_RATING, MIN_RATING,
};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// Feedback service trait
#[async_trait]
pub trait FeedbackService: Send + Sync {
    async fn submit_feedback(
        &self,
        opportunity_id: i64,
        volunteer_id: &str,
        rating: i16,
        comment: Option<String>,
    ) -> Result<Feedback, FeedbackError>;

    async fn list_for_opportunity(&self, opportunity_id: i64) -> Result<FeedbackSummary, FeedbackError>;
}

#[derive(Debug, Clone)]
pub struct FeedbackSummary {
    pub opportunity_id: i64,
    pub average_rating: Option<f64>,
    pub entries: Vec<Feedback>,
}

/// Feedback service errors
#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("Opportunity not found")]
    OpportunityNotFound,

    #[error("Only accepted volunteers can leave feedback")]
    NotAccepted,

    #[error("Feedback opens once the opportunity has ended")]
    NotFinished,

    #[error("Rating must be between {} and {}", MIN_RATING, MAX_RATING)]
    InvalidRating,

    #[error("Feedback already submitted")]
    AlreadySubmitted,

    #[error("{0}")]
    Store(#[from] AppError),
}

impl From<FeedbackError> for AppError {
    fn from(err: FeedbackError) -> Self {
        match err {
            FeedbackError::OpportunityNotFound => AppError::NotFound(err.to_string()),
            FeedbackError::NotAccepted => AppError::Forbidden(err.to_string()),
            FeedbackError::NotFinished | FeedbackError::InvalidRating => {
                AppError::BadRequest(err.to_string())
            }
            FeedbackError::AlreadySubmitted => AppError::Conflict(err.to_string()),
            FeedbackError::Store(e) => e,
        }
    }
}

/// FeedbackService implementation
pub struct FeedbackServiceImpl<F, A, O>
where
    F: FeedbackRepository + ?Sized,
    A: ApplicationRepository + ?Sized,
    O: OpportunityRepository + ?Sized,
{
    feedback_repo: Arc<F>,
    application_repo: Arc<A>,
    opportunity_repo: Arc<O>,
}

impl<F, A, O> FeedbackServiceImpl<F, A, O>
where
    F: FeedbackRepository + ?Sized,
    A: ApplicationRepository + ?Sized,
    O: OpportunityRepository + ?Sized,
{
    pub fn new(feedback_repo: Arc<F>, application_repo: Arc<A>, opportunity_repo: Arc<O>) -> Self {
        Self {
            feedback_repo,
            application_repo,
            opportunity_repo,
        }
    }
}

#[async_trait]
impl<F, A, O> FeedbackService for FeedbackServiceImpl<F, A, O>
where
    F: FeedbackRepository + ?Sized + 'static,
    A: ApplicationRepository + ?Sized + 'static,
    O: OpportunityRepository + ?Sized + 'static,
{
    #[instrument(skip(self, comment))]
    async fn submit_feedback(
        &self,
        opportunity_id: i64,
        volunteer_id: &str,
        rating: i16,
        comment: Option<String>,
    ) -> Result<Feedback, FeedbackError> {
        if !Feedback::is_valid_rating(rating) {
            return Err(FeedbackError::InvalidRating);
        }

        let opportunity = self
            .opportunity_repo
            .find_by_id(opportunity_id)
            .await?
            .ok_or(FeedbackError::OpportunityNotFound)?;

        let key = ApplicationKey::new(opportunity_id, volunteer_id).to_string();
        let accepted = self
            .application_repo
            .find_by_id(&key)
            .await?
            .is_some_and(|a| a.status == ApplicationStatus::Accepted);
        if !accepted {
            return Err(FeedbackError::NotAccepted);
        }

        if !opportunity.is_finished(Utc::now()) {
            return Err(FeedbackError::NotFinished);
        }

        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let feedback = Feedback::new(
            opportunity_id,
            volunteer_id,
            opportunity.organization_id,
            rating,
            comment,
        );

        let created = match self.feedback_repo.create(&feedback).await {
            Ok(created) => created,
            Err(AppError::Conflict(_)) => return Err(FeedbackError::AlreadySubmitted),
            Err(e) => return Err(e.into()),
        };

        info!(feedback_id = %created.id, rating, "Feedback submitted");
        metrics::record_domain_event("feedback_submitted");
        Ok(created)
    }

    async fn list_for_opportunity(&self, opportunity_id: i64) -> Result<FeedbackSummary, FeedbackError> {
        if self.opportunity_repo.find_by_id(opportunity_id).await?.is_none() {
            return Err(FeedbackError::OpportunityNotFound);
        }

        let entries = self.feedback_repo.find_by_opportunity(opportunity_id).await?;
        Ok(FeedbackSummary {
            opportunity_id,
            average_rating: average_rating(&entries),
            entries,
        })
    }
}
