//! Feedback entity and repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::ApplicationKey;
use crate::shared::error::AppError;

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

/// Post-event feedback from an accepted volunteer.
///
/// Maps to the `feedback` table:
/// - id: TEXT PRIMARY KEY ("{opportunity_id}_{volunteer_id}")
/// - rating: SMALLINT NOT NULL CHECK (rating BETWEEN 1 AND 5)
/// - comment: TEXT NULL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: String,
    pub opportunity_id: i64,
    pub volunteer_id: String,
    pub organization_id: String,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    pub fn new(
        opportunity_id: i64,
        volunteer_id: impl Into<String>,
        organization_id: impl Into<String>,
        rating: i16,
        comment: Option<String>,
    ) -> Self {
        let volunteer_id = volunteer_id.into();
        Self {
            id: ApplicationKey::new(opportunity_id, volunteer_id.clone()).to_string(),
            opportunity_id,
            volunteer_id,
            organization_id: organization_id.into(),
            rating,
            comment,
            created_at: Utc::now(),
        }
    }

    pub fn is_valid_rating(rating: i16) -> bool {
        (MIN_RATING..=MAX_RATING).contains(&rating)
    }
}

/// Mean rating, `None` for an empty slice.
pub fn average_rating(feedback: &[Feedback]) -> Option<f64> {
    if feedback.is_empty() {
        return None;
    }
    let sum: i64 = feedback.iter().map(|f| f.rating as i64).sum();
    Some(sum as f64 / feedback.len() as f64)
}

#[async_trait]
pub trait FeedbackRepository: Send + Sync {
    /// Insert feedback. Fails with `Conflict` for a second entry by the same volunteer.
    async fn create(&self, feedback: &Feedback) -> Result<Feedback, AppError>;

    async fn find_by_opportunity(&self, opportunity_id: i64) -> Result<Vec<Feedback>, AppError>;

    async fn find_by_volunteer(&self, volunteer_id: &str) -> Result<Vec<Feedback>, AppError>;
}
