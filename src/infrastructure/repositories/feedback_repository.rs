//! Feedback Repository Implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Feedback, FeedbackRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct FeedbackRow {
    id: String,
    opportunity_id: i64,
    volunteer_id: String,
    organization_id: String,
    rating: i16,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<FeedbackRow> for Feedback {
    fn from(row: FeedbackRow) -> Self {
        Feedback {
            id: row.id,
            opportunity_id: row.opportunity_id,
            volunteer_id: row.volunteer_id,
            organization_id: row.organization_id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL feedback repository implementation.
#[derive(Clone)]
pub struct PgFeedbackRepository {
    pool: PgPool,
}

impl PgFeedbackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedbackRepository for PgFeedbackRepository {
    async fn create(&self, feedback: &Feedback) -> Result<Feedback, AppError> {
        let row = sqlx::query_as::<_, FeedbackRow>(
            r#"
            INSERT INTO feedback (id, opportunity_id, volunteer_id, organization_id, rating, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            RETURNING id, opportunity_id, volunteer_id, organization_id, rating, comment, created_at
            "#,
        )
        .bind(&feedback.id)
        .bind(feedback.opportunity_id)
        .bind(&feedback.volunteer_id)
        .bind(&feedback.organization_id)
        .bind(feedback.rating)
        .bind(&feedback.comment)
        .bind(feedback.created_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Conflict("Feedback already submitted".into()))?;

        Ok(row.into())
    }

    async fn find_by_opportunity(&self, opportunity_id: i64) -> Result<Vec<Feedback>, AppError> {
        let rows = sqlx::query_as::<_, FeedbackRow>(
            r#"
            SELECT id, opportunity_id, volunteer_id, organization_id, rating, comment, created_at
            FROM feedback
            WHERE opportunity_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(opportunity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Feedback::from).collect())
    }

    async fn find_by_volunteer(&self, volunteer_id: &str) -> Result<Vec<Feedback>, AppError> {
        let rows = sqlx::query_as::<_, FeedbackRow>(
            r#"
            SELECT id, opportunity_id, volunteer_id, organization_id, rating, comment, created_at
            FROM feedback
            WHERE volunteer_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(volunteer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Feedback::from).collect())
    }
}
