//! Application Repository Implementation
//!
//! PostgreSQL implementation of the ApplicationRepository trait.
//! The composite primary key rejects duplicate applications; status changes
//! are compare-and-set updates on the current status.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Application, ApplicationRepository, ApplicationStatus};
use crate::shared::error::AppError;

const APPLICATION_COLUMNS: &str = r#"
    id, opportunity_id, volunteer_id, organization_id, message, status,
    applied_at, updated_at, decided_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct ApplicationRow {
    id: String,
    opportunity_id: i64,
    volunteer_id: String,
    organization_id: String,
    message: Option<String>,
    status: String,
    applied_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    decided_at: Option<DateTime<Utc>>,
}

impl ApplicationRow {
    fn into_application(self) -> Application {
        Application {
            id: self.id,
            opportunity_id: self.opportunity_id,
            volunteer_id: self.volunteer_id,
            organization_id: self.organization_id,
            message: self.message,
            status: ApplicationStatus::from_db(&self.status),
            applied_at: self.applied_at,
            updated_at: self.updated_at,
            decided_at: self.decided_at,
        }
    }
}

/// PostgreSQL application repository implementation.
#[derive(Clone)]
pub struct PgApplicationRepository {
    pool: PgPool,
}

impl PgApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationRepository for PgApplicationRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Application>, AppError> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {} FROM applications WHERE id = $1",
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ApplicationRow::into_application))
    }

    async fn find_by_opportunity(&self, opportunity_id: i64) -> Result<Vec<Application>, AppError> {
        let rows = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {} FROM applications WHERE opportunity_id = $1 ORDER BY applied_at ASC",
            APPLICATION_COLUMNS
        ))
        .bind(opportunity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ApplicationRow::into_application).collect())
    }

    async fn find_by_volunteer(&self, volunteer_id: &str) -> Result<Vec<Application>, AppError> {
        let rows = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {} FROM applications WHERE volunteer_id = $1 ORDER BY applied_at DESC",
            APPLICATION_COLUMNS
        ))
        .bind(volunteer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ApplicationRow::into_application).collect())
    }

    async fn create(&self, application: &Application) -> Result<Application, AppError> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            INSERT INTO applications (id, opportunity_id, volunteer_id, organization_id, message,
                                      status, applied_at, updated_at, decided_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(&application.id)
        .bind(application.opportunity_id)
        .bind(&application.volunteer_id)
        .bind(&application.organization_id)
        .bind(&application.message)
        .bind(application.status.as_str())
        .bind(application.applied_at)
        .bind(application.updated_at)
        .bind(application.decided_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Application {} already exists", application.id)))?;

        Ok(row.into_application())
    }

    async fn transition(
        &self,
        id: &str,
        expected: &[ApplicationStatus],
        next: ApplicationStatus,
        message: Option<String>,
    ) -> Result<Option<Application>, AppError> {
        let expected: Vec<&str> = expected.iter().map(ApplicationStatus::as_str).collect();

        // Reopening resets the decision and the application time.
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            UPDATE applications
            SET status = $3,
                message = COALESCE($4, message),
                updated_at = NOW(),
                decided_at = CASE
                    WHEN $3 IN ('accepted', 'rejected') THEN NOW()
                    WHEN $3 = 'pending' THEN NULL
                    ELSE decided_at
                END,
                applied_at = CASE WHEN $3 = 'pending' THEN NOW() ELSE applied_at END
            WHERE id = $1 AND status = ANY($2)
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .bind(&expected)
        .bind(next.as_str())
        .bind(message)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ApplicationRow::into_application))
    }
}
