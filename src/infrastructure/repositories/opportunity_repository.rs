//! Opportunity Repository Implementation
//!
//! PostgreSQL implementation of the OpportunityRepository trait.
//! Seat bookkeeping uses single conditional UPDATE statements so that
//! concurrent applications cannot overfill an opportunity.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{Opportunity, OpportunityFilter, OpportunityRepository, OpportunityStatus};
use crate::shared::error::AppError;

const OPPORTUNITY_COLUMNS: &str = r#"
    id, organization_id, title, description, location, category,
    start_time, end_time, total_seats, filled_seats, status, created_at, updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct OpportunityRow {
    id: i64,
    organization_id: String,
    title: String,
    description: String,
    location: String,
    category: Option<String>,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    total_seats: i32,
    filled_seats: i32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OpportunityRow {
    fn into_opportunity(self) -> Opportunity {
        Opportunity {
            id: self.id,
            organization_id: self.organization_id,
            title: self.title,
            description: self.description,
            location: self.location,
            category: self.category,
            start_time: self.start_time,
            end_time: self.end_time,
            total_seats: self.total_seats,
            filled_seats: self.filled_seats,
            status: OpportunityStatus::from_db(&self.status),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// PostgreSQL opportunity repository implementation.
#[derive(Clone)]
pub struct PgOpportunityRepository {
    pool: PgPool,
}

impl PgOpportunityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OpportunityRepository for PgOpportunityRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Opportunity>, AppError> {
        let row = sqlx::query_as::<_, OpportunityRow>(&format!(
            "SELECT {} FROM opportunities WHERE id = $1",
            OPPORTUNITY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(OpportunityRow::into_opportunity))
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Opportunity>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, OpportunityRow>(&format!(
            "SELECT {} FROM opportunities WHERE id = ANY($1) ORDER BY start_time ASC",
            OPPORTUNITY_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OpportunityRow::into_opportunity).collect())
    }

    async fn list(&self, filter: &OpportunityFilter) -> Result<Vec<Opportunity>, AppError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM opportunities WHERE TRUE",
            OPPORTUNITY_COLUMNS
        ));

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(category) = &filter.category {
            query.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(organization_id) = &filter.organization_id {
            query
                .push(" AND organization_id = ")
                .push_bind(organization_id.clone());
        }
        if let Some(after) = filter.starts_after {
            query.push(" AND start_time > ").push_bind(after);
        }

        query
            .push(" ORDER BY start_time ASC, id ASC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.offset);

        let rows = query
            .build_query_as::<OpportunityRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(OpportunityRow::into_opportunity).collect())
    }

    async fn create(&self, opportunity: &Opportunity) -> Result<Opportunity, AppError> {
        let row = sqlx::query_as::<_, OpportunityRow>(&format!(
            r#"
            INSERT INTO opportunities (id, organization_id, title, description, location, category,
                                       start_time, end_time, total_seats, filled_seats, status,
                                       created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            OPPORTUNITY_COLUMNS
        ))
        .bind(opportunity.id)
        .bind(&opportunity.organization_id)
        .bind(&opportunity.title)
        .bind(&opportunity.description)
        .bind(&opportunity.location)
        .bind(&opportunity.category)
        .bind(opportunity.start_time)
        .bind(opportunity.end_time)
        .bind(opportunity.total_seats)
        .bind(opportunity.filled_seats)
        .bind(opportunity.status.as_str())
        .bind(opportunity.created_at)
        .bind(opportunity.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_opportunity())
    }

    /// The seat guard keeps a concurrent reservation from being undercut
    /// by a shrinking `total_seats`.
    async fn update(&self, opportunity: &Opportunity) -> Result<Opportunity, AppError> {
        let row = sqlx::query_as::<_, OpportunityRow>(&format!(
            r#"
            UPDATE opportunities
            SET title = $2,
                description = $3,
                location = $4,
                category = $5,
                start_time = $6,
                end_time = $7,
                total_seats = $8,
                updated_at = NOW()
            WHERE id = $1 AND filled_seats <= $8
            RETURNING {}
            "#,
            OPPORTUNITY_COLUMNS
        ))
        .bind(opportunity.id)
        .bind(&opportunity.title)
        .bind(&opportunity.description)
        .bind(&opportunity.location)
        .bind(&opportunity.category)
        .bind(opportunity.start_time)
        .bind(opportunity.end_time)
        .bind(opportunity.total_seats)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(row.into_opportunity()),
            None => match self.find_by_id(opportunity.id).await? {
                None => Err(AppError::NotFound(format!(
                    "Opportunity {} not found",
                    opportunity.id
                ))),
                Some(_) => Err(AppError::Conflict(
                    "total_seats cannot be lower than filled seats".into(),
                )),
            },
        }
    }

    async fn set_status(
        &self,
        id: i64,
        expected: &[OpportunityStatus],
        next: OpportunityStatus,
    ) -> Result<Option<Opportunity>, AppError> {
        let expected: Vec<&str> = expected.iter().map(OpportunityStatus::as_str).collect();

        let row = sqlx::query_as::<_, OpportunityRow>(&format!(
            r#"
            UPDATE opportunities
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = ANY($2)
            RETURNING {}
            "#,
            OPPORTUNITY_COLUMNS
        ))
        .bind(id)
        .bind(&expected)
        .bind(next.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(OpportunityRow::into_opportunity))
    }

    /// The seat guard runs in the same statement, so a reservation that
    /// lands after the caller's read still blocks the delete.
    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM opportunities WHERE id = $1 AND filled_seats = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return match self.find_by_id(id).await? {
                None => Err(AppError::NotFound(format!("Opportunity {} not found", id))),
                Some(o) => Err(AppError::Conflict(format!(
                    "Opportunity still has {} active applications",
                    o.filled_seats
                ))),
            };
        }

        Ok(())
    }

    async fn reserve_seat(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE opportunities
            SET filled_seats = filled_seats + 1, updated_at = NOW()
            WHERE id = $1
              AND status = 'open'
              AND filled_seats < total_seats
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn release_seat(&self, id: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE opportunities
            SET filled_seats = GREATEST(filled_seats - 1, 0), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
