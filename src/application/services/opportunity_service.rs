//! Opportunity Service
//!
//! Business logic for posting, browsing and managing opportunities.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use super::analytics_recorder::AnalyticsRecorder;
use crate::domain::{
    AnalyticsCounter, Opportunity, OpportunityFilter, OpportunityRepository, OpportunityStatus,
    UserProfile, UserRepository,
};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Opportunity service trait
#[async_trait]
pub trait OpportunityService: Send + Sync {
    /// Post a new opportunity as an organization
    async fn create_opportunity(
        &self,
        organization_id: &str,
        dto: CreateOpportunityDto,
    ) -> Result<Opportunity, OpportunityError>;

    /// Fetch one opportunity and count the view
    async fn get_opportunity(&self, id: i64) -> Result<Opportunity, OpportunityError>;

    async fn list_opportunities(
        &self,
        query: ListOpportunitiesQuery,
    ) -> Result<Vec<Opportunity>, OpportunityError>;

    /// Edit an opportunity (owner only)
    async fn update_opportunity(
        &self,
        id: i64,
        organization_id: &str,
        dto: UpdateOpportunityDto,
    ) -> Result<Opportunity, OpportunityError>;

    /// Open, close or complete an opportunity (owner only)
    async fn change_status(
        &self,
        id: i64,
        organization_id: &str,
        status: OpportunityStatus,
    ) -> Result<Opportunity, OpportunityError>;

    /// Delete an opportunity that no application holds a seat on (owner only)
    async fn delete_opportunity(&self, id: i64, organization_id: &str) -> Result<(), OpportunityError>;
}

#[derive(Debug, Clone)]
pub struct CreateOpportunityDto {
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_seats: i32,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOpportunityDto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_seats: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct ListOpportunitiesQuery {
    pub status: Option<OpportunityStatus>,
    pub category: Option<String>,
    pub organization_id: Option<String>,
    /// Only opportunities that have not started yet
    pub upcoming: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListOpportunitiesQuery {
    pub fn into_filter(self, now: DateTime<Utc>) -> OpportunityFilter {
        OpportunityFilter {
            status: self.status,
            category: self.category,
            organization_id: self.organization_id,
            starts_after: self.upcoming.then_some(now),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            offset: self.offset.unwrap_or(0).max(0),
        }
    }
}

/// Opportunity service errors
#[derive(Debug, thiserror::Error)]
pub enum OpportunityError {
    #[error("Opportunity not found")]
    NotFound,

    #[error("Only organizations can manage opportunities")]
    NotOrganization,

    #[error("Complete your profile first (missing: {})", .0.join(", "))]
    ProfileIncomplete(Vec<&'static str>),

    #[error("You do not own this opportunity")]
    NotOwner,

    #[error("{0}")]
    InvalidSchedule(&'static str),

    #[error("total_seats must be at least 1")]
    InvalidSeats,

    #[error("total_seats cannot be lower than the {0} seats already filled")]
    SeatsBelowFilled(i32),

    #[error("Cannot change status from {from} to {to}")]
    InvalidStatusTransition {
        from: OpportunityStatus,
        to: OpportunityStatus,
    },

    #[error("Opportunity still has {0} active applications")]
    HasActiveApplications(i32),

    #[error("{0}")]
    Store(#[from] AppError),
}

impl From<OpportunityError> for AppError {
    fn from(err: OpportunityError) -> Self {
        match err {
            OpportunityError::NotFound => AppError::NotFound(err.to_string()),
            OpportunityError::NotOrganization
            | OpportunityError::ProfileIncomplete(_)
            | OpportunityError::NotOwner => AppError::Forbidden(err.to_string()),
            OpportunityError::InvalidSchedule(_) | OpportunityError::InvalidSeats => {
                AppError::BadRequest(err.to_string())
            }
            OpportunityError::SeatsBelowFilled(_)
            | OpportunityError::InvalidStatusTransition { .. }
            | OpportunityError::HasActiveApplications(_) => AppError::Conflict(err.to_string()),
            OpportunityError::Store(e) => e,
        }
    }
}

fn check_schedule(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), OpportunityError> {
    if end <= start {
        return Err(OpportunityError::InvalidSchedule("end_time must be after start_time"));
    }
    Ok(())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// OpportunityService implementation
pub struct OpportunityServiceImpl<O, U>
where
    O: OpportunityRepository + ?Sized,
    U: UserRepository + ?Sized,
{
    opportunity_repo: Arc<O>,
    user_repo: Arc<U>,
    analytics: AnalyticsRecorder,
    snowflake: Arc<SnowflakeGenerator>,
}

impl<O, U> OpportunityServiceImpl<O, U>
where
    O: OpportunityRepository + ?Sized,
    U: UserRepository + ?Sized,
{
    pub fn new(
        opportunity_repo: Arc<O>,
        user_repo: Arc<U>,
        analytics: AnalyticsRecorder,
        snowflake: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            opportunity_repo,
            user_repo,
            analytics,
            snowflake,
        }
    }

    /// The caller must be an organization with a complete profile.
    async fn require_organization(&self, user_id: &str) -> Result<UserProfile, OpportunityError> {
        let profile = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(OpportunityError::NotOrganization)?;

        if !profile.is_organization() {
            return Err(OpportunityError::NotOrganization);
        }
        let missing = profile.missing_fields();
        if !missing.is_empty() {
            return Err(OpportunityError::ProfileIncomplete(missing));
        }
        Ok(profile)
    }

    /// Load an opportunity owned by the caller.
    async fn load_owned(&self, id: i64, organization_id: &str) -> Result<Opportunity, OpportunityError> {
        let opportunity = self
            .opportunity_repo
            .find_by_id(id)
            .await?
            .ok_or(OpportunityError::NotFound)?;

        if opportunity.organization_id != organization_id {
            return Err(OpportunityError::NotOwner);
        }
        Ok(opportunity)
    }
}

#[async_trait]
impl<O, U> OpportunityService for OpportunityServiceImpl<O, U>
where
    O: OpportunityRepository + ?Sized + 'static,
    U: UserRepository + ?Sized + 'static,
{
    #[instrument(skip(self, dto), fields(title = %dto.title))]
    async fn create_opportunity(
        &self,
        organization_id: &str,
        dto: CreateOpportunityDto,
    ) -> Result<Opportunity, OpportunityError> {
        self.require_organization(organization_id).await?;

        check_schedule(dto.start_time, dto.end_time)?;
        let now = Utc::now();
        if dto.start_time <= now {
            return Err(OpportunityError::InvalidSchedule("start_time must be in the future"));
        }
        if dto.total_seats < 1 {
            return Err(OpportunityError::InvalidSeats);
        }

        let opportunity = Opportunity {
            id: self.snowflake.generate(),
            organization_id: organization_id.to_string(),
            title: dto.title.trim().to_string(),
            description: dto.description.trim().to_string(),
            location: dto.location.trim().to_string(),
            category: trimmed(dto.category),
            start_time: dto.start_time,
            end_time: dto.end_time,
            total_seats: dto.total_seats,
            filled_seats: 0,
            status: OpportunityStatus::Open,
            created_at: now,
            updated_at: now,
        };

        let created = self.opportunity_repo.create(&opportunity).await?;

        info!(opportunity_id = created.id, organization_id, "Opportunity created");
        metrics::record_domain_event("opportunity_created");
        self.analytics
            .record(AnalyticsCounter::OpportunitiesCreated {
                organization_id: organization_id.to_string(),
            })
            .await;

        Ok(created)
    }

    async fn get_opportunity(&self, id: i64) -> Result<Opportunity, OpportunityError> {
        let opportunity = self
            .opportunity_repo
            .find_by_id(id)
            .await?
            .ok_or(OpportunityError::NotFound)?;

        self.analytics
            .record(AnalyticsCounter::OpportunityViews { opportunity_id: id })
            .await;

        Ok(opportunity)
    }

    async fn list_opportunities(
        &self,
        query: ListOpportunitiesQuery,
    ) -> Result<Vec<Opportunity>, OpportunityError> {
        let filter = query.into_filter(Utc::now());
        Ok(self.opportunity_repo.list(&filter).await?)
    }

    #[instrument(skip(self, dto))]
    async fn update_opportunity(
        &self,
        id: i64,
        organization_id: &str,
        dto: UpdateOpportunityDto,
    ) -> Result<Opportunity, OpportunityError> {
        let mut opportunity = self.load_owned(id, organization_id).await?;

        if let Some(title) = dto.title {
            opportunity.title = title.trim().to_string();
        }
        if let Some(description) = dto.description {
            opportunity.description = description.trim().to_string();
        }
        if let Some(location) = dto.location {
            opportunity.location = location.trim().to_string();
        }
        if dto.category.is_some() {
            opportunity.category = trimmed(dto.category);
        }
        if let Some(start_time) = dto.start_time {
            opportunity.start_time = start_time;
        }
        if let Some(end_time) = dto.end_time {
            opportunity.end_time = end_time;
        }
        check_schedule(opportunity.start_time, opportunity.end_time)?;

        if let Some(total_seats) = dto.total_seats {
            if total_seats < 1 {
                return Err(OpportunityError::InvalidSeats);
            }
            if total_seats < opportunity.filled_seats {
                return Err(OpportunityError::SeatsBelowFilled(opportunity.filled_seats));
            }
            opportunity.total_seats = total_seats;
        }

        // the store re-checks seats against the live counter
        match self.opportunity_repo.update(&opportunity).await {
            Ok(updated) => Ok(updated),
            Err(AppError::Conflict(_)) => {
                let current = self.load_owned(id, organization_id).await?;
                Err(OpportunityError::SeatsBelowFilled(current.filled_seats))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn change_status(
        &self,
        id: i64,
        organization_id: &str,
        status: OpportunityStatus,
    ) -> Result<Opportunity, OpportunityError> {
        let opportunity = self.load_owned(id, organization_id).await?;

        if opportunity.status == status {
            return Ok(opportunity);
        }
        if !opportunity.status.can_transition_to(status) {
            return Err(OpportunityError::InvalidStatusTransition {
                from: opportunity.status,
                to: status,
            });
        }

        // compare-and-set against the status the transition was checked on
        let Some(updated) = self
            .opportunity_repo
            .set_status(id, &[opportunity.status], status)
            .await?
        else {
            let current = self.load_owned(id, organization_id).await?;
            return Err(OpportunityError::InvalidStatusTransition {
                from: current.status,
                to: status,
            });
        };

        info!(opportunity_id = id, status = %status, "Opportunity status changed");
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete_opportunity(&self, id: i64, organization_id: &str) -> Result<(), OpportunityError> {
        let opportunity = self.load_owned(id, organization_id).await?;

        if opportunity.filled_seats > 0 {
            return Err(OpportunityError::HasActiveApplications(opportunity.filled_seats));
        }

        // the store re-checks seats at delete time
        match self.opportunity_repo.delete(id).await {
            Ok(()) => {}
            Err(AppError::Conflict(_)) => {
                let current = self.load_owned(id, organization_id).await?;
                return Err(OpportunityError::HasActiveApplications(current.filled_seats));
            }
            Err(e) => return Err(e.into()),
        }

        info!(opportunity_id = id, "Opportunity deleted");
        Ok(())
    }
}
