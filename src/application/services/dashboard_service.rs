//! Dashboard Service
//!
//! Read-only aggregates for the volunteer and organization home screens.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::analytics_recorder::AnalyticsRecorder;
use crate::domain::{
    AnalyticsCounter, ApplicationRepository, ApplicationStatus, CounterScope, FeedbackRepository,
    Opportunity, OpportunityFilter, OpportunityRepository, OpportunityStatus, UserProfile,
    UserRepository, UserRole,
};
use crate::shared::error::AppError;

/// Opportunities fetched per store round trip for the organization dashboard.
const DASHBOARD_PAGE_SIZE: i64 = 100;

#[async_trait]
pub trait DashboardService: Send + Sync {
    async fn volunteer_dashboard(&self, user_id: &str) -> Result<VolunteerDashboard, DashboardError>;

    async fn organization_dashboard(&self, user_id: &str) -> Result<OrganizationDashboard, DashboardError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub withdrawn: usize,
}

impl StatusCounts {
    fn add(&mut self, status: ApplicationStatus) {
        match status {
            ApplicationStatus::Pending => self.pending += 1,
            ApplicationStatus::Accepted => self.accepted += 1,
            ApplicationStatus::Rejected => self.rejected += 1,
            ApplicationStatus::Withdrawn => self.withdrawn += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.accepted + self.rejected + self.withdrawn
    }
}

#[derive(Debug, Clone)]
pub struct VolunteerDashboard {
    pub applications: StatusCounts,
    /// Accepted opportunities that have not started, soonest first
    pub upcoming: Vec<Opportunity>,
    /// Accepted opportunities that are over
    pub completed_count: usize,
    pub feedback_given: usize,
}

#[derive(Debug, Clone)]
pub struct OpportunitySummary {
    pub opportunity: Opportunity,
    pub applications: StatusCounts,
    pub views: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationTotals {
    pub opportunities: usize,
    pub open_opportunities: usize,
    pub total_seats: i64,
    pub filled_seats: i64,
    pub pending_applications: usize,
    pub views: i64,
    /// Lifetime submissions, including withdrawn and reopened ones
    pub applications_received: i64,
}

#[derive(Debug, Clone)]
pub struct OrganizationDashboard {
    pub opportunities: Vec<OpportunitySummary>,
    pub totals: OrganizationTotals,
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Profile not found")]
    ProfileNotFound,

    #[error("This dashboard is only available to {0} accounts")]
    WrongRole(UserRole),

    #[error("{0}")]
    Store(#[from] AppError),
}

impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::ProfileNotFound => AppError::NotFound(err.to_string()),
            DashboardError::WrongRole(_) => AppError::Forbidden(err.to_string()),
            DashboardError::Store(e) => e,
        }
    }
}

pub struct DashboardServiceImpl<U, O, A, F>
where
    U: UserRepository + ?Sized,
    O: OpportunityRepository + ?Sized,
    A: ApplicationRepository + ?Sized,
    F: FeedbackRepository + ?Sized,
{
    user_repo: Arc<U>,
    opportunity_repo: Arc<O>,
    application_repo: Arc<A>,
    feedback_repo: Arc<F>,
    analytics: AnalyticsRecorder,
    page_size: i64,
}

impl<U, O, A, F> DashboardServiceImpl<U, O, A, F>
where
    U: UserRepository + ?Sized,
    O: OpportunityRepository + ?Sized,
    A: ApplicationRepository + ?Sized,
    F: FeedbackRepository + ?Sized,
{
    pub fn new(
        user_repo: Arc<U>,
        opportunity_repo: Arc<O>,
        application_repo: Arc<A>,
        feedback_repo: Arc<F>,
        analytics: AnalyticsRecorder,
    ) -> Self {
        Self {
            user_repo,
            opportunity_repo,
            application_repo,
            feedback_repo,
            analytics,
            page_size: DASHBOARD_PAGE_SIZE,
        }
    }

    #[cfg(test)]
    fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Every opportunity an organization has posted, page by page.
    async fn all_opportunities(&self, organization_id: &str) -> Result<Vec<Opportunity>, AppError> {
        let mut all = Vec::new();
        loop {
            let page = self
                .opportunity_repo
                .list(&OpportunityFilter {
                    organization_id: Some(organization_id.to_string()),
                    limit: self.page_size,
                    offset: all.len() as i64,
                    ..Default::default()
                })
                .await?;
            let done = (page.len() as i64) < self.page_size;
            all.extend(page);
            if done {
                return Ok(all);
            }
        }
    }

    async fn require_role(&self, user_id: &str, role: UserRole) -> Result<UserProfile, DashboardError> {
        let profile = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(DashboardError::ProfileNotFound)?;
        if profile.role != Some(role) {
            return Err(DashboardError::WrongRole(role));
        }
        Ok(profile)
    }
}

#[async_trait]
impl<U, O, A, F> DashboardService for DashboardServiceImpl<U, O, A, F>
where
    U: UserRepository + ?Sized + 'static,
    O: OpportunityRepository + ?Sized + 'static,
    A: ApplicationRepository + ?Sized + 'static,
    F: FeedbackRepository + ?Sized + 'static,
{
    async fn volunteer_dashboard(&self, user_id: &str) -> Result<VolunteerDashboard, DashboardError> {
        self.require_role(user_id, UserRole::Volunteer).await?;

        let applications = self.application_repo.find_by_volunteer(user_id).await?;
        let mut counts = StatusCounts::default();
        for application in &applications {
            counts.add(application.status);
        }

        let accepted_ids: Vec<i64> = applications
            .iter()
            .filter(|a| a.status == ApplicationStatus::Accepted)
            .map(|a| a.opportunity_id)
            .collect();
        let accepted = self.opportunity_repo.find_by_ids(&accepted_ids).await?;

        let now = Utc::now();
        let completed_count = accepted.iter().filter(|o| o.is_finished(now)).count();
        let mut upcoming: Vec<Opportunity> = accepted
            .into_iter()
            .filter(|o| !o.has_started(now) && o.status != OpportunityStatus::Completed)
            .collect();
        upcoming.sort_by_key(|o| o.start_time);

        let feedback_given = self.feedback_repo.find_by_volunteer(user_id).await?.len();

        Ok(VolunteerDashboard {
            applications: counts,
            upcoming,
            completed_count,
            feedback_given,
        })
    }

    async fn organization_dashboard(&self, user_id: &str) -> Result<OrganizationDashboard, DashboardError> {
        self.require_role(user_id, UserRole::Organization).await?;

        let opportunities = self.all_opportunities(user_id).await?;

        let mut counters: Vec<AnalyticsCounter> = opportunities
            .iter()
            .map(|o| AnalyticsCounter::OpportunityViews { opportunity_id: o.id })
            .collect();
        counters.push(AnalyticsCounter::ApplicationsSubmitted(
            CounterScope::Organization(user_id.to_string()),
        ));
        let mut values = self.analytics.read(&counters).await;
        let applications_received = values.pop().unwrap_or(0);
        let views: HashMap<i64, i64> = opportunities
            .iter()
            .map(|o| o.id)
            .zip(values)
            .collect();

        let mut totals = OrganizationTotals {
            applications_received,
            ..Default::default()
        };
        let mut summaries = Vec::with_capacity(opportunities.len());
        for opportunity in opportunities {
            let mut counts = StatusCounts::default();
            for application in self.application_repo.find_by_opportunity(opportunity.id).await? {
                counts.add(application.status);
            }
            let views = views.get(&opportunity.id).copied().unwrap_or(0);

            totals.opportunities += 1;
            if opportunity.status == OpportunityStatus::Open {
                totals.open_opportunities += 1;
            }
            totals.total_seats += opportunity.total_seats as i64;
            totals.filled_seats += opportunity.filled_seats as i64;
            totals.pending_applications += counts.pending;
            totals.views += views;

            summaries.push(OpportunitySummary {
                opportunity,
                applications: counts,
                views,
            });
        }

        Ok(OrganizationDashboard {
            opportunities: summaries,
            totals,
        })
    }
}
