//! Response DTOs
//!
//! Data structures for API response bodies. Snowflake ids are rendered as
//! strings and timestamps as RFC 3339.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::services::{
    ApplicantEntry, FeedbackSummary, LoginOutcome, OnboardingStatus, OrganizationDashboard,
    OrganizationTotals, StatusCounts, VolunteerApplicationEntry, VolunteerDashboard,
};
use crate::domain::{Application, Feedback, Opportunity, UserProfile};

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

/// Own profile response
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub role: Option<String>,
    pub organization_name: Option<String>,
    pub website: Option<String>,
    pub profile_complete: bool,
    pub missing_fields: Vec<&'static str>,
    pub last_login_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserProfile> for ProfileResponse {
    fn from(user: UserProfile) -> Self {
        Self {
            profile_complete: user.is_profile_complete(),
            missing_fields: user.missing_fields(),
            role: user.role.map(|r| r.as_str().to_string()),
            last_login_at: user.last_login_at.map(rfc3339),
            created_at: rfc3339(user.created_at),
            updated_at: rfc3339(user.updated_at),
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            phone: user.phone,
            location: user.location,
            bio: user.bio,
            skills: user.skills,
            organization_name: user.organization_name,
            website: user.website,
        }
    }
}

/// Profile as seen by other users; contact details are omitted
#[derive(Debug, Serialize)]
pub struct PublicProfileResponse {
    pub id: String,
    pub display_name: Option<String>,
    pub role: Option<String>,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub location: Option<String>,
    pub organization_name: Option<String>,
    pub website: Option<String>,
}

impl From<UserProfile> for PublicProfileResponse {
    fn from(user: UserProfile) -> Self {
        Self {
            role: user.role.map(|r| r.as_str().to_string()),
            id: user.id,
            display_name: user.display_name,
            bio: user.bio,
            skills: user.skills,
            location: user.location,
            organization_name: user.organization_name,
            website: user.website,
        }
    }
}

/// Onboarding gate
#[derive(Debug, Serialize)]
pub struct OnboardingResponse {
    pub role: Option<String>,
    pub profile_complete: bool,
    pub missing_fields: Vec<&'static str>,
    pub redirect: &'static str,
}

impl From<OnboardingStatus> for OnboardingResponse {
    fn from(status: OnboardingStatus) -> Self {
        Self {
            role: status.role.map(|r| r.as_str().to_string()),
            profile_complete: status.profile_complete,
            missing_fields: status.missing_fields,
            redirect: status.redirect,
        }
    }
}

/// Result of the sign-in bookkeeping call
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub created: bool,
    pub welcome_email_sent: bool,
    pub onboarding: OnboardingResponse,
    pub profile: ProfileResponse,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            created: outcome.created,
            welcome_email_sent: outcome.welcome_email_sent,
            onboarding: OnboardingStatus::for_profile(&outcome.profile).into(),
            profile: outcome.profile.into(),
        }
    }
}

/// Opportunity response
#[derive(Debug, Serialize)]
pub struct OpportunityResponse {
    pub id: String,
    pub organization_id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub category: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub total_seats: i32,
    pub filled_seats: i32,
    pub remaining_seats: i32,
    pub status: String,
    pub accepting_applications: bool,
    pub withdrawal_deadline: String,
    pub created_at: String,
    pub updated_at: String,
}

impl OpportunityResponse {
    pub fn from_opportunity(opportunity: Opportunity, withdrawal_cutoff_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            id: opportunity.id.to_string(),
            remaining_seats: opportunity.remaining_seats(),
            accepting_applications: opportunity.is_accepting_applications(now),
            withdrawal_deadline: rfc3339(opportunity.withdrawal_deadline(withdrawal_cutoff_hours)),
            status: opportunity.status.as_str().to_string(),
            start_time: rfc3339(opportunity.start_time),
            end_time: rfc3339(opportunity.end_time),
            created_at: rfc3339(opportunity.created_at),
            updated_at: rfc3339(opportunity.updated_at),
            organization_id: opportunity.organization_id,
            title: opportunity.title,
            description: opportunity.description,
            location: opportunity.location,
            category: opportunity.category,
            total_seats: opportunity.total_seats,
            filled_seats: opportunity.filled_seats,
        }
    }
}

/// Application response
#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub id: String,
    pub opportunity_id: String,
    pub volunteer_id: String,
    pub organization_id: String,
    pub message: Option<String>,
    pub status: String,
    pub applied_at: String,
    pub updated_at: String,
    pub decided_at: Option<String>,
}

impl From<Application> for ApplicationResponse {
    fn from(application: Application) -> Self {
        Self {
            id: application.id,
            opportunity_id: application.opportunity_id.to_string(),
            volunteer_id: application.volunteer_id,
            organization_id: application.organization_id,
            message: application.message,
            status: application.status.as_str().to_string(),
            applied_at: rfc3339(application.applied_at),
            updated_at: rfc3339(application.updated_at),
            decided_at: application.decided_at.map(rfc3339),
        }
    }
}

/// An application as listed for the opportunity owner
#[derive(Debug, Serialize)]
pub struct ApplicantResponse {
    #[serde(flatten)]
    pub application: ApplicationResponse,
    pub volunteer: Option<PublicProfileResponse>,
}

impl From<ApplicantEntry> for ApplicantResponse {
    fn from(entry: ApplicantEntry) -> Self {
        Self {
            application: entry.application.into(),
            volunteer: entry.volunteer.map(Into::into),
        }
    }
}

/// An application as listed for the volunteer who made it
#[derive(Debug, Serialize)]
pub struct MyApplicationResponse {
    #[serde(flatten)]
    pub application: ApplicationResponse,
    pub can_withdraw: bool,
    pub opportunity: Option<OpportunityResponse>,
}

impl MyApplicationResponse {
    pub fn from_entry(entry: VolunteerApplicationEntry, withdrawal_cutoff_hours: i64) -> Self {
        let can_withdraw = entry.application.status.holds_seat()
            && entry
                .opportunity
                .as_ref()
                .is_some_and(|o| o.can_withdraw_at(Utc::now(), withdrawal_cutoff_hours));
        Self {
            application: entry.application.into(),
            can_withdraw,
            opportunity: entry
                .opportunity
                .map(|o| OpportunityResponse::from_opportunity(o, withdrawal_cutoff_hours)),
        }
    }
}

/// Feedback entry
#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub id: String,
    pub opportunity_id: String,
    pub volunteer_id: String,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: String,
}

impl From<Feedback> for FeedbackResponse {
    fn from(feedback: Feedback) -> Self {
        Self {
            id: feedback.id,
            opportunity_id: feedback.opportunity_id.to_string(),
            volunteer_id: feedback.volunteer_id,
            rating: feedback.rating,
            comment: feedback.comment,
            created_at: rfc3339(feedback.created_at),
        }
    }
}

/// Feedback for one opportunity
#[derive(Debug, Serialize)]
pub struct FeedbackListResponse {
    pub opportunity_id: String,
    pub average_rating: Option<f64>,
    pub count: usize,
    pub feedback: Vec<FeedbackResponse>,
}

impl From<FeedbackSummary> for FeedbackListResponse {
    fn from(summary: FeedbackSummary) -> Self {
        Self {
            opportunity_id: summary.opportunity_id.to_string(),
            average_rating: summary.average_rating,
            count: summary.entries.len(),
            feedback: summary.entries.into_iter().map(Into::into).collect(),
        }
    }
}

/// Application counts by status
#[derive(Debug, Serialize)]
pub struct StatusCountsResponse {
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub withdrawn: usize,
    pub total: usize,
}

impl From<StatusCounts> for StatusCountsResponse {
    fn from(counts: StatusCounts) -> Self {
        Self {
            total: counts.total(),
            pending: counts.pending,
            accepted: counts.accepted,
            rejected: counts.rejected,
            withdrawn: counts.withdrawn,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VolunteerDashboardResponse {
    pub applications: StatusCountsResponse,
    pub upcoming: Vec<OpportunityResponse>,
    pub completed_count: usize,
    pub feedback_given: usize,
}

impl VolunteerDashboardResponse {
    pub fn from_dashboard(dashboard: VolunteerDashboard, withdrawal_cutoff_hours: i64) -> Self {
        Self {
            applications: dashboard.applications.into(),
            upcoming: dashboard
                .upcoming
                .into_iter()
                .map(|o| OpportunityResponse::from_opportunity(o, withdrawal_cutoff_hours))
                .collect(),
            completed_count: dashboard.completed_count,
            feedback_given: dashboard.feedback_given,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OpportunitySummaryResponse {
    pub opportunity: OpportunityResponse,
    pub applications: StatusCountsResponse,
    pub views: i64,
}

#[derive(Debug, Serialize)]
pub struct OrganizationTotalsResponse {
    pub opportunities: usize,
    pub open_opportunities: usize,
    pub total_seats: i64,
    pub filled_seats: i64,
    pub remaining_seats: i64,
    pub pending_applications: usize,
    pub views: i64,
    pub applications_received: i64,
}

impl From<OrganizationTotals> for OrganizationTotalsResponse {
    fn from(totals: OrganizationTotals) -> Self {
        Self {
            remaining_seats: (totals.total_seats - totals.filled_seats).max(0),
            opportunities: totals.opportunities,
            open_opportunities: totals.open_opportunities,
            total_seats: totals.total_seats,
            filled_seats: totals.filled_seats,
            pending_applications: totals.pending_applications,
            views: totals.views,
            applications_received: totals.applications_received,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrganizationDashboardResponse {
    pub opportunities: Vec<OpportunitySummaryResponse>,
    pub totals: OrganizationTotalsResponse,
}

impl OrganizationDashboardResponse {
    pub fn from_dashboard(dashboard: OrganizationDashboard, withdrawal_cutoff_hours: i64) -> Self {
        Self {
            opportunities: dashboard
                .opportunities
                .into_iter()
                .map(|summary| OpportunitySummaryResponse {
                    opportunity: OpportunityResponse::from_opportunity(
                        summary.opportunity,
                        withdrawal_cutoff_hours,
                    ),
                    applications: summary.applications.into(),
                    views: summary.views,
                })
                .collect(),
            totals: dashboard.totals.into(),
        }
    }
}
