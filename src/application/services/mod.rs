//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **UserService**: Profiles, first-login handling, onboarding gating
//! - **OpportunityService**: Posting and managing opportunities
//! - **ApplicationService**: Apply / accept / reject / withdraw with seat bookkeeping
//! - **FeedbackService**: Post-event ratings
//! - **DashboardService**: Volunteer and organization aggregates
//! - **NotificationService**: Transactional email
//!
//! Each service has its own error enum, converted into `AppError` at the
//! handler edge.

pub mod analytics_recorder;
pub mod application_service;
pub mod dashboard_service;
pub mod feedback_service;
pub mod notification;
pub mod opportunity_service;
pub mod user_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use analytics_recorder::AnalyticsRecorder;
pub use notification::NotificationService;

pub use user_service::{
    LoginIdentity, LoginOutcome, OnboardingStatus, UpdateProfileDto, UserError, UserService,
    UserServiceImpl,
};

pub use opportunity_service::{
    CreateOpportunityDto, ListOpportunitiesQuery, OpportunityError, OpportunityService,
    OpportunityServiceImpl, UpdateOpportunityDto,
};

pub use application_service::{
    ApplicantEntry, ApplicationError, ApplicationService, ApplicationServiceImpl,
    VolunteerApplicationEntry,
};

pub use feedback_service::{FeedbackError, FeedbackService, FeedbackServiceImpl, FeedbackSummary};

pub use dashboard_service::{
    DashboardError, DashboardService, DashboardServiceImpl, OrganizationDashboard,
    OrganizationTotals, OpportunitySummary, StatusCounts, VolunteerDashboard,
};
