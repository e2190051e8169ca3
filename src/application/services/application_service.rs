//! Application Service
//!
//! The application lifecycle: submit, withdraw, accept and reject, with the
//! seat counter kept in step with every transition.
//!
//! Seat bookkeeping relies on the store's atomic primitives. A seat is taken
//! with a conditional increment before the application row is written and
//! handed back with a clamped decrement whenever an application stops
//! holding one (rejected, withdrawn, or a lost duplicate race).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use super::analytics_recorder::AnalyticsRecorder;
use super::notification::NotificationService;
use crate::domain::{
    AnalyticsCounter, Application, ApplicationKey, ApplicationRepository, ApplicationStatus,
    CounterScope, Opportunity, OpportunityRepository, OpportunityStatus, UserProfile,
    UserRepository,
};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

/// Application service trait
#[async_trait]
pub trait ApplicationService: Send + Sync {
    /// Apply to an opportunity as a volunteer
    async fn submit_application(
        &self,
        opportunity_id: i64,
        volunteer_id: &str,
        message: Option<String>,
    ) -> Result<Application, ApplicationError>;

    /// Withdraw the caller's application
    async fn withdraw_application(
        &self,
        opportunity_id: i64,
        volunteer_id: &str,
    ) -> Result<Application, ApplicationError>;

    /// Accept a pending application (opportunity owner only)
    async fn accept_application(
        &self,
        application_id: &str,
        organization_id: &str,
    ) -> Result<Application, ApplicationError>;

    /// Reject a pending or accepted application (opportunity owner only)
    async fn reject_application(
        &self,
        application_id: &str,
        organization_id: &str,
    ) -> Result<Application, ApplicationError>;

    /// Applications to one opportunity, with applicant profiles (owner only)
    async fn list_for_opportunity(
        &self,
        opportunity_id: i64,
        organization_id: &str,
    ) -> Result<Vec<ApplicantEntry>, ApplicationError>;

    /// The caller's own applications, with their opportunities
    async fn list_for_volunteer(
        &self,
        volunteer_id: &str,
    ) -> Result<Vec<VolunteerApplicationEntry>, ApplicationError>;
}

#[derive(Debug, Clone)]
pub struct ApplicantEntry {
    pub application: Application,
    pub volunteer: Option<UserProfile>,
}

#[derive(Debug, Clone)]
pub struct VolunteerApplicationEntry {
    pub application: Application,
    pub opportunity: Option<Opportunity>,
}

/// Application service errors
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("Profile not found")]
    ProfileNotFound,

    #[error("Only volunteers can apply to opportunities")]
    NotVolunteer,

    #[error("Complete your profile first (missing: {})", .0.join(", "))]
    ProfileIncomplete(Vec<&'static str>),

    #[error("You do not own this opportunity")]
    NotOwner,

    #[error("Opportunity not found")]
    OpportunityNotFound,

    #[error("Application not found")]
    ApplicationNotFound,

    #[error("Opportunity is not accepting applications")]
    OpportunityClosed,

    #[error("Opportunity has already started")]
    AlreadyStarted,

    #[error("Opportunity is full")]
    Full,

    #[error("You have already applied to this opportunity")]
    AlreadyApplied,

    #[error("Cannot move application from {from} to {to}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },

    #[error("Withdrawals closed at {deadline}")]
    WithdrawalWindowClosed { deadline: DateTime<Utc> },

    #[error("{0}")]
    Store(#[from] AppError),
}

impl From<ApplicationError> for AppError {
    fn from(err: ApplicationError) -> Self {
        use ApplicationError::*;
        match err {
            ProfileNotFound | NotVolunteer | ProfileIncomplete(_) | NotOwner => {
                AppError::Forbidden(err.to_string())
            }
            OpportunityNotFound | ApplicationNotFound => AppError::NotFound(err.to_string()),
            OpportunityClosed | Full | AlreadyApplied | InvalidTransition { .. } => {
                AppError::Conflict(err.to_string())
            }
            AlreadyStarted | WithdrawalWindowClosed { .. } => AppError::BadRequest(err.to_string()),
            Store(e) => e,
        }
    }
}

/// ApplicationService implementation
pub struct ApplicationServiceImpl<A, O, U>
where
    A: ApplicationRepository + ?Sized,
    O: OpportunityRepository + ?Sized,
    U: UserRepository + ?Sized,
{
    application_repo: Arc<A>,
    opportunity_repo: Arc<O>,
    user_repo: Arc<U>,
    notifications: NotificationService,
    analytics: AnalyticsRecorder,
    withdrawal_cutoff_hours: i64,
}

impl<A, O, U> ApplicationServiceImpl<A, O, U>
where
    A: ApplicationRepository + ?Sized,
    O: OpportunityRepository + ?Sized,
    U: UserRepository + ?Sized,
{
    pub fn new(
        application_repo: Arc<A>,
        opportunity_repo: Arc<O>,
        user_repo: Arc<U>,
        notifications: NotificationService,
        analytics: AnalyticsRecorder,
        withdrawal_cutoff_hours: i64,
    ) -> Self {
        Self {
            application_repo,
            opportunity_repo,
            user_repo,
            notifications,
            analytics,
            withdrawal_cutoff_hours,
        }
    }

    async fn load_opportunity(&self, id: i64) -> Result<Opportunity, ApplicationError> {
        self.opportunity_repo
            .find_by_id(id)
            .await?
            .ok_or(ApplicationError::OpportunityNotFound)
    }

    async fn load_application(&self, id: &str) -> Result<Application, ApplicationError> {
        self.application_repo
            .find_by_id(id)
            .await?
            .ok_or(ApplicationError::ApplicationNotFound)
    }

    /// The caller must be a volunteer whose profile is complete.
    async fn require_volunteer(&self, user_id: &str) -> Result<UserProfile, ApplicationError> {
        let profile = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(ApplicationError::ProfileNotFound)?;

        if !profile.is_volunteer() {
            return Err(ApplicationError::NotVolunteer);
        }
        let missing = profile.missing_fields();
        if !missing.is_empty() {
            return Err(ApplicationError::ProfileIncomplete(missing));
        }
        Ok(profile)
    }

    fn check_accepting(opportunity: &Opportunity, now: DateTime<Utc>) -> Result<(), ApplicationError> {
        if opportunity.status != OpportunityStatus::Open {
            return Err(ApplicationError::OpportunityClosed);
        }
        if opportunity.has_started(now) {
            return Err(ApplicationError::AlreadyStarted);
        }
        if opportunity.is_full() {
            return Err(ApplicationError::Full);
        }
        Ok(())
    }

    /// Take one seat, mapping a refused increment to the reason it was refused.
    async fn reserve_seat(&self, opportunity_id: i64) -> Result<(), ApplicationError> {
        if self.opportunity_repo.reserve_seat(opportunity_id).await? {
            return Ok(());
        }
        let current = self.load_opportunity(opportunity_id).await?;
        Self::check_accepting(&current, Utc::now())?;
        Err(ApplicationError::Full)
    }

    async fn release_seat(&self, opportunity_id: i64) {
        if let Err(e) = self.opportunity_repo.release_seat(opportunity_id).await {
            warn!(opportunity_id, error = %e, "Failed to release seat");
        }
    }

    /// Load an application together with its opportunity, checking ownership.
    async fn load_owned(
        &self,
        application_id: &str,
        organization_id: &str,
    ) -> Result<(Application, Opportunity), ApplicationError> {
        let application = self.load_application(application_id).await?;
        let opportunity = self.load_opportunity(application.opportunity_id).await?;
        if opportunity.organization_id != organization_id {
            return Err(ApplicationError::NotOwner);
        }
        Ok((application, opportunity))
    }

    /// Compare-and-set transition; a lost race reports the status that won.
    async fn transition(
        &self,
        application: &Application,
        expected: &[ApplicationStatus],
        next: ApplicationStatus,
        message: Option<String>,
    ) -> Result<Application, ApplicationError> {
        if !application.status.can_transition_to(next) {
            return Err(ApplicationError::InvalidTransition {
                from: application.status,
                to: next,
            });
        }

        match self
            .application_repo
            .transition(&application.id, expected, next, message)
            .await?
        {
            Some(updated) => Ok(updated),
            None => {
                let current = self.load_application(&application.id).await?;
                Err(ApplicationError::InvalidTransition {
                    from: current.status,
                    to: next,
                })
            }
        }
    }

    async fn record_event(
        &self,
        event: &'static str,
        make: fn(CounterScope) -> AnalyticsCounter,
        application: &Application,
    ) {
        metrics::record_domain_event(event);
        self.analytics
            .record_all(AnalyticsCounter::application_fanout(
                make,
                &application.organization_id,
                application.opportunity_id,
            ))
            .await;
    }

    async fn find_profile(&self, user_id: &str) -> Option<UserProfile> {
        match self.user_repo.find_by_id(user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(user_id, error = %e, "Failed to load profile for notification");
                None
            }
        }
    }

    /// Re-read the opportunity so emails report the current seat count.
    async fn refreshed(&self, opportunity: Opportunity) -> Opportunity {
        match self.opportunity_repo.find_by_id(opportunity.id).await {
            Ok(Some(current)) => current,
            _ => opportunity,
        }
    }
}

#[async_trait]
impl<A, O, U> ApplicationService for ApplicationServiceImpl<A, O, U>
where
    A: ApplicationRepository + ?Sized + 'static,
    O: OpportunityRepository + ?Sized + 'static,
    U: UserRepository + ?Sized + 'static,
{
    #[instrument(skip(self, message))]
    async fn submit_application(
        &self,
        opportunity_id: i64,
        volunteer_id: &str,
        message: Option<String>,
    ) -> Result<Application, ApplicationError> {
        let volunteer = self.require_volunteer(volunteer_id).await?;
        let opportunity = self.load_opportunity(opportunity_id).await?;
        Self::check_accepting(&opportunity, Utc::now())?;

        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        let key = ApplicationKey::new(opportunity_id, volunteer_id).to_string();

        let application = match self.application_repo.find_by_id(&key).await? {
            Some(existing) if existing.status == ApplicationStatus::Withdrawn => {
                self.reserve_seat(opportunity_id).await?;
                match self
                    .application_repo
                    .transition(
                        &key,
                        &[ApplicationStatus::Withdrawn],
                        ApplicationStatus::Pending,
                        message.clone(),
                    )
                    .await
                {
                    Ok(Some(reopened)) => {
                        info!(application_id = %key, "Withdrawn application reopened");
                        reopened
                    }
                    Ok(None) => {
                        self.release_seat(opportunity_id).await;
                        return Err(ApplicationError::AlreadyApplied);
                    }
                    Err(e) => {
                        self.release_seat(opportunity_id).await;
                        return Err(e.into());
                    }
                }
            }
            Some(_) => return Err(ApplicationError::AlreadyApplied),
            None => {
                self.reserve_seat(opportunity_id).await?;
                let candidate = Application::new(
                    opportunity_id,
                    volunteer_id,
                    opportunity.organization_id.clone(),
                    message.clone(),
                );
                match self.application_repo.create(&candidate).await {
                    Ok(created) => created,
                    Err(AppError::Conflict(_)) => {
                        self.release_seat(opportunity_id).await;
                        return Err(ApplicationError::AlreadyApplied);
                    }
                    Err(e) => {
                        self.release_seat(opportunity_id).await;
                        return Err(e.into());
                    }
                }
            }
        };

        info!(application_id = %application.id, "Application submitted");
        self.record_event(
            "application_submitted",
            AnalyticsCounter::ApplicationsSubmitted,
            &application,
        )
        .await;

        let opportunity = self.refreshed(opportunity).await;
        self.notifications
            .application_received(&volunteer, &opportunity)
            .await;
        if let Some(organization) = self.find_profile(&opportunity.organization_id).await {
            self.notifications
                .new_application(&organization, &volunteer, &opportunity, message.as_deref())
                .await;
        }

        Ok(application)
    }

    #[instrument(skip(self))]
    async fn withdraw_application(
        &self,
        opportunity_id: i64,
        volunteer_id: &str,
    ) -> Result<Application, ApplicationError> {
        let key = ApplicationKey::new(opportunity_id, volunteer_id).to_string();
        let application = self.load_application(&key).await?;
        if application.volunteer_id != volunteer_id {
            return Err(ApplicationError::ApplicationNotFound);
        }
        if !application.status.holds_seat() {
            return Err(ApplicationError::InvalidTransition {
                from: application.status,
                to: ApplicationStatus::Withdrawn,
            });
        }

        let opportunity = self.load_opportunity(opportunity_id).await?;
        if !opportunity.can_withdraw_at(Utc::now(), self.withdrawal_cutoff_hours) {
            return Err(ApplicationError::WithdrawalWindowClosed {
                deadline: opportunity.withdrawal_deadline(self.withdrawal_cutoff_hours),
            });
        }

        let withdrawn = self
            .transition(
                &application,
                &[ApplicationStatus::Pending, ApplicationStatus::Accepted],
                ApplicationStatus::Withdrawn,
                None,
            )
            .await?;
        self.release_seat(opportunity_id).await;

        info!(application_id = %withdrawn.id, "Application withdrawn");
        self.record_event(
            "application_withdrawn",
            AnalyticsCounter::ApplicationsWithdrawn,
            &withdrawn,
        )
        .await;

        let opportunity = self.refreshed(opportunity).await;
        if let (Some(organization), Some(volunteer)) = (
            self.find_profile(&opportunity.organization_id).await,
            self.find_profile(volunteer_id).await,
        ) {
            self.notifications
                .application_withdrawn(&organization, &volunteer, &opportunity)
                .await;
        }

        Ok(withdrawn)
    }

    #[instrument(skip(self))]
    async fn accept_application(
        &self,
        application_id: &str,
        organization_id: &str,
    ) -> Result<Application, ApplicationError> {
        let (application, opportunity) = self.load_owned(application_id, organization_id).await?;

        let accepted = self
            .transition(
                &application,
                &[ApplicationStatus::Pending],
                ApplicationStatus::Accepted,
                None,
            )
            .await?;

        info!(application_id, "Application accepted");
        self.record_event(
            "application_accepted",
            AnalyticsCounter::ApplicationsAccepted,
            &accepted,
        )
        .await;

        if let Some(volunteer) = self.find_profile(&accepted.volunteer_id).await {
            self.notifications
                .application_accepted(&volunteer, &opportunity)
                .await;
        }

        Ok(accepted)
    }

    #[instrument(skip(self))]
    async fn reject_application(
        &self,
        application_id: &str,
        organization_id: &str,
    ) -> Result<Application, ApplicationError> {
        let (application, opportunity) = self.load_owned(application_id, organization_id).await?;

        let rejected = self
            .transition(
                &application,
                &[ApplicationStatus::Pending, ApplicationStatus::Accepted],
                ApplicationStatus::Rejected,
                None,
            )
            .await?;
        self.release_seat(rejected.opportunity_id).await;

        info!(application_id, "Application rejected");
        self.record_event(
            "application_rejected",
            AnalyticsCounter::ApplicationsRejected,
            &rejected,
        )
        .await;

        if let Some(volunteer) = self.find_profile(&rejected.volunteer_id).await {
            self.notifications
                .application_rejected(&volunteer, &opportunity)
                .await;
        }

        Ok(rejected)
    }

    async fn list_for_opportunity(
        &self,
        opportunity_id: i64,
        organization_id: &str,
    ) -> Result<Vec<ApplicantEntry>, ApplicationError> {
        let opportunity = self.load_opportunity(opportunity_id).await?;
        if opportunity.organization_id != organization_id {
            return Err(ApplicationError::NotOwner);
        }

        let applications = self
            .application_repo
            .find_by_opportunity(opportunity_id)
            .await?;

        let mut entries = Vec::with_capacity(applications.len());
        for application in applications {
            let volunteer = self.user_repo.find_by_id(&application.volunteer_id).await?;
            entries.push(ApplicantEntry {
                application,
                volunteer,
            });
        }
        Ok(entries)
    }

    async fn list_for_volunteer(
        &self,
        volunteer_id: &str,
    ) -> Result<Vec<VolunteerApplicationEntry>, ApplicationError> {
        let applications = self.application_repo.find_by_volunteer(volunteer_id).await?;
        let ids: Vec<i64> = applications.iter().map(|a| a.opportunity_id).collect();
        let opportunities = self.opportunity_repo.find_by_ids(&ids).await?;

        Ok(applications
            .into_iter()
            .map(|application| {
                let opportunity = opportunities
                    .iter()
                    .find(|o| o.id == application.opportunity_id)
                    .cloned();
                VolunteerApplicationEntry {
                    application,
                    opportunity,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::{opportunity, organization, seed, volunteer};
    use crate::domain::AnalyticsRepository;
    use crate::infrastructure::cache::MemoryAnalyticsStore;
    use crate::infrastructure::email::{MailError, Mailer, MockMailer, OutboxMailer};
    use crate::infrastructure::repositories::MemoryStore;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    type Service = ApplicationServiceImpl<MemoryStore, MemoryStore, MemoryStore>;

    struct Harness {
        store: Arc<MemoryStore>,
        outbox: Arc<OutboxMailer>,
        counters: Arc<MemoryAnalyticsStore>,
        service: Service,
    }

    fn build(store: Arc<MemoryStore>, mailer: Arc<dyn Mailer>, counters: Arc<MemoryAnalyticsStore>) -> Service {
        ApplicationServiceImpl::new(
            store.clone(),
            store.clone(),
            store,
            NotificationService::new(mailer, "http://localhost:5173"),
            AnalyticsRecorder::new(counters),
            12,
        )
    }

    /// One organization owning opportunity 1 (starts in 3 days) and
    /// opportunity 2 (starts in 6 hours), plus three complete volunteers.
    async fn harness(seats: i32) -> Harness {
        let store = Arc::new(MemoryStore::new());
        seed(
            &store,
            &[organization("org-1"), volunteer("v1"), volunteer("v2"), volunteer("v3")],
            &[
                opportunity(1, "org-1", Duration::days(3), seats),
                opportunity(2, "org-1", Duration::hours(6), seats),
            ],
        )
        .await;

        let outbox = Arc::new(OutboxMailer::new());
        let counters = Arc::new(MemoryAnalyticsStore::new());
        let service = build(store.clone(), outbox.clone(), counters.clone());
        Harness {
            store,
            outbox,
            counters,
            service,
        }
    }

    async fn filled(store: &MemoryStore, id: i64) -> i32 {
        OpportunityRepository::find_by_id(store, id)
            .await
            .unwrap()
            .unwrap()
            .filled_seats
    }

    #[tokio::test]
    async fn test_submit_reserves_seat_and_notifies_both_sides() {
        let h = harness(3).await;

        let application = h
            .service
            .submit_application(1, "v1", Some("  Happy to help  ".into()))
            .await
            .unwrap();

        assert_eq!(application.id, "1_v1");
        assert_eq!(application.status, ApplicationStatus::Pending);
        assert_eq!(application.organization_id, "org-1");
        assert_eq!(application.message.as_deref(), Some("Happy to help"));
        assert_eq!(filled(&h.store, 1).await, 1);

        assert_eq!(h.outbox.messages_to("v1@example.com").len(), 1);
        let to_org = h.outbox.messages_to("org-1@example.org");
        assert_eq!(to_org.len(), 1);
        assert!(to_org[0].text.contains("Happy to help"));
        assert!(to_org[0].text.contains("1 of 3 seats"));

        let counts = h
            .counters
            .get_many(&[
                AnalyticsCounter::ApplicationsSubmitted(CounterScope::Global).key(),
                AnalyticsCounter::ApplicationsSubmitted(CounterScope::Organization("org-1".into())).key(),
                AnalyticsCounter::ApplicationsSubmitted(CounterScope::Opportunity(1)).key(),
            ])
            .await
            .unwrap();
        assert_eq!(counts, vec![1, 1, 1]);
    }

    #[tokio::test]
    async fn test_duplicate_application_rejected() {
        let h = harness(3).await;
        h.service.submit_application(1, "v1", None).await.unwrap();

        let err = h.service.submit_application(1, "v1", None).await.unwrap_err();
        assert!(matches!(err, ApplicationError::AlreadyApplied));
        assert_eq!(filled(&h.store, 1).await, 1);
        assert!(matches!(AppError::from(err), AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_full_opportunity_rejects_new_applicants() {
        let h = harness(1).await;
        h.service.submit_application(1, "v1", None).await.unwrap();

        let err = h.service.submit_application(1, "v2", None).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Full));
        assert_eq!(filled(&h.store, 1).await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_never_overfill() {
        let h = harness(2).await;
        let service = Arc::new(h.service);

        let mut handles = Vec::new();
        for id in ["v1", "v2", "v3"] {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service.submit_application(1, id, None).await.is_ok()
            }));
        }
        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 2);
        assert_eq!(filled(&h.store, 1).await, 2);
    }

    #[tokio::test]
    async fn test_closed_opportunity_rejects_applications() {
        let h = harness(3).await;
        h.store
            .set_status(1, &[OpportunityStatus::Open], OpportunityStatus::Closed)
            .await
            .unwrap()
            .unwrap();

        let err = h.service.submit_application(1, "v1", None).await.unwrap_err();
        assert!(matches!(err, ApplicationError::OpportunityClosed));
    }

    #[tokio::test]
    async fn test_started_opportunity_rejects_applications() {
        let h = harness(3).await;
        let mut started = opportunity(9, "org-1", Duration::hours(-1), 3);
        started.end_time = Utc::now() + Duration::hours(1);
        OpportunityRepository::create(h.store.as_ref(), &started).await.unwrap();

        let err = h.service.submit_application(9, "v1", None).await.unwrap_err();
        assert!(matches!(err, ApplicationError::AlreadyStarted));
    }

    #[tokio::test]
    async fn test_organization_and_incomplete_profiles_cannot_apply() {
        let h = harness(3).await;

        let err = h.service.submit_application(1, "org-1", None).await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotVolunteer));

        let mut incomplete = volunteer("v9");
        incomplete.location = None;
        UserRepository::create(h.store.as_ref(), &incomplete).await.unwrap();
        let err = h.service.submit_application(1, "v9", None).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ProfileIncomplete(ref f) if f == &vec!["location"]));

        let err = h.service.submit_application(1, "ghost", None).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ProfileNotFound));
        assert_eq!(filled(&h.store, 1).await, 0);
    }

    #[tokio::test]
    async fn test_withdraw_releases_seat_and_notifies_organization() {
        let h = harness(3).await;
        h.service.submit_application(1, "v1", None).await.unwrap();

        let withdrawn = h.service.withdraw_application(1, "v1").await.unwrap();
        assert_eq!(withdrawn.status, ApplicationStatus::Withdrawn);
        assert_eq!(filled(&h.store, 1).await, 0);

        let to_org = h.outbox.messages_to("org-1@example.org");
        assert_eq!(to_org.len(), 2);
        assert!(to_org[1].subject.starts_with("Application withdrawn"));
    }

    #[tokio::test]
    async fn test_withdraw_blocked_inside_cutoff() {
        let h = harness(3).await;
        h.service.submit_application(2, "v1", None).await.unwrap();

        let err = h.service.withdraw_application(2, "v1").await.unwrap_err();
        assert!(matches!(err, ApplicationError::WithdrawalWindowClosed { .. }));
        assert_eq!(filled(&h.store, 2).await, 1);
        assert!(matches!(AppError::from(err), AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_withdraw_twice_is_invalid() {
        let h = harness(3).await;
        h.service.submit_application(1, "v1", None).await.unwrap();
        h.service.withdraw_application(1, "v1").await.unwrap();

        let err = h.service.withdraw_application(1, "v1").await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::InvalidTransition {
                from: ApplicationStatus::Withdrawn,
                ..
            }
        ));
        assert_eq!(filled(&h.store, 1).await, 0);
    }

    #[tokio::test]
    async fn test_withdraw_missing_application() {
        let h = harness(3).await;
        let err = h.service.withdraw_application(1, "v1").await.unwrap_err();
        assert!(matches!(err, ApplicationError::ApplicationNotFound));
    }

    #[tokio::test]
    async fn test_reapply_after_withdrawal_reopens() {
        let h = harness(3).await;
        h.service.submit_application(1, "v1", None).await.unwrap();
        h.service.withdraw_application(1, "v1").await.unwrap();

        let reopened = h
            .service
            .submit_application(1, "v1", Some("Back again".into()))
            .await
            .unwrap();
        assert_eq!(reopened.id, "1_v1");
        assert_eq!(reopened.status, ApplicationStatus::Pending);
        assert_eq!(reopened.message.as_deref(), Some("Back again"));
        assert_eq!(filled(&h.store, 1).await, 1);
    }

    #[tokio::test]
    async fn test_accept_then_reject_releases_seat() {
        let h = harness(3).await;
        h.service.submit_application(1, "v1", None).await.unwrap();

        let accepted = h.service.accept_application("1_v1", "org-1").await.unwrap();
        assert_eq!(accepted.status, ApplicationStatus::Accepted);
        assert!(accepted.decided_at.is_some());
        assert_eq!(filled(&h.store, 1).await, 1);

        let rejected = h.service.reject_application("1_v1", "org-1").await.unwrap();
        assert_eq!(rejected.status, ApplicationStatus::Rejected);
        assert_eq!(filled(&h.store, 1).await, 0);

        let err = h.service.accept_application("1_v1", "org-1").await.unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidTransition { .. }));

        // a rejected volunteer cannot re-apply
        let err = h.service.submit_application(1, "v1", None).await.unwrap_err();
        assert!(matches!(err, ApplicationError::AlreadyApplied));

        let volunteer_mail = h.outbox.messages_to("v1@example.com");
        assert_eq!(volunteer_mail.len(), 3);
        assert!(volunteer_mail[1].subject.starts_with("You're in"));
        assert!(volunteer_mail[2].subject.starts_with("Update on your application"));
    }

    #[tokio::test]
    async fn test_decisions_require_ownership() {
        let h = harness(3).await;
        UserRepository::create(h.store.as_ref(), &organization("org-2"))
            .await
            .unwrap();
        h.service.submit_application(1, "v1", None).await.unwrap();

        assert!(matches!(
            h.service.accept_application("1_v1", "org-2").await.unwrap_err(),
            ApplicationError::NotOwner
        ));
        assert!(matches!(
            h.service.reject_application("1_v1", "org-2").await.unwrap_err(),
            ApplicationError::NotOwner
        ));
        assert!(matches!(
            h.service.list_for_opportunity(1, "org-2").await.unwrap_err(),
            ApplicationError::NotOwner
        ));
        assert!(matches!(
            h.service.accept_application("1_nobody", "org-1").await.unwrap_err(),
            ApplicationError::ApplicationNotFound
        ));
    }

    #[tokio::test]
    async fn test_email_failure_does_not_fail_submission() {
        let h = harness(3).await;
        let mut mailer = MockMailer::new();
        mailer.expect_send().times(2).returning(|_| {
            Err(MailError::Rejected {
                status: 500,
                body: "provider down".into(),
            })
        });
        let service = build(h.store.clone(), Arc::new(mailer), h.counters.clone());

        let application = service.submit_application(1, "v1", None).await.unwrap();
        assert_eq!(application.status, ApplicationStatus::Pending);
        assert_eq!(filled(&h.store, 1).await, 1);
    }

    #[tokio::test]
    async fn test_listings() {
        let h = harness(3).await;
        h.service.submit_application(1, "v1", None).await.unwrap();
        h.service.submit_application(1, "v2", None).await.unwrap();
        h.service.submit_application(2, "v1", None).await.unwrap();

        let applicants = h.service.list_for_opportunity(1, "org-1").await.unwrap();
        assert_eq!(applicants.len(), 2);
        assert!(applicants.iter().all(|e| e.volunteer.is_some()));

        let mine = h.service.list_for_volunteer("v1").await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|e| e.opportunity.is_some()));
        assert!(h.service.list_for_volunteer("v3").await.unwrap().is_empty());
    }
}
