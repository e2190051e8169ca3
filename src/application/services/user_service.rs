//! User Service
//!
//! Profile management, first-login handling and onboarding gating.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument};

use super::analytics_recorder::AnalyticsRecorder;
use super::notification::NotificationService;
use crate::domain::{AnalyticsCounter, UserProfile, UserRepository, UserRole};
use crate::shared::error::AppError;

/// User service trait
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get the caller's own profile
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile, UserError>;

    /// Get another user's profile (public fields are selected by the caller)
    async fn get_public_profile(&self, user_id: &str) -> Result<UserProfile, UserError>;

    /// Apply a partial profile update
    async fn update_profile(
        &self,
        user_id: &str,
        update: UpdateProfileDto,
    ) -> Result<UserProfile, UserError>;

    /// Sign-in bookkeeping: create the profile, stamp the login, send the
    /// welcome email once
    async fn record_login(&self, identity: LoginIdentity) -> Result<LoginOutcome, UserError>;

    /// Where the client should send this user next
    async fn onboarding_status(&self, user_id: &str) -> Result<OnboardingStatus, UserError>;
}

/// Identity asserted by a verified token
#[derive(Debug, Clone)]
pub struct LoginIdentity {
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub profile: UserProfile,
    /// Profile was created by this call
    pub created: bool,
    /// Welcome email went out during this call
    pub welcome_email_sent: bool,
}

/// Partial profile update; `None` leaves a field untouched, an empty string clears it
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileDto {
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub role: Option<UserRole>,
    pub organization_name: Option<String>,
    pub website: Option<String>,
}

pub const ONBOARDING_ROLE_PATH: &str = "/onboarding/role";
pub const ONBOARDING_PROFILE_PATH: &str = "/onboarding/profile";
pub const VOLUNTEER_DASHBOARD_PATH: &str = "/dashboard/volunteer";
pub const ORGANIZATION_DASHBOARD_PATH: &str = "/dashboard/organization";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingStatus {
    pub role: Option<UserRole>,
    pub profile_complete: bool,
    pub missing_fields: Vec<&'static str>,
    pub redirect: &'static str,
}

impl OnboardingStatus {
    pub fn for_profile(profile: &UserProfile) -> Self {
        let missing_fields = profile.missing_fields();
        let redirect = match profile.role {
            None => ONBOARDING_ROLE_PATH,
            Some(_) if !missing_fields.is_empty() => ONBOARDING_PROFILE_PATH,
            Some(UserRole::Volunteer) => VOLUNTEER_DASHBOARD_PATH,
            Some(UserRole::Organization) => ORGANIZATION_DASHBOARD_PATH,
        };

        Self {
            role: profile.role,
            profile_complete: profile.is_profile_complete(),
            missing_fields,
            redirect,
        }
    }
}

/// User service errors
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("User not found")]
    NotFound,

    #[error("Role is already set to {0} and cannot be changed")]
    RoleAlreadySet(UserRole),

    #[error("{0}")]
    Store(#[from] AppError),
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => AppError::NotFound("User not found".into()),
            e @ UserError::RoleAlreadySet(_) => AppError::Conflict(e.to_string()),
            UserError::Store(e) => e,
        }
    }
}

/// Trimmed value, or `None` for blank input
fn normalize(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// UserService implementation
pub struct UserServiceImpl<U>
where
    U: UserRepository + ?Sized,
{
    user_repo: Arc<U>,
    notifications: NotificationService,
    analytics: AnalyticsRecorder,
}

impl<U> UserServiceImpl<U>
where
    U: UserRepository + ?Sized,
{
    pub fn new(
        user_repo: Arc<U>,
        notifications: NotificationService,
        analytics: AnalyticsRecorder,
    ) -> Self {
        Self {
            user_repo,
            notifications,
            analytics,
        }
    }

    async fn load(&self, user_id: &str) -> Result<UserProfile, UserError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound)
    }

    /// Fetch the profile, creating it from the token identity on first sight.
    async fn find_or_create(&self, identity: &LoginIdentity) -> Result<(UserProfile, bool), UserError> {
        if let Some(profile) = self.user_repo.find_by_id(&identity.uid).await? {
            return Ok((profile, false));
        }

        let profile = UserProfile::new(
            identity.uid.clone(),
            identity.email.clone(),
            identity.name.clone().and_then(normalize),
        );
        match self.user_repo.create(&profile).await {
            Ok(created) => {
                info!(uid = %created.id, "Profile created on first login");
                self.analytics.record(AnalyticsCounter::ProfilesCreated).await;
                Ok((created, true))
            }
            // concurrent first login already created it
            Err(AppError::Conflict(_)) => Ok((self.load(&identity.uid).await?, false)),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl<U> UserService for UserServiceImpl<U>
where
    U: UserRepository + ?Sized + 'static,
{
    async fn get_profile(&self, user_id: &str) -> Result<UserProfile, UserError> {
        self.load(user_id).await
    }

    async fn get_public_profile(&self, user_id: &str) -> Result<UserProfile, UserError> {
        self.load(user_id).await
    }

    #[instrument(skip(self, update))]
    async fn update_profile(
        &self,
        user_id: &str,
        update: UpdateProfileDto,
    ) -> Result<UserProfile, UserError> {
        let mut profile = self.load(user_id).await?;

        if let Some(role) = update.role {
            match profile.role {
                Some(current) if current != role => return Err(UserError::RoleAlreadySet(current)),
                _ => profile.role = Some(role),
            }
        }
        if let Some(display_name) = update.display_name {
            profile.display_name = normalize(display_name);
        }
        if let Some(phone) = update.phone {
            profile.phone = normalize(phone);
        }
        if let Some(location) = update.location {
            profile.location = normalize(location);
        }
        if let Some(bio) = update.bio {
            profile.bio = normalize(bio);
        }
        if let Some(skills) = update.skills {
            let mut skills: Vec<String> = skills.into_iter().filter_map(normalize).collect();
            skills.dedup();
            profile.skills = skills;
        }
        if let Some(organization_name) = update.organization_name {
            profile.organization_name = normalize(organization_name);
        }
        if let Some(website) = update.website {
            profile.website = normalize(website);
        }

        match self.user_repo.update(&profile).await {
            Ok(updated) => Ok(updated),
            // another request chose a different role after our read
            Err(AppError::Conflict(message)) => match self.load(user_id).await?.role {
                Some(current) => Err(UserError::RoleAlreadySet(current)),
                None => Err(AppError::Conflict(message).into()),
            },
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, identity), fields(uid = %identity.uid))]
    async fn record_login(&self, identity: LoginIdentity) -> Result<LoginOutcome, UserError> {
        let (_, created) = self.find_or_create(&identity).await?;
        self.user_repo
            .touch_last_login(&identity.uid, Utc::now())
            .await?;

        let mut welcome_email_sent = false;
        if self.user_repo.claim_welcome_email(&identity.uid).await? {
            let profile = self.load(&identity.uid).await?;
            if self.notifications.welcome(&profile).await {
                welcome_email_sent = true;
                self.analytics.record(AnalyticsCounter::WelcomeEmailsSent).await;
            } else {
                // next login retries
                self.user_repo.release_welcome_email(&identity.uid).await?;
            }
        }

        let mut profile = self.load(&identity.uid).await?;
        profile.welcome_email_sent |= welcome_email_sent;

        Ok(LoginOutcome {
            profile,
            created,
            welcome_email_sent,
        })
    }

    async fn onboarding_status(&self, user_id: &str) -> Result<OnboardingStatus, UserError> {
        let profile = self.load(user_id).await?;
        Ok(OnboardingStatus::for_profile(&profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cache::MemoryAnalyticsStore;
    use crate::infrastructure::email::{MailError, MockMailer, OutboxMailer};
    use crate::infrastructure::repositories::MemoryStore;
    use chrono::DateTime;
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::Name;
    use fake::Fake;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};
    use test_case::test_case;

    fn service_with(
        store: Arc<MemoryStore>,
        mailer: Arc<dyn crate::infrastructure::email::Mailer>,
    ) -> UserServiceImpl<MemoryStore> {
        UserServiceImpl::new(
            store,
            NotificationService::new(mailer, "http://localhost:5173"),
            AnalyticsRecorder::new(Arc::new(MemoryAnalyticsStore::new())),
        )
    }

    fn identity() -> LoginIdentity {
        LoginIdentity {
            uid: "uid-1".into(),
            email: SafeEmail().fake(),
            name: Some(Name().fake()),
        }
    }

    #[tokio::test]
    async fn test_first_login_creates_profile_and_sends_welcome_once() {
        let store = Arc::new(MemoryStore::new());
        let outbox = Arc::new(OutboxMailer::new());
        let service = service_with(store.clone(), outbox.clone());
        let identity = identity();

        let first = service.record_login(identity.clone()).await.unwrap();
        assert!(first.created);
        assert!(first.welcome_email_sent);
        assert!(first.profile.last_login_at.is_some());

        let second = service.record_login(identity.clone()).await.unwrap();
        assert!(!second.created);
        assert!(!second.welcome_email_sent);

        assert_eq!(outbox.messages_to(&identity.email).len(), 1);
    }

    #[tokio::test]
    async fn test_failed_welcome_email_is_retried_next_login() {
        let store = Arc::new(MemoryStore::new());

        let mut failing = MockMailer::new();
        failing.expect_send().times(1).returning(|_| {
            Err(MailError::Rejected {
                status: 500,
                body: "down".into(),
            })
        });
        let service = service_with(store.clone(), Arc::new(failing));
        let identity = identity();

        let outcome = service.record_login(identity.clone()).await.unwrap();
        assert!(!outcome.welcome_email_sent);
        assert!(!outcome.profile.welcome_email_sent);

        let outbox = Arc::new(OutboxMailer::new());
        let service = service_with(store, outbox.clone());
        let outcome = service.record_login(identity).await.unwrap();
        assert!(outcome.welcome_email_sent);
        assert_eq!(outbox.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_role_cannot_change_once_set() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(store, Arc::new(OutboxMailer::new()));
        service.record_login(identity()).await.unwrap();

        service
            .update_profile(
                "uid-1",
                UpdateProfileDto {
                    role: Some(UserRole::Volunteer),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // same role again is a no-op
        service
            .update_profile(
                "uid-1",
                UpdateProfileDto {
                    role: Some(UserRole::Volunteer),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = service
            .update_profile(
                "uid-1",
                UpdateProfileDto {
                    role: Some(UserRole::Organization),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::RoleAlreadySet(UserRole::Volunteer)));
    }

    /// First read returns the profile as it was before any role was chosen.
    struct StaleFirstRead(Arc<MemoryStore>, AtomicBool);

    #[async_trait]
    impl UserRepository for StaleFirstRead {
        async fn find_by_id(&self, id: &str) -> Result<Option<UserProfile>, AppError> {
            let found = UserRepository::find_by_id(self.0.as_ref(), id).await?;
            if self.1.swap(false, Ordering::SeqCst) {
                return Ok(found.map(|mut profile| {
                    profile.role = None;
                    profile
                }));
            }
            Ok(found)
        }

        async fn create(&self, user: &UserProfile) -> Result<UserProfile, AppError> {
            UserRepository::create(self.0.as_ref(), user).await
        }

        async fn update(&self, user: &UserProfile) -> Result<UserProfile, AppError> {
            UserRepository::update(self.0.as_ref(), user).await
        }

        async fn touch_last_login(&self, id: &str, at: DateTime<Utc>) -> Result<(), AppError> {
            self.0.touch_last_login(id, at).await
        }

        async fn claim_welcome_email(&self, id: &str) -> Result<bool, AppError> {
            self.0.claim_welcome_email(id).await
        }

        async fn release_welcome_email(&self, id: &str) -> Result<(), AppError> {
            self.0.release_welcome_email(id).await
        }
    }

    #[tokio::test]
    async fn test_role_chosen_concurrently_is_kept() {
        let store = Arc::new(MemoryStore::new());
        let mut profile = UserProfile::new("uid-1", "u@example.com", None);
        profile.role = Some(UserRole::Organization);
        UserRepository::create(store.as_ref(), &profile).await.unwrap();

        let service = UserServiceImpl::new(
            Arc::new(StaleFirstRead(store.clone(), AtomicBool::new(true))),
            NotificationService::new(Arc::new(OutboxMailer::new()), "http://localhost:5173"),
            AnalyticsRecorder::new(Arc::new(MemoryAnalyticsStore::new())),
        );
        let err = service
            .update_profile(
                "uid-1",
                UpdateProfileDto {
                    role: Some(UserRole::Volunteer),
                    phone: Some("555-0100".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::RoleAlreadySet(UserRole::Organization)));

        let stored = UserRepository::find_by_id(store.as_ref(), "uid-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.role, Some(UserRole::Organization));
        assert_eq!(stored.phone, None);
    }

    #[tokio::test]
    async fn test_update_profile_normalizes_blank_values() {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(store, Arc::new(OutboxMailer::new()));
        service.record_login(identity()).await.unwrap();

        let profile = service
            .update_profile(
                "uid-1",
                UpdateProfileDto {
                    phone: Some("  555-0100 ".into()),
                    bio: Some("   ".into()),
                    skills: Some(vec!["first aid".into(), " ".into(), "driving".into()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(profile.phone.as_deref(), Some("555-0100"));
        assert_eq!(profile.bio, None);
        assert_eq!(profile.skills, vec!["first aid", "driving"]);
    }

    #[tokio::test]
    async fn test_unknown_user_not_found() {
        let service = service_with(Arc::new(MemoryStore::new()), Arc::new(OutboxMailer::new()));
        assert!(matches!(
            service.get_profile("nobody").await.unwrap_err(),
            UserError::NotFound
        ));
    }

    #[test_case(None, None, None, ONBOARDING_ROLE_PATH ; "no role")]
    #[test_case(Some(UserRole::Volunteer), None, None, ONBOARDING_PROFILE_PATH ; "volunteer missing location")]
    #[test_case(Some(UserRole::Volunteer), Some("Austin"), None, VOLUNTEER_DASHBOARD_PATH ; "complete volunteer")]
    #[test_case(Some(UserRole::Organization), None, None, ONBOARDING_PROFILE_PATH ; "organization missing name")]
    #[test_case(Some(UserRole::Organization), None, Some("Food Bank"), ORGANIZATION_DASHBOARD_PATH ; "complete organization")]
    fn test_onboarding_redirects(
        role: Option<UserRole>,
        location: Option<&str>,
        organization_name: Option<&str>,
        expected: &str,
    ) {
        let mut profile = UserProfile::new("u", "u@example.com", Some("Pat".into()));
        profile.phone = Some("555".into());
        profile.role = role;
        profile.location = location.map(String::from);
        profile.organization_name = organization_name.map(String::from);

        let status = OnboardingStatus::for_profile(&profile);
        assert_eq!(status.redirect, expected);
        assert_eq!(status.profile_complete, status.missing_fields.is_empty() && role.is_some());
    }

    #[test]
    fn test_onboarding_lists_missing_fields() {
        let mut profile = UserProfile::new("u", "u@example.com", None);
        profile.role = Some(UserRole::Volunteer);

        let status = OnboardingStatus::for_profile(&profile);
        assert_eq!(status.missing_fields, vec!["display_name", "phone", "location"]);
        assert!(!status.profile_complete);
    }
}
