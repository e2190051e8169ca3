//! User profile entity and repository trait.
//!
//! Maps to the `users` table in the database schema. The primary key is the
//! identity provider's subject (`uid`), not a generated id.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Role chosen by the user during onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Volunteer,
    Organization,
}

impl UserRole {
    /// Parse the database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "volunteer" => Some(Self::Volunteer),
            "organization" => Some(Self::Organization),
            _ => None,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Volunteer => "volunteer",
            Self::Organization => "organization",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user profile.
///
/// Maps to the `users` table:
/// - id: TEXT PRIMARY KEY (identity provider uid)
/// - email: TEXT NOT NULL
/// - display_name, phone, location, bio: TEXT NULL
/// - skills: TEXT[] NOT NULL DEFAULT '{}'
/// - role: VARCHAR(20) NULL ('volunteer' | 'organization')
/// - organization_name, website: TEXT NULL
/// - welcome_email_sent: BOOLEAN NOT NULL DEFAULT FALSE
/// - last_login_at: TIMESTAMPTZ NULL
/// - created_at, updated_at: TIMESTAMPTZ NOT NULL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Identity provider subject
    pub id: String,

    pub email: String,

    pub display_name: Option<String>,

    pub phone: Option<String>,

    pub location: Option<String>,

    pub bio: Option<String>,

    #[serde(default)]
    pub skills: Vec<String>,

    /// Unset until the user picks a role
    pub role: Option<UserRole>,

    pub organization_name: Option<String>,

    pub website: Option<String>,

    #[serde(skip_serializing, default)]
    pub welcome_email_sent: bool,

    pub last_login_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).map_or(true, str::is_empty)
}

impl UserProfile {
    /// A fresh profile for a first-time sign-in.
    pub fn new(id: impl Into<String>, email: impl Into<String>, display_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            email: email.into(),
            display_name,
            phone: None,
            location: None,
            bio: None,
            skills: Vec::new(),
            role: None,
            organization_name: None,
            website: None,
            welcome_email_sent: false,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Required fields that are still empty for the current role.
    ///
    /// Without a role only the common fields are reported.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.display_name) {
            missing.push("display_name");
        }
        if is_blank(&self.phone) {
            missing.push("phone");
        }
        match self.role {
            Some(UserRole::Volunteer) if is_blank(&self.location) => missing.push("location"),
            Some(UserRole::Organization) if is_blank(&self.organization_name) => {
                missing.push("organization_name")
            }
            _ => {}
        }
        missing
    }

    /// Role chosen and every required field present.
    pub fn is_profile_complete(&self) -> bool {
        self.role.is_some() && self.missing_fields().is_empty()
    }

    pub fn is_volunteer(&self) -> bool {
        self.role == Some(UserRole::Volunteer)
    }

    pub fn is_organization(&self) -> bool {
        self.role == Some(UserRole::Organization)
    }

    /// Name used in emails and listings.
    pub fn name_or_email(&self) -> &str {
        match self.role {
            Some(UserRole::Organization) if !is_blank(&self.organization_name) => {
                self.organization_name.as_deref().unwrap_or(&self.email)
            }
            _ if !is_blank(&self.display_name) => self.display_name.as_deref().unwrap_or(&self.email),
            _ => &self.email,
        }
    }
}

/// Repository trait for user profiles.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a profile by uid.
    async fn find_by_id(&self, id: &str) -> Result<Option<UserProfile>, AppError>;

    /// Insert a new profile. Fails with `Conflict` when the uid exists.
    async fn create(&self, user: &UserProfile) -> Result<UserProfile, AppError>;

    /// Overwrite the editable fields of a profile.
    ///
    /// The role is set once: a stored role is never replaced, and a request
    /// carrying a different role fails with `Conflict` without writing.
    async fn update(&self, user: &UserProfile) -> Result<UserProfile, AppError>;

    /// Set `last_login_at` to the given instant.
    async fn touch_last_login(&self, id: &str, at: DateTime<Utc>) -> Result<(), AppError>;

    /// Atomically flip `welcome_email_sent` from false to true.
    ///
    /// Returns `true` only for the caller that performed the flip.
    async fn claim_welcome_email(&self, id: &str) -> Result<bool, AppError>;

    /// Reset `welcome_email_sent` after a failed send.
    async fn release_welcome_email(&self, id: &str) -> Result<(), AppError>;
}
