//! Application entity and repository trait.
//!
//! Maps to the `applications` table. One row per volunteer per opportunity,
//! keyed by [`ApplicationKey`](crate::domain::ApplicationKey).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::ApplicationKey;
use crate::shared::error::AppError;

/// Application status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::Pending,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    pub fn from_db(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "accepted" => Self::Accepted,
            "rejected" => Self::Rejected,
            "withdrawn" => Self::Withdrawn,
            _ => Self::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Withdrawn => "withdrawn",
        }
    }

    /// Pending and accepted applications occupy a seat.
    pub fn holds_seat(&self) -> bool {
        matches!(self, Self::Pending | Self::Accepted)
    }

    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Pending, Rejected)
                | (Accepted, Rejected)
                | (Pending, Withdrawn)
                | (Accepted, Withdrawn)
                | (Withdrawn, Pending)
        )
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A volunteer's application to an opportunity.
///
/// Maps to the `applications` table:
/// - id: TEXT PRIMARY KEY ("{opportunity_id}_{volunteer_id}")
/// - opportunity_id: BIGINT NOT NULL REFERENCES opportunities(id) ON DELETE CASCADE
/// - volunteer_id: TEXT NOT NULL REFERENCES users(id)
/// - organization_id: TEXT NOT NULL
/// - message: TEXT NULL
/// - status: VARCHAR(20) NOT NULL DEFAULT 'pending'
/// - applied_at, updated_at: TIMESTAMPTZ NOT NULL
/// - decided_at: TIMESTAMPTZ NULL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,

    pub opportunity_id: i64,

    pub volunteer_id: String,

    /// Denormalized owner of the opportunity
    pub organization_id: String,

    pub message: Option<String>,

    #[serde(default)]
    pub status: ApplicationStatus,

    pub applied_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Set when accepted or rejected
    pub decided_at: Option<DateTime<Utc>>,
}

impl Application {
    /// A new pending application keyed by the opportunity/volunteer pair.
    pub fn new(
        opportunity_id: i64,
        volunteer_id: impl Into<String>,
        organization_id: impl Into<String>,
        message: Option<String>,
    ) -> Self {
        let volunteer_id = volunteer_id.into();
        let now = Utc::now();
        Self {
            id: ApplicationKey::new(opportunity_id, volunteer_id.clone()).to_string(),
            opportunity_id,
            volunteer_id,
            organization_id: organization_id.into(),
            message,
            status: ApplicationStatus::Pending,
            applied_at: now,
            updated_at: now,
            decided_at: None,
        }
    }

    pub fn key(&self) -> ApplicationKey {
        ApplicationKey::new(self.opportunity_id, self.volunteer_id.clone())
    }
}

/// Repository trait for Application data access operations.
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Application>, AppError>;

    /// Applications for one opportunity, oldest first.
    async fn find_by_opportunity(&self, opportunity_id: i64) -> Result<Vec<Application>, AppError>;

    /// Applications made by one volunteer, newest first.
    async fn find_by_volunteer(&self, volunteer_id: &str) -> Result<Vec<Application>, AppError>;

    /// Insert a new application.
    ///
    /// Fails with `Conflict` when a row with the same key already exists.
    async fn create(&self, application: &Application) -> Result<Application, AppError>;

    /// Move an application to `next` only if its current status is in `expected`.
    ///
    /// Returns `None` when the row is missing or its status did not match,
    /// which lets callers detect a concurrent transition.
    async fn transition(
        &self,
        id: &str,
        expected: &[ApplicationStatus],
        next: ApplicationStatus,
        message: Option<String>,
    ) -> Result<Option<Application>, AppError>;
}
