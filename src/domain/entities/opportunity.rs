//! Opportunity entity and repository trait.
//!
//! Maps to the `opportunities` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Opportunity lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OpportunityStatus {
    #[default]
    Open,
    Closed,
    Completed,
}

impl OpportunityStatus {
    /// Parse from database string representation, defaulting to `Open`.
    pub fn from_db(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "closed" => Self::Closed,
            "completed" => Self::Completed,
            _ => Self::Open,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Completed => "completed",
        }
    }

    /// Open and Closed toggle freely; anything not yet completed may complete.
    pub fn can_transition_to(&self, next: OpportunityStatus) -> bool {
        use OpportunityStatus::*;
        matches!(
            (self, next),
            (Open, Closed) | (Closed, Open) | (Open, Completed) | (Closed, Completed)
        )
    }
}

impl std::fmt::Display for OpportunityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A volunteer opportunity posted by an organization.
///
/// Maps to the `opportunities` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - organization_id: TEXT NOT NULL REFERENCES users(id)
/// - title: VARCHAR(120) NOT NULL
/// - description: TEXT NOT NULL
/// - location: VARCHAR(200) NOT NULL
/// - category: VARCHAR(50) NULL
/// - start_time, end_time: TIMESTAMPTZ NOT NULL
/// - total_seats: INTEGER NOT NULL CHECK (total_seats >= 1)
/// - filled_seats: INTEGER NOT NULL DEFAULT 0 CHECK (0 <= filled_seats <= total_seats)
/// - status: VARCHAR(20) NOT NULL DEFAULT 'open'
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    /// Snowflake ID
    pub id: i64,

    /// Owning organization's uid
    pub organization_id: String,

    pub title: String,

    pub description: String,

    pub location: String,

    pub category: Option<String>,

    pub start_time: DateTime<Utc>,

    pub end_time: DateTime<Utc>,

    pub total_seats: i32,

    /// Seats held by pending or accepted applications
    pub filled_seats: i32,

    #[serde(default)]
    pub status: OpportunityStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Opportunity {
    pub fn remaining_seats(&self) -> i32 {
        (self.total_seats - self.filled_seats).max(0)
    }

    pub fn is_full(&self) -> bool {
        self.filled_seats >= self.total_seats
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.start_time
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_time
    }

    /// Open, not full, and not yet started.
    pub fn is_accepting_applications(&self, now: DateTime<Utc>) -> bool {
        self.status == OpportunityStatus::Open && !self.is_full() && !self.has_started(now)
    }

    /// Last instant at which a volunteer may still withdraw.
    pub fn withdrawal_deadline(&self, cutoff_hours: i64) -> DateTime<Utc> {
        self.start_time - Duration::hours(cutoff_hours)
    }

    pub fn can_withdraw_at(&self, now: DateTime<Utc>, cutoff_hours: i64) -> bool {
        now < self.withdrawal_deadline(cutoff_hours)
    }

    /// Feedback opens once the event is over or marked completed.
    pub fn is_finished(&self, now: DateTime<Utc>) -> bool {
        self.status == OpportunityStatus::Completed || self.has_ended(now)
    }
}

/// Listing filter for opportunities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpportunityFilter {
    pub status: Option<OpportunityStatus>,
    pub category: Option<String>,
    pub organization_id: Option<String>,
    /// Only opportunities starting after this instant
    pub starts_after: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

impl OpportunityFilter {
    /// Whether an opportunity passes every predicate of the filter.
    pub fn matches(&self, opportunity: &Opportunity) -> bool {
        self.status.map_or(true, |s| opportunity.status == s)
            && self
                .category
                .as_deref()
                .map_or(true, |c| opportunity.category.as_deref() == Some(c))
            && self
                .organization_id
                .as_deref()
                .map_or(true, |o| opportunity.organization_id == o)
            && self.starts_after.map_or(true, |t| opportunity.start_time > t)
    }
}

/// Repository trait for Opportunity data access operations.
///
/// Seat counters are only changed through `reserve_seat` and `release_seat`,
/// which must be atomic in every implementation.
#[async_trait]
pub trait OpportunityRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Opportunity>, AppError>;

    /// Fetch several opportunities; unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Opportunity>, AppError>;

    /// List opportunities ordered by start time ascending.
    async fn list(&self, filter: &OpportunityFilter) -> Result<Vec<Opportunity>, AppError>;

    async fn create(&self, opportunity: &Opportunity) -> Result<Opportunity, AppError>;

    /// Update the editable fields. Never touches `filled_seats`.
    async fn update(&self, opportunity: &Opportunity) -> Result<Opportunity, AppError>;

    /// Move to `next` only while the stored status is one of `expected`.
    ///
    /// Returns `None` when the opportunity is missing or its status has
    /// already moved on.
    async fn set_status(
        &self,
        id: i64,
        expected: &[OpportunityStatus],
        next: OpportunityStatus,
    ) -> Result<Option<Opportunity>, AppError>;

    /// Delete an opportunity that holds no seats. Fails with `Conflict`
    /// while `filled_seats > 0`.
    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Increment `filled_seats` only while the opportunity is open and not full.
    ///
    /// Returns `false` when no seat could be taken.
    async fn reserve_seat(&self, id: i64) -> Result<bool, AppError>;

    /// Decrement `filled_seats`, never below zero.
    async fn release_seat(&self, id: i64) -> Result<(), AppError>;
}
