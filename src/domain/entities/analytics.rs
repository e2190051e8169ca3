//! Analytics counters.
//!
//! Counters are plain monotonically increasing integers addressed by a
//! string key. The key layout is owned by [`AnalyticsCounter::key`] so that
//! every backend stores the same names.

use async_trait::async_trait;

use crate::shared::error::AppError;

/// A named counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnalyticsCounter {
    OpportunityViews { opportunity_id: i64 },
    OpportunitiesCreated { organization_id: String },
    ApplicationsSubmitted(CounterScope),
    ApplicationsAccepted(CounterScope),
    ApplicationsRejected(CounterScope),
    ApplicationsWithdrawn(CounterScope),
    ProfilesCreated,
    WelcomeEmailsSent,
}

/// Granularity of an application counter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CounterScope {
    Global,
    Organization(String),
    Opportunity(i64),
}

impl CounterScope {
    fn suffix(&self) -> String {
        match self {
            Self::Global => "global".to_string(),
            Self::Organization(id) => format!("org:{}", id),
            Self::Opportunity(id) => format!("opportunity:{}", id),
        }
    }
}

impl AnalyticsCounter {
    /// Storage key, without any backend prefix.
    pub fn key(&self) -> String {
        match self {
            Self::OpportunityViews { opportunity_id } => {
                format!("opportunity_views:opportunity:{}", opportunity_id)
            }
            Self::OpportunitiesCreated { organization_id } => {
                format!("opportunities_created:org:{}", organization_id)
            }
            Self::ApplicationsSubmitted(scope) => format!("applications_submitted:{}", scope.suffix()),
            Self::ApplicationsAccepted(scope) => format!("applications_accepted:{}", scope.suffix()),
            Self::ApplicationsRejected(scope) => format!("applications_rejected:{}", scope.suffix()),
            Self::ApplicationsWithdrawn(scope) => format!("applications_withdrawn:{}", scope.suffix()),
            Self::ProfilesCreated => "profiles_created:global".to_string(),
            Self::WelcomeEmailsSent => "welcome_emails_sent:global".to_string(),
        }
    }

    /// The global, organization and opportunity variants of one application event.
    pub fn application_fanout(
        make: fn(CounterScope) -> AnalyticsCounter,
        organization_id: &str,
        opportunity_id: i64,
    ) -> [AnalyticsCounter; 3] {
        [
            make(CounterScope::Global),
            make(CounterScope::Organization(organization_id.to_string())),
            make(CounterScope::Opportunity(opportunity_id)),
        ]
    }
}

/// Counter storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Add `by` to the counter stored under `key`, creating it at zero.
    async fn increment(&self, key: &str, by: i64) -> Result<i64, AppError>;

    /// Read counters; missing keys read as zero. Output order follows `keys`.
    async fn get_many(&self, keys: &[String]) -> Result<Vec<i64>, AppError>;
}
