//! Composite key for per-volunteer, per-opportunity records.
//!
//! Applications and feedback are keyed by `"{opportunity_id}_{volunteer_id}"`.
//! The key is deterministic, so a second write for the same pair collides
//! on the primary key instead of creating a duplicate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `"{opportunity_id}_{volunteer_id}"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApplicationKey {
    pub opportunity_id: i64,
    pub volunteer_id: String,
}

impl ApplicationKey {
    pub fn new(opportunity_id: i64, volunteer_id: impl Into<String>) -> Self {
        Self {
            opportunity_id,
            volunteer_id: volunteer_id.into(),
        }
    }
}

impl fmt::Display for ApplicationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.opportunity_id, self.volunteer_id)
    }
}

/// Error returned for malformed keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid application key: {0}")]
pub struct InvalidApplicationKey(pub String);

impl FromStr for ApplicationKey {
    type Err = InvalidApplicationKey;

    /// Splits at the first underscore; uids may themselves contain underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (opportunity, volunteer) = s
            .split_once('_')
            .ok_or_else(|| InvalidApplicationKey(s.to_string()))?;
        let opportunity_id = opportunity
            .parse::<i64>()
            .map_err(|_| InvalidApplicationKey(s.to_string()))?;
        if volunteer.is_empty() {
            return Err(InvalidApplicationKey(s.to_string()));
        }
        Ok(Self::new(opportunity_id, volunteer))
    }
}

impl TryFrom<String> for ApplicationKey {
    type Error = InvalidApplicationKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ApplicationKey> for String {
    fn from(key: ApplicationKey) -> Self {
        key.to_string()
    }
}
