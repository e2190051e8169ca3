//! # Domain Entities
//!
//! Core business objects of the volunteer matching service.
//!
//! - **UserProfile**: a volunteer or organization, keyed by identity provider uid
//! - **Opportunity**: a posted volunteering slot with seat bookkeeping
//! - **Application**: one volunteer's request to join one opportunity
//! - **Feedback**: post-event rating by an accepted volunteer
//! - **AnalyticsCounter**: named counters for views and application events
//!
//! Each entity has an associated repository trait defining data access
//! operations. Implementations live in the infrastructure layer.

mod analytics;
mod application;
mod feedback;
mod opportunity;
mod user;

pub use analytics::{AnalyticsCounter, AnalyticsRepository, CounterScope};
#[cfg(test)]
pub use analytics::MockAnalyticsRepository;
pub use application::{Application, ApplicationRepository, ApplicationStatus};
pub use feedback::{average_rating, Feedback, FeedbackRepository, MAX_RATING, MIN_RATING};
pub use opportunity::{Opportunity, OpportunityFilter, OpportunityRepository, OpportunityStatus};
pub use user::{UserProfile, UserRepository, UserRole};
