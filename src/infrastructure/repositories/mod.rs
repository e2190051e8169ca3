//! Repository Implementations
//!
//! Concrete implementations of the repository traits defined in the domain
//! layer.
//!
//! ## Available Repositories
//!
//! - **PgUserRepository** - User profiles
//! - **PgOpportunityRepository** - Opportunities and seat counters
//! - **PgApplicationRepository** - Applications keyed by opportunity/volunteer
//! - **PgFeedbackRepository** - Post-event feedback
//! - **MemoryStore** - All of the above, in memory
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use volunteer_match::infrastructure::repositories::{
//!     PgApplicationRepository, PgOpportunityRepository, PgUserRepository,
//! };
//!
//! fn setup_repositories(pool: PgPool) {
//!     let users = PgUserRepository::new(pool.clone());
//!     let opportunities = PgOpportunityRepository::new(pool.clone());
//!     let applications = PgApplicationRepository::new(pool);
//! }
//! ```

pub mod application_repository;
pub mod feedback_repository;
pub mod memory_store;
pub mod opportunity_repository;
pub mod user_repository;

pub use application_repository::PgApplicationRepository;
pub use feedback_repository::PgFeedbackRepository;
pub use memory_store::MemoryStore;
pub use opportunity_repository::PgOpportunityRepository;
pub use user_repository::PgUserRepository;
