//! # Volunteer Match Library
//!
//! Backend for a volunteer-matching service:
//! - Organizations post opportunities with a fixed number of seats
//! - Volunteers apply, withdraw, and leave feedback once an event ends
//! - Role dashboards backed by view and application counters
//! - Transactional email for welcome and application lifecycle events
//!
//! ## Architecture
//!
//! - **Domain Layer**: Entities, status machines and repository traits
//! - **Application Layer**: Services and DTOs
//! - **Infrastructure Layer**: PostgreSQL, Redis, email and metrics
//! - **Presentation Layer**: HTTP handlers and middleware
//!
//! ## Module Structure
//!
//! ```text
//! volunteer_match/
//! +-- config/         Configuration management
//! +-- domain/         Entities, value objects, and repository traits
//! +-- application/    Application services and DTOs
//! +-- infrastructure/ Store, analytics, email and metrics implementations
//! +-- presentation/   HTTP routes, handlers and middleware
//! +-- shared/         Common utilities (errors, validation, snowflake IDs)
//! ```

// Configuration module
pub mod config;

// Domain layer
pub mod domain;

// Application layer
pub mod application;

// Infrastructure layer
pub mod infrastructure;

// Presentation layer
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Logging setup
pub mod telemetry;
