//! Middleware
//!
//! Tower middleware for request processing.

pub mod auth;
pub mod cors;
pub mod logging;

pub use auth::{auth_middleware, verify_token, AuthUser, IdentityClaims};
pub use logging::track_metrics;
