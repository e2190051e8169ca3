//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - Database repositories (PostgreSQL) and the in-memory store
//! - Analytics counter stores (Redis, in-memory)
//! - Outbound email delivery
//! - Prometheus metrics

pub mod cache;
pub mod database;
pub mod email;
pub mod metrics;
pub mod repositories;
