//! REST API tests

mod application_tests;
mod auth_tests;
mod feedback_tests;
mod health_tests;
mod onboarding_tests;
mod opportunity_tests;
