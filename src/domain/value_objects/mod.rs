//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! - **ApplicationKey**: composite `"{opportunity_id}_{volunteer_id}"` key

mod application_key;

pub use application_key::*;
