//! # Domain Layer
//!
//! The domain layer contains the core business rules of the service.
//! It is independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: User profiles, opportunities, applications, feedback, analytics
//! - **value_objects**: Immutable value types (ApplicationKey)
//!
//! Repository traits define data access contracts; implementations live in
//! the infrastructure layer.

pub mod entities;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use value_objects::*;
