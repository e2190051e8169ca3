//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints.

pub mod health;
pub mod user;
pub mod opportunity;
pub mod application;
pub mod feedback;
pub mod dashboard;

use crate::shared::error::AppError;

/// Parse a snowflake id taken from the path.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {} ID", what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42", "opportunity").unwrap(), 42);
        let err = parse_id("abc", "opportunity").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Invalid opportunity ID"));
    }
}
