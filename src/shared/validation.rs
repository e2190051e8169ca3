//! Validation Utilities

use validator::{Validate, ValidationErrors};

use super::error::AppError;

/// Convert validation errors to AppError, reporting the first field error.
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let mut fields: Vec<(String, String)> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                (
                    field.to_string(),
                    e.message.clone().map(|m| m.to_string()).unwrap_or_default(),
                )
            })
        })
        .collect();
    // HashMap iteration order is not stable
    fields.sort();

    let message = fields
        .first()
        .map(|(field, message)| format!("{}: {}", field, message))
        .unwrap_or_else(|| "Validation failed".into());

    AppError::Validation(message)
}

/// Validate a request body, mapping failures to `AppError::Validation`.
pub fn validate_body<T: Validate>(body: &T) -> Result<(), AppError> {
    body.validate().map_err(validation_error)
}
