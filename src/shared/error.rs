//! Application Error Types
//!
//! Centralized error handling with Axum integration.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// HTTP status and numeric application code for this error.
    pub fn status_and_code(&self) -> (StatusCode, u16) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, 10001),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, 10002),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, 10003),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, 10004),
            AppError::Conflict(_) => (StatusCode::CONFLICT, 10005),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, 10007),
            AppError::Internal(_) | AppError::Database(_) | AppError::Redis(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, 10000)
            }
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::Conflict(msg)
            | AppError::Validation(msg) => msg.clone(),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".into()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Internal server error".into()
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {}", e);
                "Internal server error".into()
            }
        };

        (status, Json(ErrorResponse { code, message })).into_response()
    }
}
