//! Authentication Middleware
//!
//! Identity token validation for protected routes. Tokens are HS256 JWTs
//! issued by the identity provider; the subject is the user's uid.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthSettings;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Identity token claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IdentityClaims {
    /// Subject (uid)
    pub sub: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Authenticated user extension
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
}

fn validation(settings: &AuthSettings) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = settings.leeway_secs;
    if let Some(issuer) = &settings.issuer {
        validation.set_issuer(&[issuer]);
    }
    match &settings.audience {
        Some(audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }
    validation
}

/// Verify a bearer token and return the identity it asserts.
pub fn verify_token(token: &str, settings: &AuthSettings) -> Result<AuthUser, AppError> {
    let token_data = decode::<IdentityClaims>(
        token,
        &DecodingKey::from_secret(settings.token_secret.as_bytes()),
        &validation(settings),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("Token expired".into())
        }
        _ => AppError::Unauthorized("Invalid token".into()),
    })?;

    let claims = token_data.claims;
    if claims.sub.trim().is_empty() {
        return Err(AppError::Unauthorized("Invalid token claims".into()));
    }

    Ok(AuthUser {
        uid: claims.sub,
        email: claims.email,
        name: claims.name,
    })
}

/// Authentication middleware that validates identity tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    // Check for Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".into()))?;

    let user = verify_token(token, &state.settings.auth)?;

    // Insert authenticated user into request extensions
    request.extensions_mut().insert(user);

    // Continue to the next handler
    Ok(next.run(request).await)
}
