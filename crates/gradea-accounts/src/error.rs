//! Error types for the account backend.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use document_store::StoreError;
use identity_client::IdentityError;
use serde::Serialize;
use thiserror::Error;

/// Account workflow errors.
///
/// Every error reaches the caller as produced; nothing here retries.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Rejected locally before any remote call.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Team ID already taken: {0}")]
    Conflict(String),

    #[error("Invalid Team ID: no admin is registered with '{0}'")]
    InvalidTeam(String),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed record: {0}")]
    Malformed(String),

    #[error("Backend unavailable: {0}")]
    Transient(#[from] StoreError),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl AccountError {
    /// HTTP status and stable error code.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AccountError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AccountError::Conflict(_) => (StatusCode::CONFLICT, "TEAM_ID_TAKEN"),
            AccountError::InvalidTeam(_) => (StatusCode::NOT_FOUND, "INVALID_TEAM"),
            AccountError::Identity(e) => match e {
                IdentityError::EmailInUse => (StatusCode::CONFLICT, "EMAIL_IN_USE"),
                IdentityError::WeakPassword(_) => (StatusCode::BAD_REQUEST, "WEAK_PASSWORD"),
                IdentityError::InvalidEmail => (StatusCode::BAD_REQUEST, "INVALID_EMAIL"),
                IdentityError::UserNotFound => (StatusCode::UNAUTHORIZED, "USER_NOT_FOUND"),
                IdentityError::WrongPassword => (StatusCode::UNAUTHORIZED, "WRONG_PASSWORD"),
                IdentityError::TooManyAttempts => {
                    (StatusCode::TOO_MANY_REQUESTS, "TOO_MANY_ATTEMPTS")
                }
                IdentityError::Unknown(_) | IdentityError::Http(_) | IdentityError::Json(_) => {
                    (StatusCode::BAD_GATEWAY, "IDENTITY_PROVIDER_ERROR")
                }
            },
            AccountError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AccountError::Malformed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "MALFORMED_RECORD"),
            AccountError::Transient(_) => (StatusCode::SERVICE_UNAVAILABLE, "TRANSIENT_ERROR"),
            AccountError::RateLimitExceeded => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT_EXCEEDED")
            }
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<serde_json::Error> for AccountError {
    fn from(e: serde_json::Error) -> Self {
        AccountError::Malformed(e.to_string())
    }
}
