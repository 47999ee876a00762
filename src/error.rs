// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// OAuth code exchange or refresh failed. Not retried automatically;
    /// the user must re-initiate the OAuth flow.
    #[error("OAuth error for {provider}: {message}")]
    Auth { provider: String, message: String },

    /// Non-2xx response from a provider data endpoint.
    #[error("{provider} API error: {message}")]
    ProviderApi { provider: String, message: String },

    /// Provider call exceeded its bounded timeout.
    #[error("{provider} request timed out")]
    Timeout { provider: String },

    /// Provider returned a payload we could not parse into the typed
    /// intermediate representation.
    #[error("Malformed {provider} payload: {message}")]
    InvalidPayload { provider: String, message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True if this error means the stored token is no longer usable and
    /// the user must reconnect.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, AppError::Auth { .. } | AppError::InvalidToken)
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Auth { provider, message } => (
                StatusCode::BAD_GATEWAY,
                "oauth_error",
                Some(format!("{}: {}", provider, message)),
            ),
            AppError::ProviderApi { provider, message } => (
                StatusCode::BAD_GATEWAY,
                "provider_error",
                Some(format!("{}: {}", provider, message)),
            ),
            AppError::Timeout { provider } => (
                StatusCode::GATEWAY_TIMEOUT,
                "provider_timeout",
                Some(provider.clone()),
            ),
            AppError::InvalidPayload { provider, message } => (
                StatusCode::BAD_GATEWAY,
                "provider_payload_error",
                Some(format!("{}: {}", provider, message)),
            ),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
