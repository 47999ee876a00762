// SPDX-License-Identifier: MIT

//! Application configuration loaded from environment variables.
//!
//! Provider OAuth credentials are injected here, server-side, and never
//! reach client-controlled code. Values are read once at startup.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Non-sensitive ---
    /// Google Fit OAuth client ID (public)
    pub google_client_id: String,
    /// Fitbit OAuth client ID (public)
    pub fitbit_client_id: String,
    /// Frontend URL for post-OAuth redirects
    pub frontend_url: String,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// Google Fit OAuth client secret
    pub google_client_secret: String,
    /// Fitbit OAuth client secret
    pub fitbit_client_secret: String,
    /// Postgres connection string (Supabase)
    pub database_url: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for OAuth state signing
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            google_client_id: env::var("GOOGLE_FIT_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("GOOGLE_FIT_CLIENT_ID"))?,
            fitbit_client_id: env::var("FITBIT_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("FITBIT_CLIENT_ID"))?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),

            google_client_secret: env::var("GOOGLE_FIT_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_FIT_CLIENT_SECRET"))?,
            fitbit_client_secret: env::var("FITBIT_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FITBIT_CLIENT_SECRET"))?,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map_err(|_| ConfigError::Missing("OAUTH_STATE_KEY"))?
                .into_bytes(),
        })
    }

    /// Default config for tests only.
    pub fn test_default() -> Self {
        Self {
            google_client_id: "test_google_client_id".to_string(),
            fitbit_client_id: "test_fitbit_client_id".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            google_client_secret: "test_google_secret".to_string(),
            fitbit_client_secret: "test_fitbit_secret".to_string(),
            database_url: "postgres://localhost/fitsync_test".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            oauth_state_key: b"test_state_key".to_vec(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
