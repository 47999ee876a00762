// SPDX-License-Identifier: MIT

//! Postgres-backed token store (Supabase).
//!
//! Schema (managed by the collaborator):
//!
//! ```sql
//! CREATE TABLE fitness_connections (
//!     user_id       UUID        NOT NULL,
//!     provider      TEXT        NOT NULL,
//!     access_token  TEXT        NOT NULL,
//!     refresh_token TEXT        NOT NULL,
//!     expires_at    TIMESTAMPTZ NOT NULL,
//!     updated_at    TIMESTAMPTZ NOT NULL,
//!     PRIMARY KEY (user_id, provider)
//! );
//! ```

use crate::db::TokenStore;
use crate::error::AppError;
use crate::models::{FitnessToken, Provider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::str::FromStr;
use uuid::Uuid;

/// Token store backed by the `fitness_connections` table.
#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    /// Connect to Postgres with a small pool suited to a single service
    /// instance.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Postgres: {}", e)))?;

        tracing::info!("Connected to Postgres");

        Ok(Self { pool })
    }

    /// Wrap an existing pool (tests, shared pools).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn get(
        &self,
        user_id: Uuid,
        provider: Provider,
    ) -> Result<Option<FitnessToken>, AppError> {
        let row = sqlx::query(
            "SELECT access_token, refresh_token, expires_at \
             FROM fitness_connections WHERE user_id = $1 AND provider = $2",
        )
        .bind(user_id)
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.map(|row| FitnessToken {
            access_token: row.get("access_token"),
            refresh_token: row.get("refresh_token"),
            expires_at: row.get::<DateTime<Utc>, _>("expires_at"),
        }))
    }

    async fn save(
        &self,
        user_id: Uuid,
        provider: Provider,
        token: &FitnessToken,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO fitness_connections \
                 (user_id, provider, access_token, refresh_token, expires_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id, provider) DO UPDATE SET \
                 access_token = EXCLUDED.access_token, \
                 refresh_token = EXCLUDED.refresh_token, \
                 expires_at = EXCLUDED.expires_at, \
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(user_id)
        .bind(provider.as_str())
        .bind(&token.access_token)
        .bind(&token.refresh_token)
        .bind(token.expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, user_id: Uuid, provider: Provider) -> Result<(), AppError> {
        sqlx::query("DELETE FROM fitness_connections WHERE user_id = $1 AND provider = $2")
            .bind(user_id)
            .bind(provider.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn list_providers(&self, user_id: Uuid) -> Result<Vec<Provider>, AppError> {
        let rows = sqlx::query(
            "SELECT provider FROM fitness_connections WHERE user_id = $1 ORDER BY provider",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        // Rows with provider values this build does not know are skipped
        // rather than failing the whole listing.
        Ok(rows
            .iter()
            .filter_map(|row| Provider::from_str(row.get::<&str, _>("provider")).ok())
            .collect())
    }
}
