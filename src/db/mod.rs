// SPDX-License-Identifier: MIT

//! Token persistence layer.
//!
//! The only state this core owns is the OAuth connection record per
//! `(user, provider)` pair, stored in the `fitness_connections` table.

pub mod memory;
pub mod postgres;

pub use memory::MemoryTokenStore;
pub use postgres::PgTokenStore;

use crate::error::AppError;
use crate::models::{FitnessToken, Provider};
use async_trait::async_trait;
use uuid::Uuid;

/// Persists per-user, per-provider OAuth credentials.
///
/// Not-found is a valid, silent outcome (`Ok(None)`), never an error.
/// Failures are typed results; no retries happen at this layer.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, user_id: Uuid, provider: Provider)
        -> Result<Option<FitnessToken>, AppError>;

    /// Upsert keyed by `(user_id, provider)`: at most one record per pair,
    /// with the latest save winning.
    async fn save(
        &self,
        user_id: Uuid,
        provider: Provider,
        token: &FitnessToken,
    ) -> Result<(), AppError>;

    async fn delete(&self, user_id: Uuid, provider: Provider) -> Result<(), AppError>;

    /// Providers the user currently has a connection record for.
    async fn list_providers(&self, user_id: Uuid) -> Result<Vec<Provider>, AppError>;
}
