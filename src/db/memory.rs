// SPDX-License-Identifier: MIT

//! In-memory token store for tests and offline development.

use crate::db::TokenStore;
use crate::error::AppError;
use crate::models::{FitnessToken, Provider};
use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

/// DashMap-backed store with the same upsert semantics as Postgres.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    tokens: DashMap<(Uuid, Provider), FitnessToken>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(
        &self,
        user_id: Uuid,
        provider: Provider,
    ) -> Result<Option<FitnessToken>, AppError> {
        Ok(self
            .tokens
            .get(&(user_id, provider))
            .map(|entry| entry.clone()))
    }

    async fn save(
        &self,
        user_id: Uuid,
        provider: Provider,
        token: &FitnessToken,
    ) -> Result<(), AppError> {
        self.tokens.insert((user_id, provider), token.clone());
        Ok(())
    }

    async fn delete(&self, user_id: Uuid, provider: Provider) -> Result<(), AppError> {
        self.tokens.remove(&(user_id, provider));
        Ok(())
    }

    async fn list_providers(&self, user_id: Uuid) -> Result<Vec<Provider>, AppError> {
        let mut providers: Vec<Provider> = self
            .tokens
            .iter()
            .filter(|entry| entry.key().0 == user_id)
            .map(|entry| entry.key().1)
            .collect();
        providers.sort_by_key(|p| p.as_str());
        Ok(providers)
    }
}
