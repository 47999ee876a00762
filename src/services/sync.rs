// SPDX-License-Identifier: MIT

//! Sync orchestration: token checks, concurrent metric fetches, bucketing,
//! and the tagged mock fallback.

use crate::db::TokenStore;
use crate::error::AppError;
use crate::models::{DataSource, FitnessData, Provider};
use crate::providers::ProviderClient;
use crate::services::{aggregate, mock, TokenRefresher};
use chrono::{Duration, NaiveDate, SecondsFormat, Utc};
use futures_util::future;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Upper bound on each per-metric provider call. A slow provider degrades
/// that one sync instead of pinning a connection indefinitely.
const PROVIDER_FETCH_TIMEOUT_SECS: u64 = 10;

/// Orchestrates one sync: resolves the stored token (refreshing if stale),
/// fetches every metric the provider serves concurrently, and aggregates
/// into a [`FitnessData`] result.
///
/// Any fetch failure after a usable token was obtained, auth errors
/// included, degrades to deterministic mock data tagged
/// [`DataSource::Mock`]; only refresh failures surface as errors so the
/// frontend can prompt a reconnect.
pub struct SyncService {
    store: Arc<dyn TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    clients: HashMap<Provider, Arc<dyn ProviderClient>>,
    fetch_timeout: std::time::Duration,
}

impl SyncService {
    pub fn new(
        store: Arc<dyn TokenStore>,
        refresher: Arc<dyn TokenRefresher>,
        clients: HashMap<Provider, Arc<dyn ProviderClient>>,
    ) -> Self {
        Self {
            store,
            refresher,
            clients,
            fetch_timeout: std::time::Duration::from_secs(PROVIDER_FETCH_TIMEOUT_SECS),
        }
    }

    /// Shrink the per-metric timeout (tests).
    pub fn with_fetch_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Sync the trailing `days`-day window (ending today, UTC) for one
    /// provider.
    ///
    /// Returns `Ok(None)` when the user has no connection for the provider.
    /// A token refresh failure aborts the sync before any provider fetch;
    /// fetch failures fall back to mock data.
    pub async fn get_fitness_data(
        &self,
        user_id: Uuid,
        provider: Provider,
        days: u32,
    ) -> Result<Option<FitnessData>, AppError> {
        let Some(token) = self.store.get(user_id, provider).await? else {
            return Ok(None);
        };

        let now = Utc::now();
        let token = if token.needs_refresh(now) {
            // No point hitting the provider with a token about to expire;
            // if the refresh fails the connection needs user attention.
            self.refresher.refresh(user_id, provider).await?
        } else {
            token
        };

        let days = days.max(1);
        let start = now.date_naive() - Duration::days(i64::from(days) - 1);

        match self.fetch_window(&token.access_token, provider, start, days).await {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                tracing::warn!(user_id = %user_id, provider = %provider, error = %e,
                    "Provider fetch failed, serving mock data");
                Ok(Some(mock::generate(
                    user_id,
                    provider,
                    start,
                    days,
                    rfc3339_now(),
                )))
            }
        }
    }

    /// Fetch and aggregate every metric for an explicit window. All metric
    /// fetches run concurrently, each bounded by the per-call timeout; the
    /// first failure wins.
    pub async fn fetch_window(
        &self,
        access_token: &str,
        provider: Provider,
        start: NaiveDate,
        days: u32,
    ) -> Result<FitnessData, AppError> {
        let client = self
            .clients
            .get(&provider)
            .ok_or_else(|| AppError::BadRequest(format!("Unsupported provider: {}", provider)))?;

        let fetches = client.metrics().iter().map(|&metric| {
            let client = Arc::clone(client);
            async move {
                let samples = tokio::time::timeout(
                    self.fetch_timeout,
                    client.fetch_series(access_token, metric, start, days),
                )
                .await
                .map_err(|_| AppError::Timeout {
                    provider: provider.to_string(),
                })??;
                Ok::<_, AppError>((metric, samples))
            }
        });

        let results = future::try_join_all(fetches).await?;

        let mut data = FitnessData::empty(provider, rfc3339_now(), DataSource::Real);
        for (metric, samples) in results {
            let mut series = aggregate::bucket_by_day(&samples, start, days);
            aggregate::normalize(metric, provider, &mut series);
            data.set_series(metric, series);
        }

        Ok(data)
    }
}

fn rfc3339_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
