// SPDX-License-Identifier: MIT

//! Sync orchestration tests with stubbed provider clients and refreshers.

mod common;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use fitsync::db::{MemoryTokenStore, TokenStore};
use fitsync::error::AppError;
use fitsync::models::{DataSource, FitnessToken, Metric, Provider, RawSample};
use fitsync::providers::ProviderClient;
use fitsync::services::{SyncService, TokenRefresher};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Provider client stub serving canned samples (or failures) for steps.
struct StubClient {
    samples: Vec<RawSample>,
    fail: Option<fn() -> AppError>,
    delay: Option<std::time::Duration>,
    calls: Arc<AtomicUsize>,
}

impl StubClient {
    fn serving(samples: Vec<RawSample>) -> Self {
        Self {
            samples,
            fail: None,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn failing() -> Self {
        Self {
            fail: Some(|| AppError::ProviderApi {
                provider: Provider::GoogleFit.to_string(),
                message: "HTTP 500: boom".to_string(),
            }),
            ..Self::serving(Vec::new())
        }
    }

    fn failing_unauthorized() -> Self {
        Self {
            fail: Some(|| AppError::Auth {
                provider: Provider::GoogleFit.to_string(),
                message: "unauthorized".to_string(),
            }),
            ..Self::serving(Vec::new())
        }
    }
}

#[async_trait]
impl ProviderClient for StubClient {
    fn provider(&self) -> Provider {
        Provider::GoogleFit
    }

    fn metrics(&self) -> &'static [Metric] {
        &[Metric::Steps]
    }

    async fn fetch_series(
        &self,
        _access_token: &str,
        _metric: Metric,
        _start: NaiveDate,
        _days: u32,
    ) -> Result<Vec<RawSample>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(make_error) = self.fail {
            return Err(make_error());
        }
        Ok(self.samples.clone())
    }
}

/// Refresher stub counting calls and returning a canned outcome.
struct StubRefresher {
    token: Option<FitnessToken>,
    calls: Arc<AtomicUsize>,
}

impl StubRefresher {
    fn failing() -> Self {
        Self {
            token: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn returning(token: FitnessToken) -> Self {
        Self {
            token: Some(token),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl TokenRefresher for StubRefresher {
    async fn refresh(&self, _user_id: Uuid, provider: Provider) -> Result<FitnessToken, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.token.clone().ok_or_else(|| AppError::Auth {
            provider: provider.to_string(),
            message: "refresh rejected".to_string(),
        })
    }
}

fn fresh_token() -> FitnessToken {
    FitnessToken {
        access_token: "access".to_string(),
        refresh_token: "refresh".to_string(),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

fn expired_token() -> FitnessToken {
    FitnessToken {
        access_token: "stale".to_string(),
        refresh_token: "refresh".to_string(),
        expires_at: Utc::now() - Duration::hours(1),
    }
}

fn service_with(
    store: Arc<dyn TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    client: StubClient,
) -> (SyncService, Arc<AtomicUsize>) {
    let calls = client.calls.clone();
    let mut clients: HashMap<Provider, Arc<dyn ProviderClient>> = HashMap::new();
    clients.insert(Provider::GoogleFit, Arc::new(client));
    (SyncService::new(store, refresher, clients), calls)
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

#[tokio::test]
async fn test_fetch_window_buckets_and_zero_fills() {
    let store = Arc::new(MemoryTokenStore::new());
    let client = StubClient::serving(vec![
        RawSample {
            date: day(1),
            value: 3000.0,
        },
        RawSample {
            date: day(1),
            value: 2000.0,
        },
    ]);
    let (sync, _) = service_with(store, Arc::new(StubRefresher::failing()), client);

    let data = sync
        .fetch_window("access", Provider::GoogleFit, day(1), 3)
        .await
        .unwrap();

    assert_eq!(data.source, DataSource::Real);
    let values: Vec<f64> = data.steps.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![5000.0, 0.0, 0.0]);
    let dates: Vec<NaiveDate> = data.steps.iter().map(|p| p.date).collect();
    assert_eq!(dates, vec![day(1), day(2), day(3)]);
}

#[tokio::test]
async fn test_no_connection_returns_none() {
    let store = Arc::new(MemoryTokenStore::new());
    let (sync, calls) = service_with(
        store,
        Arc::new(StubRefresher::failing()),
        StubClient::serving(vec![]),
    );

    let result = sync
        .get_fitness_data(Uuid::from_u128(1), Provider::GoogleFit, 7)
        .await
        .unwrap();

    assert!(result.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_refresh_failure_aborts_before_any_fetch() {
    let user = Uuid::from_u128(2);
    let store = Arc::new(MemoryTokenStore::new());
    store
        .save(user, Provider::GoogleFit, &expired_token())
        .await
        .unwrap();

    let refresher = Arc::new(StubRefresher::failing());
    let refresh_calls = refresher.calls.clone();
    let (sync, fetch_calls) = service_with(store, refresher, StubClient::serving(vec![]));

    let result = sync.get_fitness_data(user, Provider::GoogleFit, 7).await;

    assert!(matches!(result, Err(AppError::Auth { .. })));
    assert_eq!(refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_expired_token_refreshed_once_then_fetches() {
    let user = Uuid::from_u128(3);
    let store = Arc::new(MemoryTokenStore::new());
    store
        .save(user, Provider::GoogleFit, &expired_token())
        .await
        .unwrap();

    let refresher = Arc::new(StubRefresher::returning(fresh_token()));
    let refresh_calls = refresher.calls.clone();
    let (sync, fetch_calls) = service_with(store, refresher, StubClient::serving(vec![]));

    let data = sync
        .get_fitness_data(user, Provider::GoogleFit, 7)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(data.source, DataSource::Real);
    assert_eq!(refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fetch_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_valid_token_skips_refresh() {
    let user = Uuid::from_u128(4);
    let store = Arc::new(MemoryTokenStore::new());
    store
        .save(user, Provider::GoogleFit, &fresh_token())
        .await
        .unwrap();

    let refresher = Arc::new(StubRefresher::failing());
    let refresh_calls = refresher.calls.clone();
    let (sync, _) = service_with(store, refresher, StubClient::serving(vec![]));

    sync.get_fitness_data(user, Provider::GoogleFit, 7)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(refresh_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_provider_failure_falls_back_to_tagged_mock() {
    let user = Uuid::from_u128(5);
    let store = Arc::new(MemoryTokenStore::new());
    store
        .save(user, Provider::GoogleFit, &fresh_token())
        .await
        .unwrap();

    let (sync, _) = service_with(
        store,
        Arc::new(StubRefresher::failing()),
        StubClient::failing(),
    );

    let data = sync
        .get_fitness_data(user, Provider::GoogleFit, 7)
        .await
        .unwrap()
        .unwrap();

    // Degraded result is explicitly tagged, never silently "real"
    assert_eq!(data.source, DataSource::Mock);
    assert_eq!(data.steps.len(), 7);
    assert_eq!(data.calories.len(), 7);
}

#[tokio::test]
async fn test_fetch_time_auth_error_also_falls_back_to_mock() {
    let user = Uuid::from_u128(6);
    let store = Arc::new(MemoryTokenStore::new());
    store
        .save(user, Provider::GoogleFit, &fresh_token())
        .await
        .unwrap();

    // Token looked fresh but the provider rejected it mid-fetch; same
    // degraded path as any other fetch failure
    let (sync, _) = service_with(
        store,
        Arc::new(StubRefresher::failing()),
        StubClient::failing_unauthorized(),
    );

    let data = sync
        .get_fitness_data(user, Provider::GoogleFit, 7)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(data.source, DataSource::Mock);
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let store = Arc::new(MemoryTokenStore::new());
    let client = StubClient {
        delay: Some(std::time::Duration::from_millis(200)),
        ..StubClient::serving(Vec::new())
    };
    let (sync, _) = service_with(store, Arc::new(StubRefresher::failing()), client);
    let sync = sync.with_fetch_timeout(std::time::Duration::from_millis(20));

    let err = sync
        .fetch_window("access", Provider::GoogleFit, day(1), 3)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Timeout { .. }));
}

#[tokio::test]
async fn test_unsupported_provider_rejected() {
    let store = Arc::new(MemoryTokenStore::new());
    let clients: HashMap<Provider, Arc<dyn ProviderClient>> = HashMap::new();
    let sync = SyncService::new(store, Arc::new(StubRefresher::failing()), clients);

    let err = sync
        .fetch_window("access", Provider::Fitbit, day(1), 3)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)));
}
