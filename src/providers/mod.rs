// SPDX-License-Identifier: MIT

//! Provider API clients.
//!
//! Each client turns one provider's REST responses into the typed
//! [`RawSample`] representation; bucketing and unit normalization happen
//! in the aggregator, not here.

pub mod fitbit;
pub mod google_fit;

pub use fitbit::FitbitClient;
pub use google_fit::GoogleFitClient;

use crate::error::AppError;
use crate::models::{Metric, Provider, RawSample};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Global request timeout for provider HTTP calls.
const HTTP_TIMEOUT_SECS: u64 = 10;

/// Authenticated read access to one provider's time-series endpoints.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// The metrics this provider can serve.
    fn metrics(&self) -> &'static [Metric];

    /// One authenticated request for one metric over `[start, start+days)`.
    ///
    /// Returns parsed samples only; days without data simply have no sample
    /// and are zero-filled by the aggregator.
    async fn fetch_series(
        &self,
        access_token: &str,
        metric: Metric,
        start: NaiveDate,
        days: u32,
    ) -> Result<Vec<RawSample>, AppError>;
}

/// Shared reqwest client for provider calls.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .unwrap_or_default()
}

/// Check response status and parse the JSON body.
///
/// 401 means the token was revoked or expired out from under us and maps to
/// the auth error kind; everything else non-2xx is a provider API error.
pub(crate) async fn check_response_json<T: DeserializeOwned>(
    provider: Provider,
    response: reqwest::Response,
) -> Result<T, AppError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 401 {
            return Err(AppError::Auth {
                provider: provider.to_string(),
                message: "unauthorized".to_string(),
            });
        }

        if status.as_u16() == 429 {
            tracing::warn!(provider = %provider, "Provider rate limit hit (429)");
        }

        return Err(AppError::ProviderApi {
            provider: provider.to_string(),
            message: format!("HTTP {}: {}", status, body),
        });
    }

    response.json().await.map_err(|e| AppError::InvalidPayload {
        provider: provider.to_string(),
        message: format!("JSON parse error: {}", e),
    })
}
