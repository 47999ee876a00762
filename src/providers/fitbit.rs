// SPDX-License-Identifier: MIT

//! Fitbit Web API client.
//!
//! Unlike Google Fit there is no aggregate endpoint: each metric is its own
//! resource with a daily value per calendar day. Sleep is special twice
//! over: it lives under API version 1.2, and a day can contain several
//! sleep sessions, each emitted as its own sample (the aggregator sums
//! same-day samples).

use crate::error::AppError;
use crate::models::{Metric, Provider, RawSample};
use crate::providers::{check_response_json, ProviderClient};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;

const FITBIT_API_BASE: &str = "https://api.fitbit.com";

/// Fitbit API client.
#[derive(Clone)]
pub struct FitbitClient {
    http: reqwest::Client,
    base_url: String,
}

impl FitbitClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: FITBIT_API_BASE.to_string(),
        }
    }

    /// Point the client at a different origin (tests).
    pub fn with_base_url(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Activity time-series resource name, for metrics served by
    /// `GET /1/user/-/activities/{resource}/date/{start}/{end}.json`.
    fn activity_resource(metric: Metric) -> Option<&'static str> {
        match metric {
            Metric::Steps => Some("steps"),
            Metric::Calories => Some("calories"),
            // Already kilometers on the wire
            Metric::Distance => Some("distance"),
            Metric::ActiveMinutes => Some("minutesVeryActive"),
            Metric::HeartRate | Metric::Sleep => None,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        access_token: &str,
        url: &str,
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::ProviderApi {
                provider: Provider::Fitbit.to_string(),
                message: e.to_string(),
            })?;

        check_response_json(Provider::Fitbit, response).await
    }

    async fn fetch_activity_series(
        &self,
        access_token: &str,
        resource: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawSample>, AppError> {
        let url = format!(
            "{}/1/user/-/activities/{}/date/{}/{}.json",
            self.base_url, resource, start, end
        );
        let body: HashMap<String, Vec<DailyValue>> = self.get_json(access_token, &url).await?;

        let key = format!("activities-{}", resource);
        let entries = body.get(&key).ok_or_else(|| AppError::InvalidPayload {
            provider: Provider::Fitbit.to_string(),
            message: format!("Missing '{}' in response", key),
        })?;

        entries
            .iter()
            .map(|entry| {
                let value = entry
                    .value
                    .parse::<f64>()
                    .map_err(|_| AppError::InvalidPayload {
                        provider: Provider::Fitbit.to_string(),
                        message: format!("Non-numeric value '{}' for {}", entry.value, key),
                    })?;
                Ok(RawSample {
                    date: entry.date_time,
                    value,
                })
            })
            .collect()
    }

    async fn fetch_heart_series(
        &self,
        access_token: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawSample>, AppError> {
        let url = format!(
            "{}/1/user/-/activities/heart/date/{}/{}.json",
            self.base_url, start, end
        );
        let body: HeartResponse = self.get_json(access_token, &url).await?;

        // Days without a resting heart rate are skipped, not zeroed; the
        // aggregator's zero-fill makes them explicit.
        Ok(body
            .entries
            .iter()
            .filter_map(|entry| {
                entry.value.resting_heart_rate.map(|bpm| RawSample {
                    date: entry.date_time,
                    value: bpm,
                })
            })
            .collect())
    }

    async fn fetch_sleep_series(
        &self,
        access_token: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawSample>, AppError> {
        let url = format!(
            "{}/1.2/user/-/sleep/date/{}/{}.json",
            self.base_url, start, end
        );
        let body: SleepResponse = self.get_json(access_token, &url).await?;

        // One sample per session; same-day sessions sum up downstream.
        Ok(body
            .sleep
            .iter()
            .map(|session| RawSample {
                date: session.date_of_sleep,
                value: session.minutes_asleep,
            })
            .collect())
    }
}

#[async_trait]
impl ProviderClient for FitbitClient {
    fn provider(&self) -> Provider {
        Provider::Fitbit
    }

    fn metrics(&self) -> &'static [Metric] {
        &[
            Metric::Steps,
            Metric::Calories,
            Metric::Distance,
            Metric::ActiveMinutes,
            Metric::HeartRate,
            Metric::Sleep,
        ]
    }

    async fn fetch_series(
        &self,
        access_token: &str,
        metric: Metric,
        start: NaiveDate,
        days: u32,
    ) -> Result<Vec<RawSample>, AppError> {
        let end = start + chrono::Duration::days(i64::from(days.saturating_sub(1)));

        match metric {
            Metric::HeartRate => self.fetch_heart_series(access_token, start, end).await,
            Metric::Sleep => self.fetch_sleep_series(access_token, start, end).await,
            _ => {
                // Checked above: every other metric maps to a resource
                let resource = Self::activity_resource(metric).ok_or_else(|| {
                    AppError::BadRequest(format!(
                        "Metric '{}' is not served by Fitbit",
                        metric.as_str()
                    ))
                })?;
                self.fetch_activity_series(access_token, resource, start, end)
                    .await
            }
        }
    }
}

// ─── Wire types ──────────────────────────────────────────────────────────

/// One entry of an activity time series; values are decimal strings.
#[derive(Debug, Deserialize)]
struct DailyValue {
    #[serde(rename = "dateTime")]
    date_time: NaiveDate,
    value: String,
}

#[derive(Debug, Deserialize)]
struct HeartResponse {
    #[serde(rename = "activities-heart", default)]
    entries: Vec<HeartEntry>,
}

#[derive(Debug, Deserialize)]
struct HeartEntry {
    #[serde(rename = "dateTime")]
    date_time: NaiveDate,
    value: HeartValue,
}

#[derive(Debug, Deserialize)]
struct HeartValue {
    #[serde(rename = "restingHeartRate")]
    resting_heart_rate: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SleepResponse {
    #[serde(default)]
    sleep: Vec<SleepSession>,
}

#[derive(Debug, Deserialize)]
struct SleepSession {
    #[serde(rename = "dateOfSleep")]
    date_of_sleep: NaiveDate,
    #[serde(rename = "minutesAsleep")]
    minutes_asleep: f64,
}
