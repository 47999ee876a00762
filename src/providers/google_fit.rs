// SPDX-License-Identifier: MIT

//! Google Fit REST client.
//!
//! All metrics go through the `dataset:aggregate` endpoint with a fixed
//! 24-hour bucket width, so one request per metric returns pre-bucketed
//! days. Distance arrives in meters; the aggregator converts to km.

use crate::error::AppError;
use crate::models::{Metric, Provider, RawSample};
use crate::providers::{check_response_json, ProviderClient};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

const GOOGLE_FIT_API_BASE: &str = "https://fitness.googleapis.com/fitness/v1";

/// Milliseconds in one day; the bucket width for every aggregate request.
const DAY_MILLIS: i64 = 86_400_000;

/// Google Fit API client.
#[derive(Clone)]
pub struct GoogleFitClient {
    http: reqwest::Client,
    base_url: String,
}

impl GoogleFitClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: GOOGLE_FIT_API_BASE.to_string(),
        }
    }

    /// Point the client at a different origin (tests).
    pub fn with_base_url(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: format!("{}/fitness/v1", base_url.trim_end_matches('/')),
        }
    }

    fn data_type_name(metric: Metric) -> Option<&'static str> {
        match metric {
            Metric::Steps => Some("com.google.step_count.delta"),
            Metric::Calories => Some("com.google.calories.expended"),
            Metric::Distance => Some("com.google.distance.delta"),
            Metric::ActiveMinutes => Some("com.google.active_minutes"),
            Metric::HeartRate => Some("com.google.heart_rate.bpm"),
            Metric::Sleep => None,
        }
    }
}

#[async_trait]
impl ProviderClient for GoogleFitClient {
    fn provider(&self) -> Provider {
        Provider::GoogleFit
    }

    fn metrics(&self) -> &'static [Metric] {
        &[
            Metric::Steps,
            Metric::Calories,
            Metric::Distance,
            Metric::ActiveMinutes,
            Metric::HeartRate,
        ]
    }

    async fn fetch_series(
        &self,
        access_token: &str,
        metric: Metric,
        start: NaiveDate,
        days: u32,
    ) -> Result<Vec<RawSample>, AppError> {
        let data_type = Self::data_type_name(metric).ok_or_else(|| AppError::BadRequest(
            format!("Metric '{}' is not served by Google Fit", metric.as_str()),
        ))?;

        let start_millis = start
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .ok_or_else(|| AppError::BadRequest("Invalid start date".to_string()))?;
        let end_millis = start_millis + i64::from(days) * DAY_MILLIS;

        let body = serde_json::json!({
            "aggregateBy": [{"dataTypeName": data_type}],
            "bucketByTime": {"durationMillis": DAY_MILLIS},
            "startTimeMillis": start_millis,
            "endTimeMillis": end_millis,
        });

        let url = format!("{}/users/me/dataset:aggregate", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ProviderApi {
                provider: Provider::GoogleFit.to_string(),
                message: e.to_string(),
            })?;

        let aggregate: AggregateResponse =
            check_response_json(Provider::GoogleFit, response).await?;

        parse_buckets(&aggregate)
    }
}

/// Flatten aggregate buckets into typed samples, one per data point.
fn parse_buckets(aggregate: &AggregateResponse) -> Result<Vec<RawSample>, AppError> {
    let mut samples = Vec::new();

    for bucket in &aggregate.bucket {
        // startTimeMillis arrives as a decimal string on the wire
        let millis: i64 =
            bucket
                .start_time_millis
                .parse()
                .map_err(|_| AppError::InvalidPayload {
                    provider: Provider::GoogleFit.to_string(),
                    message: format!("Bad startTimeMillis '{}'", bucket.start_time_millis),
                })?;

        let date = DateTime::<Utc>::from_timestamp_millis(millis)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| AppError::InvalidPayload {
                provider: Provider::GoogleFit.to_string(),
                message: format!("startTimeMillis out of range: {}", millis),
            })?;

        for dataset in &bucket.dataset {
            for point in &dataset.point {
                // A point carries a single value for our aggregations;
                // intVal and fpVal encodings both occur.
                if let Some(value) = point.value.first().and_then(PointValue::as_f64) {
                    samples.push(RawSample { date, value });
                }
            }
        }
    }

    Ok(samples)
}

// ─── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    bucket: Vec<AggregateBucket>,
}

#[derive(Debug, Deserialize)]
struct AggregateBucket {
    #[serde(rename = "startTimeMillis")]
    start_time_millis: String,
    #[serde(default)]
    dataset: Vec<Dataset>,
}

#[derive(Debug, Deserialize)]
struct Dataset {
    #[serde(default)]
    point: Vec<DataPoint>,
}

#[derive(Debug, Deserialize)]
struct DataPoint {
    #[serde(default)]
    value: Vec<PointValue>,
}

#[derive(Debug, Deserialize)]
struct PointValue {
    #[serde(rename = "intVal")]
    int_val: Option<i64>,
    #[serde(rename = "fpVal")]
    fp_val: Option<f64>,
}

impl PointValue {
    fn as_f64(&self) -> Option<f64> {
        self.fp_val.or(self.int_val.map(|v| v as f64))
    }
}
