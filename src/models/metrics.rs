// SPDX-License-Identifier: MIT

//! Metric definitions and the aggregated sync result.

use crate::models::Provider;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One aggregated activity metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Steps,
    Calories,
    /// Kilometers after normalization (Google Fit reports meters)
    Distance,
    ActiveMinutes,
    /// Resting/average beats per minute
    HeartRate,
    /// Minutes asleep; hours are a presentation concern
    Sleep,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Steps => "steps",
            Metric::Calories => "calories",
            Metric::Distance => "distance",
            Metric::ActiveMinutes => "active_minutes",
            Metric::HeartRate => "heart_rate",
            Metric::Sleep => "sleep",
        }
    }
}

/// Typed intermediate representation of one provider data point, produced
/// by the provider clients after parsing/validating the raw JSON.
///
/// A provider may emit more than one sample per calendar day (e.g. several
/// Fitbit sleep sessions); the aggregator accumulates them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub date: NaiveDate,
    pub value: f64,
}

/// One aggregated metric value for one calendar day.
///
/// `date` serializes as an ISO-8601 calendar date (YYYY-MM-DD).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetricPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Whether a sync result carries real provider data or the deterministic
/// development/fallback series. Callers can (and should) surface this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Real,
    Mock,
}

/// Aggregated result of one sync call. Ephemeral: constructed per call and
/// handed to the caller; persistence is the collaborator's concern.
///
/// Field names follow the dashboard wire contract (camelCase).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitnessData {
    pub provider: Provider,
    /// Chronological, oldest first; exactly one point per requested day.
    pub steps: Vec<DailyMetricPoint>,
    pub calories: Vec<DailyMetricPoint>,
    /// Kilometers, 1 decimal place
    pub distance: Vec<DailyMetricPoint>,
    pub active_minutes: Vec<DailyMetricPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<Vec<DailyMetricPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep: Option<Vec<DailyMetricPoint>>,
    /// Wall-clock time the aggregation completed (RFC 3339)
    pub last_synced: String,
    pub source: DataSource,
}

impl FitnessData {
    /// Empty result skeleton for a provider; series are filled in by the
    /// orchestrator metric by metric.
    pub fn empty(provider: Provider, last_synced: String, source: DataSource) -> Self {
        Self {
            provider,
            steps: Vec::new(),
            calories: Vec::new(),
            distance: Vec::new(),
            active_minutes: Vec::new(),
            heart_rate: None,
            sleep: None,
            last_synced,
            source,
        }
    }

    /// Assign an aggregated series to its metric slot.
    pub fn set_series(&mut self, metric: Metric, series: Vec<DailyMetricPoint>) {
        match metric {
            Metric::Steps => self.steps = series,
            Metric::Calories => self.calories = series,
            Metric::Distance => self.distance = series,
            Metric::ActiveMinutes => self.active_minutes = series,
            Metric::HeartRate => self.heart_rate = Some(series),
            Metric::Sleep => self.sleep = Some(series),
        }
    }

    /// Borrow the series for a metric, if present.
    pub fn series(&self, metric: Metric) -> Option<&[DailyMetricPoint]> {
        match metric {
            Metric::Steps => Some(&self.steps),
            Metric::Calories => Some(&self.calories),
            Metric::Distance => Some(&self.distance),
            Metric::ActiveMinutes => Some(&self.active_minutes),
            Metric::HeartRate => self.heart_rate.as_deref(),
            Metric::Sleep => self.sleep.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape_is_camel_case() {
        let mut data = FitnessData::empty(
            Provider::GoogleFit,
            "2024-01-03T12:00:00Z".to_string(),
            DataSource::Real,
        );
        data.set_series(
            Metric::ActiveMinutes,
            vec![DailyMetricPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                value: 42.0,
            }],
        );

        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["activeMinutes"][0]["date"], "2024-01-01");
        assert_eq!(json["activeMinutes"][0]["value"], 42.0);
        assert_eq!(json["lastSynced"], "2024-01-03T12:00:00Z");
        assert_eq!(json["source"], "real");
        // Optional series are omitted, not null
        assert!(json.get("heartRate").is_none());
    }
}
