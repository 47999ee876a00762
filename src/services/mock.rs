// SPDX-License-Identifier: MIT

//! Deterministic fallback data generator.
//!
//! When a provider fetch fails mid-sync the orchestrator still returns a
//! renderable result, generated here and tagged [`DataSource::Mock`] so
//! callers can surface degraded mode instead of mistaking it for real data.
//!
//! The series are seeded from the user id and window start, so the same
//! request always produces the same numbers (stable dev dashboards,
//! assertable tests).

use crate::models::{DailyMetricPoint, DataSource, FitnessData, Metric, Provider};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

/// Generate a full mock result for `days` days starting at `start`.
pub fn generate(
    user_id: Uuid,
    provider: Provider,
    start: NaiveDate,
    days: u32,
    last_synced: String,
) -> FitnessData {
    let mut data = FitnessData::empty(provider, last_synced, DataSource::Mock);

    data.steps = series(user_id, Metric::Steps, start, days);
    data.calories = series(user_id, Metric::Calories, start, days);
    data.distance = series(user_id, Metric::Distance, start, days);
    data.active_minutes = series(user_id, Metric::ActiveMinutes, start, days);
    data.heart_rate = Some(series(user_id, Metric::HeartRate, start, days));
    data.sleep = Some(series(user_id, Metric::Sleep, start, days));

    data
}

/// One mock series; each day draws from its own seeded RNG so windows that
/// overlap agree on the shared days.
pub fn series(
    user_id: Uuid,
    metric: Metric,
    start: NaiveDate,
    days: u32,
) -> Vec<DailyMetricPoint> {
    (0..days)
        .map(|offset| {
            let date = start + Duration::days(i64::from(offset));
            DailyMetricPoint {
                date,
                value: day_value(user_id, metric, date),
            }
        })
        .collect()
}

fn day_value(user_id: Uuid, metric: Metric, date: NaiveDate) -> f64 {
    let mut rng = ChaCha8Rng::seed_from_u64(seed(user_id, metric, date));
    let weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);

    match metric {
        // Weekends skew wider: some long hikes, some rest days
        Metric::Steps => {
            if weekend {
                f64::from(rng.gen_range(3000..=14000))
            } else {
                f64::from(rng.gen_range(5000..=11000))
            }
        }
        Metric::Calories => {
            if weekend {
                f64::from(rng.gen_range(1700..=3200))
            } else {
                f64::from(rng.gen_range(1900..=2700))
            }
        }
        Metric::Distance => {
            let km = if weekend {
                rng.gen_range(1.0..=11.0)
            } else {
                rng.gen_range(2.5..=8.0)
            };
            (km * 10.0_f64).round() / 10.0
        }
        Metric::ActiveMinutes => {
            if weekend {
                f64::from(rng.gen_range(10..=120))
            } else {
                f64::from(rng.gen_range(20..=75))
            }
        }
        Metric::HeartRate => f64::from(rng.gen_range(58..=74)),
        Metric::Sleep => {
            if weekend {
                f64::from(rng.gen_range(390..=540))
            } else {
                f64::from(rng.gen_range(330..=480))
            }
        }
    }
}

fn seed(user_id: Uuid, metric: Metric, date: NaiveDate) -> u64 {
    // Both UUID halves must contribute; random v4 ids can share a half
    let (hi, lo) = user_id.as_u64_pair();
    hi ^ lo
        ^ (date.num_days_from_ce() as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)
        ^ (metric as u64).wrapping_mul(0x517c_c1b7_2722_0a95)
}
