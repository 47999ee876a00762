// SPDX-License-Identifier: MIT

//! Daily bucketing and derived-metric arithmetic.
//!
//! Provider clients hand over typed [`RawSample`]s; this module turns them
//! into fixed-length, zero-filled daily series and computes trend deltas.

use crate::models::{DailyMetricPoint, Metric, Provider, RawSample};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

/// Bucket raw samples into exactly `days` daily points starting at `start`.
///
/// Every calendar day in `[start, start + days)` gets a point, zero-valued
/// when no sample fell on it. Samples on the same day accumulate; samples
/// outside the window are dropped.
pub fn bucket_by_day(samples: &[RawSample], start: NaiveDate, days: u32) -> Vec<DailyMetricPoint> {
    let mut buckets: BTreeMap<NaiveDate, f64> = (0..days)
        .map(|offset| (start + Duration::days(i64::from(offset)), 0.0))
        .collect();

    for sample in samples {
        if let Some(total) = buckets.get_mut(&sample.date) {
            *total += sample.value;
        }
    }

    buckets
        .into_iter()
        .map(|(date, value)| DailyMetricPoint { date, value })
        .collect()
}

/// Trend of the most recent day against the mean of all prior days, as a
/// rounded integer percent.
///
/// Returns 0 for series of one point or less, and 0 when the prior-days
/// average is 0 (no divide-by-zero surprises for fresh accounts).
pub fn average_trend(series: &[DailyMetricPoint]) -> i64 {
    let Some((latest, prior)) = series.split_last() else {
        return 0;
    };
    if prior.is_empty() {
        return 0;
    }

    let prior_avg = prior.iter().map(|p| p.value).sum::<f64>() / prior.len() as f64;
    if prior_avg == 0.0 {
        return 0;
    }

    (((latest.value - prior_avg) / prior_avg) * 100.0).round() as i64
}

/// Apply per-metric unit and precision rules to a bucketed series.
///
/// Distance becomes kilometers at 1 decimal place; Google Fit reports
/// meters while Fitbit already reports km, so the conversion is
/// provider-aware. Everything else rounds to whole numbers (steps,
/// calories, minutes, bpm).
pub fn normalize(metric: Metric, provider: Provider, series: &mut [DailyMetricPoint]) {
    for point in series {
        point.value = match metric {
            Metric::Distance => {
                let km = if provider == Provider::GoogleFit {
                    point.value / 1000.0
                } else {
                    point.value
                };
                round1(km)
            }
            _ => point.value.round(),
        };
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn point(d: u32, value: f64) -> DailyMetricPoint {
        DailyMetricPoint {
            date: day(d),
            value,
        }
    }

    #[test]
    fn test_bucketing_produces_exactly_n_points() {
        let series = bucket_by_day(&[], day(1), 7);
        assert_eq!(series.len(), 7);
        assert!(series.iter().all(|p| p.value == 0.0));
        assert_eq!(series[0].date, day(1));
        assert_eq!(series[6].date, day(7));
    }

    #[test]
    fn test_same_day_samples_accumulate() {
        let samples = [
            RawSample {
                date: day(1),
                value: 3000.0,
            },
            RawSample {
                date: day(1),
                value: 2000.0,
            },
        ];

        let series = bucket_by_day(&samples, day(1), 3);
        assert_eq!(series[0].value, 5000.0);
        assert_eq!(series[1].value, 0.0);
        assert_eq!(series[2].value, 0.0);
    }

    #[test]
    fn test_samples_outside_window_dropped() {
        let samples = [
            RawSample {
                date: day(5),
                value: 100.0,
            },
            RawSample {
                date: day(2),
                value: 42.0,
            },
        ];

        let series = bucket_by_day(&samples, day(1), 3);
        assert_eq!(series.iter().map(|p| p.value).sum::<f64>(), 42.0);
    }

    #[test]
    fn test_series_is_chronological() {
        let samples = [
            RawSample {
                date: day(3),
                value: 1.0,
            },
            RawSample {
                date: day(1),
                value: 2.0,
            },
        ];

        let series = bucket_by_day(&samples, day(1), 3);
        let dates: Vec<_> = series.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
    }

    #[test]
    fn test_trend_single_point_is_zero() {
        assert_eq!(average_trend(&[point(1, 0.0)]), 0);
        assert_eq!(average_trend(&[]), 0);
    }

    #[test]
    fn test_trend_zero_prior_average_is_zero() {
        let series = [point(1, 0.0), point(2, 0.0), point(3, 10.0)];
        assert_eq!(average_trend(&series), 0);
    }

    #[test]
    fn test_trend_percent_rounded() {
        // prior avg = 100, latest = 133 -> +33%
        let series = [point(1, 100.0), point(2, 100.0), point(3, 133.0)];
        assert_eq!(average_trend(&series), 33);

        // prior avg = 200, latest = 100 -> -50%
        let series = [point(1, 200.0), point(2, 100.0)];
        assert_eq!(average_trend(&series), -50);
    }

    #[test]
    fn test_normalize_google_distance_meters_to_km() {
        let mut series = vec![point(1, 5432.0), point(2, 12345.0)];
        normalize(Metric::Distance, Provider::GoogleFit, &mut series);
        assert_eq!(series[0].value, 5.4);
        assert_eq!(series[1].value, 12.3);
    }

    #[test]
    fn test_normalize_fitbit_distance_already_km() {
        let mut series = vec![point(1, 5.43)];
        normalize(Metric::Distance, Provider::Fitbit, &mut series);
        assert_eq!(series[0].value, 5.4);
    }

    #[test]
    fn test_normalize_counts_round_to_integers() {
        let mut series = vec![point(1, 61.4), point(2, 61.6)];
        normalize(Metric::HeartRate, Provider::Fitbit, &mut series);
        assert_eq!(series[0].value, 61.0);
        assert_eq!(series[1].value, 62.0);
    }
}
