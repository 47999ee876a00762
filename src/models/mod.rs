// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod metrics;
pub mod provider;
pub mod token;

pub use metrics::{DailyMetricPoint, DataSource, FitnessData, Metric, RawSample};
pub use provider::Provider;
pub use token::{FitnessToken, TokenResponse};
