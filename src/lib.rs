// SPDX-License-Identifier: MIT

//! FitSync: backend sync adapter between fitness providers and the
//! dashboard.
//!
//! This crate provides the API for connecting Google Fit and Fitbit
//! accounts over OAuth and serving aggregated daily activity metrics.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod providers;
pub mod routes;
pub mod services;

use config::Config;
use db::TokenStore;
use services::{OAuthService, SyncService};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn TokenStore>,
    pub oauth: Arc<OAuthService>,
    pub sync: SyncService,
}
