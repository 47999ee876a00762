// SPDX-License-Identifier: MIT

//! FitSync API Server
//!
//! Connects user accounts to Google Fit and Fitbit over OAuth and serves
//! aggregated daily fitness metrics to the dashboard.

use fitsync::{
    config::Config,
    db::{PgTokenStore, TokenStore},
    models::Provider,
    providers::{http_client, FitbitClient, GoogleFitClient, ProviderClient},
    services::{OAuthService, SyncService},
    AppState,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting FitSync API");

    // Connect to Postgres (token storage)
    let store: Arc<dyn TokenStore> = Arc::new(
        PgTokenStore::connect(&config.database_url)
            .await
            .expect("Failed to connect to database"),
    );
    tracing::info!("Database connected");

    // One HTTP client shared by the OAuth and provider calls
    let http = http_client();

    let oauth = Arc::new(OAuthService::new(&config, http.clone(), store.clone()));

    let mut clients: HashMap<Provider, Arc<dyn ProviderClient>> = HashMap::new();
    clients.insert(
        Provider::GoogleFit,
        Arc::new(GoogleFitClient::new(http.clone())),
    );
    clients.insert(Provider::Fitbit, Arc::new(FitbitClient::new(http)));

    let sync = SyncService::new(store.clone(), oauth.clone(), clients);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        oauth,
        sync,
    });

    // Build router
    let app = fitsync::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fitsync=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
