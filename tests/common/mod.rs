// SPDX-License-Identifier: MIT

use fitsync::config::Config;
use fitsync::db::{MemoryTokenStore, TokenStore};
use fitsync::models::Provider;
use fitsync::providers::{http_client, FitbitClient, GoogleFitClient, ProviderClient};
use fitsync::routes::create_router;
use fitsync::services::{OAuthService, SyncService};
use fitsync::AppState;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Create a test app backed by an in-memory token store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());

    let http = http_client();
    let oauth = Arc::new(OAuthService::new(&config, http.clone(), store.clone()));

    let mut clients: HashMap<Provider, Arc<dyn ProviderClient>> = HashMap::new();
    clients.insert(
        Provider::GoogleFit,
        Arc::new(GoogleFitClient::new(http.clone())),
    );
    clients.insert(Provider::Fitbit, Arc::new(FitbitClient::new(http)));

    let sync = SyncService::new(store.clone(), oauth.clone(), clients);

    let state = Arc::new(AppState {
        config,
        store,
        oauth,
        sync,
    });

    (create_router(state.clone()), state)
}

/// Bearer token for a test user, signed with the test JWT key.
#[allow(dead_code)]
pub fn bearer_for(user_id: Uuid) -> String {
    let config = Config::test_default();
    let jwt = fitsync::middleware::auth::create_jwt(user_id, &config.jwt_signing_key)
        .expect("JWT creation");
    format!("Bearer {}", jwt)
}
