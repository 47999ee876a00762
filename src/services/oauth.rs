// SPDX-License-Identifier: MIT

//! OAuth token lifecycle: authorization URLs, code exchange, refresh, and
//! disconnect for every supported provider.
//!
//! Client ids and secrets come from server-side configuration only; the
//! token exchange always runs in this trusted backend context.

use crate::config::Config;
use crate::db::TokenStore;
use crate::error::AppError;
use crate::models::{FitnessToken, Provider, TokenResponse};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_REVOKE_URL: &str = "https://oauth2.googleapis.com/revoke";

const FITBIT_AUTH_URL: &str = "https://www.fitbit.com/oauth2/authorize";
const FITBIT_TOKEN_URL: &str = "https://api.fitbit.com/oauth2/token";
const FITBIT_REVOKE_URL: &str = "https://api.fitbit.com/oauth2/revoke";

/// Scopes requested per provider. Distance on Google Fit needs
/// `fitness.location.read` on top of the activity scope.
const GOOGLE_SCOPES: &str = "https://www.googleapis.com/auth/fitness.activity.read \
                             https://www.googleapis.com/auth/fitness.location.read \
                             https://www.googleapis.com/auth/fitness.heart_rate.read";
const FITBIT_SCOPES: &str = "activity heartrate sleep profile";

/// Endpoint set for one provider's OAuth flow; overridable for tests.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub revoke_url: String,
}

impl ProviderEndpoints {
    fn google() -> Self {
        Self {
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            revoke_url: GOOGLE_REVOKE_URL.to_string(),
        }
    }

    fn fitbit() -> Self {
        Self {
            auth_url: FITBIT_AUTH_URL.to_string(),
            token_url: FITBIT_TOKEN_URL.to_string(),
            revoke_url: FITBIT_REVOKE_URL.to_string(),
        }
    }
}

/// OAuth client configuration for one provider.
#[derive(Debug, Clone)]
struct ProviderApp {
    client_id: String,
    client_secret: String,
    endpoints: ProviderEndpoints,
}

/// Shared refresh locks: one async mutex per `(user, provider)` so
/// concurrent syncs never race a refresh against each other in-process.
type RefreshLocks = DashMap<(Uuid, Provider), Arc<Mutex<()>>>;

/// Token refresh seam for the sync orchestrator; lets tests substitute a
/// stub without a token endpoint.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, user_id: Uuid, provider: Provider) -> Result<FitnessToken, AppError>;
}

/// Manages the OAuth token lifecycle for all providers on top of a
/// [`TokenStore`].
pub struct OAuthService {
    http: reqwest::Client,
    store: Arc<dyn TokenStore>,
    google: ProviderApp,
    fitbit: ProviderApp,
    refresh_locks: RefreshLocks,
}

impl OAuthService {
    pub fn new(config: &Config, http: reqwest::Client, store: Arc<dyn TokenStore>) -> Self {
        Self {
            http,
            store,
            google: ProviderApp {
                client_id: config.google_client_id.clone(),
                client_secret: config.google_client_secret.clone(),
                endpoints: ProviderEndpoints::google(),
            },
            fitbit: ProviderApp {
                client_id: config.fitbit_client_id.clone(),
                client_secret: config.fitbit_client_secret.clone(),
                endpoints: ProviderEndpoints::fitbit(),
            },
            refresh_locks: DashMap::new(),
        }
    }

    /// Override one provider's endpoints (tests point these at a local
    /// mock server).
    pub fn set_endpoints(&mut self, provider: Provider, endpoints: ProviderEndpoints) {
        match provider {
            Provider::GoogleFit => self.google.endpoints = endpoints,
            Provider::Fitbit => self.fitbit.endpoints = endpoints,
        }
    }

    fn app(&self, provider: Provider) -> &ProviderApp {
        match provider {
            Provider::GoogleFit => &self.google,
            Provider::Fitbit => &self.fitbit,
        }
    }

    // ─── Authorization ───────────────────────────────────────────────────

    /// Deterministic authorization URL for the user-agent redirect.
    ///
    /// `state` is the caller's opaque blob (we seal the user id and return
    /// path into it, HMAC-signed, in the routes layer).
    pub fn authorize_url(&self, provider: Provider, redirect_uri: &str, state: &str) -> String {
        let app = self.app(provider);

        match provider {
            // access_type=offline + prompt=consent so Google issues a
            // refresh token on every connect
            Provider::GoogleFit => format!(
                "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent&state={}",
                app.endpoints.auth_url,
                urlencoding::encode(&app.client_id),
                urlencoding::encode(redirect_uri),
                urlencoding::encode(GOOGLE_SCOPES),
                urlencoding::encode(state),
            ),
            Provider::Fitbit => format!(
                "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
                app.endpoints.auth_url,
                urlencoding::encode(&app.client_id),
                urlencoding::encode(redirect_uri),
                urlencoding::encode(FITBIT_SCOPES),
                urlencoding::encode(state),
            ),
        }
    }

    // ─── Token endpoint plumbing ─────────────────────────────────────────

    /// POST to the provider token endpoint. Google takes the client
    /// credentials as form fields; Fitbit wants HTTP Basic auth.
    async fn post_token(
        &self,
        provider: Provider,
        form: &[(&str, &str)],
    ) -> Result<TokenResponse, AppError> {
        let app = self.app(provider);

        let mut request = self.http.post(&app.endpoints.token_url);
        request = match provider {
            Provider::GoogleFit => request.form(
                &[
                    form,
                    &[
                        ("client_id", app.client_id.as_str()),
                        ("client_secret", app.client_secret.as_str()),
                    ],
                ]
                .concat(),
            ),
            Provider::Fitbit => request
                .header(
                    "Authorization",
                    format!("Basic {}", basic_credentials(&app.client_id, &app.client_secret)),
                )
                .form(form),
        };

        let response = request.send().await.map_err(|e| AppError::Auth {
            provider: provider.to_string(),
            message: format!("Token request failed: {}", e),
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(provider = %provider, status = %status, body = %body,
                "Token endpoint returned an error");
            return Err(AppError::Auth {
                provider: provider.to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        response.json().await.map_err(|e| AppError::Auth {
            provider: provider.to_string(),
            message: format!("Failed to parse token response: {}", e),
        })
    }

    /// Exchange an authorization code and persist the resulting token.
    ///
    /// Nothing is written on failure: a failed exchange leaves any prior
    /// connection untouched.
    pub async fn exchange_code(
        &self,
        user_id: Uuid,
        provider: Provider,
        code: &str,
        redirect_uri: &str,
    ) -> Result<FitnessToken, AppError> {
        let response = self
            .post_token(
                provider,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", redirect_uri),
                ],
            )
            .await?;

        let token = response.into_token(Utc::now());
        self.store.save(user_id, provider, &token).await?;

        tracing::info!(user_id = %user_id, provider = %provider,
            "OAuth code exchanged, token stored");

        Ok(token)
    }

    /// Refresh the stored access token for a connection.
    ///
    /// Serialized per `(user, provider)`; after acquiring the lock the
    /// stored token is re-read in case a concurrent sync already
    /// refreshed. Providers that omit `refresh_token` in the response keep
    /// the previously stored one. The store is updated on success only.
    pub async fn refresh_token(
        &self,
        user_id: Uuid,
        provider: Provider,
    ) -> Result<FitnessToken, AppError> {
        let lock = self
            .refresh_locks
            .entry((user_id, provider))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let stored = self
            .store
            .get(user_id, provider)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No {} connection", provider)))?;

        let now = Utc::now();
        if !stored.needs_refresh(now) {
            // A concurrent sync won the race while we waited on the lock
            return Ok(stored);
        }

        let response = self
            .post_token(
                provider,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", stored.refresh_token.as_str()),
                ],
            )
            .await?;

        let updated = stored.apply_refresh(response, now);
        self.store.save(user_id, provider, &updated).await?;

        tracing::info!(user_id = %user_id, provider = %provider, "Token refreshed");

        Ok(updated)
    }

    // ─── Disconnect ──────────────────────────────────────────────────────

    /// Disconnect a provider: best-effort remote revocation, then an
    /// unconditional local delete. A failed revoke call must not leave a
    /// dangling local connection.
    pub async fn disconnect(&self, user_id: Uuid, provider: Provider) -> Result<(), AppError> {
        if let Some(token) = self.store.get(user_id, provider).await? {
            if let Err(e) = self.revoke(provider, &token.access_token).await {
                tracing::warn!(user_id = %user_id, provider = %provider, error = %e,
                    "Remote token revocation failed, deleting local connection anyway");
            }
        }

        self.store.delete(user_id, provider).await?;

        tracing::info!(user_id = %user_id, provider = %provider, "Provider disconnected");

        Ok(())
    }

    async fn revoke(&self, provider: Provider, access_token: &str) -> Result<(), AppError> {
        let app = self.app(provider);

        let mut request = self
            .http
            .post(&app.endpoints.revoke_url)
            .form(&[("token", access_token)]);
        if provider == Provider::Fitbit {
            request = request.header(
                "Authorization",
                format!("Basic {}", basic_credentials(&app.client_id, &app.client_secret)),
            );
        }

        let response = request.send().await.map_err(|e| AppError::ProviderApi {
            provider: provider.to_string(),
            message: format!("Revocation request failed: {}", e),
        })?;

        if !response.status().is_success() {
            return Err(AppError::ProviderApi {
                provider: provider.to_string(),
                message: format!("Revocation returned HTTP {}", response.status()),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl TokenRefresher for OAuthService {
    async fn refresh(&self, user_id: Uuid, provider: Provider) -> Result<FitnessToken, AppError> {
        self.refresh_token(user_id, provider).await
    }
}

fn basic_credentials(client_id: &str, client_secret: &str) -> String {
    STANDARD.encode(format!("{}:{}", client_id, client_secret))
}
