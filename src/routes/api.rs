// SPDX-License-Identifier: MIT

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{FitnessData, Provider};
use crate::routes::auth::{callback_url, sign_state};
use crate::services::aggregate;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_WINDOW_DAYS: u32 = 7;
const MAX_WINDOW_DAYS: u32 = 90;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/fitness-data", get(get_fitness_data))
        .route("/api/connections", get(get_connections))
        .route("/api/connections/{provider}/authorize", post(authorize))
        .route("/api/connections/{provider}", delete(disconnect))
}

fn parse_provider(raw: &str) -> Result<Provider> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Unknown provider: {}", raw)))
}

// ─── Fitness Data ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct FitnessDataParams {
    /// Provider to sync; defaults to the user's first connection.
    #[serde(default)]
    provider: Option<String>,
    /// Trailing window length in days (1-90, default 7).
    #[serde(default)]
    days: Option<u32>,
}

/// Latest-day-vs-prior-average deltas, as rounded integer percents.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trends {
    pub steps: i64,
    pub calories: i64,
    pub distance: i64,
    pub active_minutes: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitnessDataResponse {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<FitnessData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trends: Option<Trends>,
}

fn trends_for(data: &FitnessData) -> Trends {
    Trends {
        steps: aggregate::average_trend(&data.steps),
        calories: aggregate::average_trend(&data.calories),
        distance: aggregate::average_trend(&data.distance),
        active_minutes: aggregate::average_trend(&data.active_minutes),
    }
}

/// Sync and aggregate the trailing window for one provider.
async fn get_fitness_data(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<FitnessDataParams>,
) -> Result<Json<FitnessDataResponse>> {
    let days = params
        .days
        .unwrap_or(DEFAULT_WINDOW_DAYS)
        .clamp(1, MAX_WINDOW_DAYS);

    let provider = match params.provider.as_deref() {
        Some(raw) => Some(parse_provider(raw)?),
        // No explicit provider: use the first connected one
        None => state
            .store
            .list_providers(user.user_id)
            .await?
            .into_iter()
            .next(),
    };

    let Some(provider) = provider else {
        return Ok(Json(FitnessDataResponse {
            connected: false,
            data: None,
            trends: None,
        }));
    };

    match state
        .sync
        .get_fitness_data(user.user_id, provider, days)
        .await?
    {
        Some(data) => {
            let trends = trends_for(&data);
            Ok(Json(FitnessDataResponse {
                connected: true,
                data: Some(data),
                trends: Some(trends),
            }))
        }
        None => Ok(Json(FitnessDataResponse {
            connected: false,
            data: None,
            trends: None,
        })),
    }
}

// ─── Connections ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct ConnectionsResponse {
    pub connections: Vec<Provider>,
}

/// List the user's connected providers.
async fn get_connections(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ConnectionsResponse>> {
    let connections = state.store.list_providers(user.user_id).await?;
    Ok(Json(ConnectionsResponse { connections }))
}

#[derive(Deserialize)]
pub struct AuthorizeParams {
    /// Frontend URL to send the browser back to after the OAuth dance.
    /// Defaults to FRONTEND_URL.
    #[serde(default)]
    redirect_uri: Option<String>,
}

#[derive(Serialize)]
pub struct AuthorizeResponse {
    pub url: String,
}

/// Build the provider authorization URL for the dashboard to open. The
/// OAuth state is signed server-side and carries the caller's user id, so
/// the public callback can attribute the code without a session.
async fn authorize(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    Query(params): Query<AuthorizeParams>,
) -> Result<Json<AuthorizeResponse>> {
    let provider = parse_provider(&provider)?;

    let frontend_url = params
        .redirect_uri
        .unwrap_or_else(|| state.config.frontend_url.clone());

    let oauth_state = sign_state(user.user_id, &frontend_url, &state.config.oauth_state_key)?;
    let redirect_uri = callback_url(&headers, provider);
    let url = state.oauth.authorize_url(provider, &redirect_uri, &oauth_state);

    tracing::info!(user_id = %user.user_id, provider = %provider,
        "Issued authorization URL");

    Ok(Json(AuthorizeResponse { url }))
}

#[derive(Serialize)]
pub struct DisconnectResponse {
    pub success: bool,
    pub provider: Provider,
}

/// Disconnect a provider: revoke remotely (best effort) and delete the
/// stored token.
async fn disconnect(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(provider): Path<String>,
) -> Result<Json<DisconnectResponse>> {
    let provider = parse_provider(&provider)?;

    state.oauth.disconnect(user.user_id, provider).await?;

    Ok(Json(DisconnectResponse {
        success: true,
        provider,
    }))
}
