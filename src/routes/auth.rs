// SPDX-License-Identifier: MIT

//! OAuth callback routes and the signed state parameter.
//!
//! The authorize endpoint (in the protected API) seals the user id and the
//! frontend return URL into the OAuth `state`; the public callback here
//! verifies the signature, exchanges the code, and bounces the browser
//! back to the dashboard.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Redirect,
    routing::get,
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Provider;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Signed states older than this are rejected.
const STATE_MAX_AGE_MILLIS: u128 = 10 * 60 * 1000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/{provider}/callback", get(auth_callback))
}

/// Contents of a verified OAuth state parameter.
#[derive(Debug, PartialEq)]
pub struct AuthState {
    pub user_id: Uuid,
    pub frontend_url: String,
}

/// Seal `user_id` and the return URL into a signed, URL-safe state blob.
///
/// Format before encoding: `user_id|frontend_url|timestamp_hex|sig_hex`.
pub fn sign_state(user_id: Uuid, frontend_url: &str, secret: &[u8]) -> Result<String> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    let payload = format!("{}|{}|{:x}", user_id, frontend_url, timestamp);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature).as_bytes()))
}

/// Verify the HMAC signature and freshness of an OAuth state parameter.
pub fn verify_state(state: &str, secret: &[u8]) -> Option<AuthState> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // "user_id|frontend_url|timestamp_hex|signature_hex"
    let parts: Vec<&str> = state_str.splitn(4, '|').collect();
    if parts.len() != 4 {
        return None;
    }

    let payload = format!("{}|{}|{}", parts[0], parts[1], parts[2]);

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if parts[3] != expected {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued = u128::from_str_radix(parts[2], 16).ok()?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()?
        .as_millis();
    if now.saturating_sub(issued) > STATE_MAX_AGE_MILLIS {
        tracing::warn!("Expired OAuth state parameter");
        return None;
    }

    Some(AuthState {
        user_id: parts[0].parse().ok()?,
        frontend_url: parts[1].to_string(),
    })
}

/// Callback URL the provider redirects to; must match the one used in the
/// authorization request. Derived from the incoming Host header so local
/// and deployed environments both work.
pub fn callback_url(headers: &HeaderMap, provider: Provider) -> String {
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost:8080");

    let scheme = if host.contains("localhost") || host.contains("127.0.0.1") {
        "http"
    } else {
        "https"
    };

    format!("{}://{}{}", scheme, host, provider.callback_path())
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    state: String,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback: verify state, exchange the code, redirect back to the
/// dashboard with `?connected=` on success or `?error=` otherwise.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect> {
    // The path segment is the registered slug ("google-fit", "fitbit")
    let provider: Provider = provider
        .parse()
        .map_err(|_| AppError::NotFound(format!("Unknown provider: {}", provider)))?;

    let Some(auth_state) = verify_state(&params.state, &state.config.oauth_state_key) else {
        // Without a valid state there is no trusted return URL; fall back
        // to the configured frontend.
        tracing::warn!(provider = %provider, "Invalid or tampered OAuth state parameter");
        let redirect = format!("{}?error=invalid_state", state.config.frontend_url);
        return Ok(Redirect::temporary(&redirect));
    };

    if let Some(error) = params.error {
        tracing::warn!(provider = %provider, error = %error, "OAuth error from provider");
        let redirect = format!("{}?error={}", auth_state.frontend_url, urlencoding::encode(&error));
        return Ok(Redirect::temporary(&redirect));
    }

    let Some(code) = params.code else {
        let redirect = format!("{}?error=missing_code", auth_state.frontend_url);
        return Ok(Redirect::temporary(&redirect));
    };

    let redirect_uri = callback_url(&headers, provider);

    match state
        .oauth
        .exchange_code(auth_state.user_id, provider, &code, &redirect_uri)
        .await
    {
        Ok(_) => {
            tracing::info!(user_id = %auth_state.user_id, provider = %provider,
                "Provider connected");
            let redirect = format!(
                "{}?connected={}",
                auth_state.frontend_url,
                provider.slug()
            );
            Ok(Redirect::temporary(&redirect))
        }
        Err(e) => {
            tracing::error!(user_id = %auth_state.user_id, provider = %provider, error = %e,
                "OAuth code exchange failed");
            let redirect = format!("{}?error=exchange_failed", auth_state.frontend_url);
            Ok(Redirect::temporary(&redirect))
        }
    }
}
