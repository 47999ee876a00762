// SPDX-License-Identifier: MIT

//! OAuth token model and refresh semantics.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Margin before token expiration when we proactively refresh (5 minutes).
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// OAuth credentials for one `(user, provider)` connection.
///
/// At most one record exists per pair; saves have upsert semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessToken {
    pub access_token: String,
    pub refresh_token: String,
    /// When the access token expires
    pub expires_at: DateTime<Utc>,
}

impl FitnessToken {
    /// True if the access token is expired or expiring within the
    /// proactive refresh margin.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) >= self.expires_at
    }

    /// Merge a token-endpoint response into this token.
    ///
    /// Some providers rotate the refresh token on refresh, some omit it.
    /// When omitted, the previously stored refresh token is preserved.
    pub fn apply_refresh(&self, response: TokenResponse, now: DateTime<Utc>) -> FitnessToken {
        FitnessToken {
            access_token: response.access_token,
            refresh_token: response
                .refresh_token
                .unwrap_or_else(|| self.refresh_token.clone()),
            expires_at: now + Duration::seconds(response.expires_in),
        }
    }
}

/// Wire shape of a provider token endpoint response (code exchange and
/// refresh share it).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
}

impl TokenResponse {
    /// Build a fresh token from a code-exchange response.
    ///
    /// Fitbit always returns a refresh token on exchange; Google only when
    /// `access_type=offline` was requested, which we always do.
    pub fn into_token(self, now: DateTime<Utc>) -> FitnessToken {
        FitnessToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token.unwrap_or_default(),
            expires_at: now + Duration::seconds(self.expires_in),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_token() -> FitnessToken {
        FitnessToken {
            access_token: "old_access".to_string(),
            refresh_token: "old_refresh".to_string(),
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn test_refresh_rotates_refresh_token_when_present() {
        let now = Utc::now();
        let updated = stored_token().apply_refresh(
            TokenResponse {
                access_token: "new_access".to_string(),
                refresh_token: Some("new_refresh".to_string()),
                expires_in: 3600,
            },
            now,
        );

        assert_eq!(updated.access_token, "new_access");
        assert_eq!(updated.refresh_token, "new_refresh");
        assert_eq!(updated.expires_at, now + Duration::seconds(3600));
    }

    #[test]
    fn test_refresh_preserves_refresh_token_when_omitted() {
        let now = Utc::now();
        let updated = stored_token().apply_refresh(
            TokenResponse {
                access_token: "new_access".to_string(),
                refresh_token: None,
                expires_in: 3600,
            },
            now,
        );

        assert_eq!(updated.access_token, "new_access");
        assert_eq!(updated.refresh_token, "old_refresh");
    }

    #[test]
    fn test_needs_refresh_uses_margin() {
        let now = Utc::now();
        let mut token = stored_token();

        token.expires_at = now - Duration::seconds(10);
        assert!(token.needs_refresh(now));

        // Inside the 5-minute margin still counts as expiring
        token.expires_at = now + Duration::seconds(60);
        assert!(token.needs_refresh(now));

        token.expires_at = now + Duration::seconds(3600);
        assert!(!token.needs_refresh(now));
    }
}
