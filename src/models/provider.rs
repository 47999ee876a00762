// SPDX-License-Identifier: MIT

//! Supported fitness data providers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A third-party fitness data source.
///
/// The string form (`google_fit`, `fitbit`) is used as the database key and
/// in API routes; the slug form (`google-fit`, `fitbit`) appears in the
/// registered OAuth redirect URIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    GoogleFit,
    Fitbit,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::GoogleFit, Provider::Fitbit];

    /// Stable identifier, used as the `provider` column value.
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::GoogleFit => "google_fit",
            Provider::Fitbit => "fitbit",
        }
    }

    /// URL path segment used in OAuth redirect URIs.
    pub fn slug(self) -> &'static str {
        match self {
            Provider::GoogleFit => "google-fit",
            Provider::Fitbit => "fitbit",
        }
    }

    /// OAuth callback path relative to the API origin. Must exactly match
    /// the redirect URI registered with the provider.
    pub fn callback_path(self) -> String {
        format!("/auth/{}/callback", self.slug())
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ();

    /// Accepts both the identifier and the URL slug form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "google_fit" | "google-fit" => Ok(Provider::GoogleFit),
            "fitbit" => Ok(Provider::Fitbit),
            _ => Err(()),
        }
    }
}
