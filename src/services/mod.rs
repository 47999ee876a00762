// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod aggregate;
pub mod mock;
pub mod oauth;
pub mod sync;

pub use oauth::{OAuthService, TokenRefresher};
pub use sync::SyncService;
