// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sports Tracker: account and profile API.
//!
//! Identity (passwords, OAuth) is delegated to a hosted identity service and
//! profiles live in a hosted row store. This crate verifies credentials
//! through those services and issues its own signed session tokens.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod rand_utils;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{IdentityProvider, ProfileStore, TokenIssuer};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub tokens: TokenIssuer,
    pub identity: Arc<dyn IdentityProvider>,
    pub profiles: Arc<dyn ProfileStore>,
}

impl AppState {
    /// Wire the token issuer to the configured signing key.
    pub fn new(
        config: Config,
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        let tokens = TokenIssuer::new(&config.jwt_signing_key);
        Self {
            config,
            tokens,
            identity,
            profiles,
        }
    }
}
