// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! External identity service interface.
//!
//! Password storage, credential checks and OAuth code exchange all live in
//! the identity service. This module defines what the API consumes from it.

use crate::models::{Identity, UserMetadata};
use async_trait::async_trait;

/// Session returned by the identity service.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub identity: Identity,
    /// Identity-service access token. Used for live confirmation and
    /// sign-out only; never handed to clients.
    pub access_token: Option<String>,
    /// Opaque refresh token, passed through to clients.
    pub refresh_token: Option<String>,
}

/// Identity service error categories.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IdentityError {
    /// The service refused the request (bad credentials, duplicate account,
    /// expired code or token).
    #[error("rejected by identity service: {0}")]
    Rejected(String),
    /// Transport failure, 5xx, or an unparseable response.
    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

/// Operations consumed from the identity service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account with user metadata attached.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &UserMetadata,
    ) -> Result<AuthSession, IdentityError>;

    /// Check an email/password pair.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, IdentityError>;

    /// End the identity-service session that owns `refresh_token`.
    async fn sign_out(&self, refresh_token: &str) -> Result<(), IdentityError>;

    /// Look up the user behind an identity-service access token.
    async fn get_user(&self, access_token: &str) -> Result<Identity, IdentityError>;

    /// Exchange an OAuth authorization code for a session.
    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<AuthSession, IdentityError>;

    /// Trade a refresh token for a new session (the refresh token rotates).
    /// This is also how the current session is obtained server-side: there
    /// is no client session cache to read.
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, IdentityError>;

    /// Overwrite the metadata attached to the user behind `access_token`.
    async fn update_user_metadata(
        &self,
        access_token: &str,
        metadata: &UserMetadata,
    ) -> Result<(), IdentityError>;
}
