// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Built once at startup and carried in `AppState`; nothing reads the
//! environment after that.

use crate::rand_utils::random_hex;
use std::env;
use std::fmt;

/// Minimum accepted length of the JWT signing secret.
pub const MIN_JWT_SECRET_LEN: usize = 32;

const DEFAULT_PORT: u16 = 5001;
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";

/// Where identities and profiles live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Hosted Supabase project (GoTrue + PostgREST)
    Supabase,
    /// In-process stand-ins, for local development
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// `APP_ENV=development` relaxes the signing secret requirement
    pub development: bool,
    /// Frontend URL for OAuth callback redirects
    pub frontend_url: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    pub backend: Backend,
    /// Supabase project URL
    pub supabase_url: String,
    /// Public anon key (identity service calls)
    pub supabase_anon_key: String,
    /// Service key for profile rows; falls back to the anon key
    pub supabase_service_key: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("development", &self.development)
            .field("frontend_url", &self.frontend_url)
            .field("jwt_signing_key", &"<redacted>")
            .field("backend", &self.backend)
            .field("supabase_url", &self.supabase_url)
            .field("supabase_anon_key", &"<redacted>")
            .field("supabase_service_key", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Config for testing only: in-memory backend and a fixed key.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            development: true,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!!".to_vec(),
            backend: Backend::Memory,
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test_anon_key".to_string(),
            supabase_service_key: "test_service_key".to_string(),
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let development = var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("development"))
            .unwrap_or(false);

        let port = match var("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", format!("not a port number: {}", raw)))?,
            None => DEFAULT_PORT,
        };

        let jwt_signing_key = match var("JWT_SECRET") {
            Some(secret) if secret.len() < MIN_JWT_SECRET_LEN => {
                return Err(ConfigError::Invalid(
                    "JWT_SECRET",
                    format!("must be at least {} bytes", MIN_JWT_SECRET_LEN),
                ));
            }
            Some(secret) => secret.into_bytes(),
            None if development => {
                tracing::warn!(
                    "JWT_SECRET not set; generated a secret that will not survive a restart"
                );
                random_hex(64)
                    .map_err(|e| ConfigError::Invalid("JWT_SECRET", e.to_string()))?
                    .into_bytes()
            }
            None => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        let backend = match var("IDENTITY_BACKEND").as_deref() {
            None | Some("supabase") => Backend::Supabase,
            Some("memory") => Backend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid(
                    "IDENTITY_BACKEND",
                    format!("expected 'supabase' or 'memory', got '{}'", other),
                ))
            }
        };

        let (supabase_url, supabase_anon_key) = match backend {
            Backend::Supabase => (
                var("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?,
                var("SUPABASE_ANON_KEY").ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?,
            ),
            Backend::Memory => (
                var("SUPABASE_URL").unwrap_or_default(),
                var("SUPABASE_ANON_KEY").unwrap_or_default(),
            ),
        };
        let supabase_service_key =
            var("SUPABASE_SERVICE_KEY").unwrap_or_else(|| supabase_anon_key.clone());

        Ok(Self {
            port,
            development,
            frontend_url: var("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
            jwt_signing_key,
            backend,
            supabase_url,
            supabase_anon_key,
            supabase_service_key,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
