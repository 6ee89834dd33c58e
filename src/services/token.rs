// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token issuing and verification.
//!
//! Tokens are HS256 JWTs carrying the identity (`id`, `email`) and a fixed
//! 7 day lifetime. There is no server-side session store: a token is valid
//! exactly when its signature checks out and `exp` has not passed.

use crate::error::AppError;
use crate::models::Identity;
use crate::time_utils::now_unix_secs;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Session token lifetime (7 days).
pub const TOKEN_LIFETIME_SECS: u64 = 7 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identity ID
    pub id: String,
    /// Identity email
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity::new(self.id.clone(), self.email.clone())
    }
}

/// Signs and verifies session tokens with the server secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(signing_key: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(signing_key),
            decoding_key: DecodingKey::from_secret(signing_key),
            validation,
        }
    }

    /// Create a session token for an identity.
    pub fn issue(&self, identity: &Identity) -> Result<String, AppError> {
        self.issue_at(identity, now_unix_secs())
    }

    fn issue_at(&self, identity: &Identity, now: u64) -> Result<String, AppError> {
        if identity.id.is_empty() || identity.email.is_empty() {
            return Err(AppError::Validation(
                "Identity must have a non-empty id and email".to_string(),
            ));
        }

        let claims = Claims {
            id: identity.id.clone(),
            email: identity.email.clone(),
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))
    }

    /// Verify signature, algorithm and expiry, returning the claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                tracing::debug!(error = %e, "Session token rejected");
                AppError::InvalidCredential
            })?;

        Ok(token_data.claims)
    }

    /// Re-issue a still-valid token with a fresh expiry.
    pub fn refresh(&self, token: &str) -> Result<(Identity, String), AppError> {
        let identity = self.verify(token)?.identity();
        let token = self.issue(&identity)?;
        Ok((identity, token))
    }
}

/// Whether an artifact is shaped like a JWT (as opposed to an opaque
/// identity-service refresh token).
pub fn looks_like_jwt(token: &str) -> bool {
    jsonwebtoken::decode_header(token).is_ok()
}
