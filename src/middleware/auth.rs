// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Authenticated user extracted from the session token.
///
/// Only `require_auth` inserts this; handlers read it via `Extension`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// Middleware that requires a valid `Authorization: Bearer <token>` header.
///
/// Verification is local (signature + expiry); the identity service is not
/// consulted per request.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers().get(header::AUTHORIZATION))?;
    let claims = state.tokens.verify(token)?;

    request.extensions_mut().insert(AuthUser {
        id: claims.id,
        email: claims.email,
    });

    Ok(next.run(request).await)
}

/// Pull the token out of an `Authorization` header value.
pub fn bearer_token(auth_header: Option<&HeaderValue>) -> Result<&str, AppError> {
    let value = auth_header
        .ok_or(AppError::MissingCredential)?
        .to_str()
        .map_err(|_| AppError::MalformedCredential)?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or(AppError::MalformedCredential)?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return Err(AppError::MalformedCredential);
    }

    Ok(token)
}
