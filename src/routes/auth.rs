// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account and session routes: signup, login, logout, token refresh and the
//! OAuth callback.

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::models::{Identity, UserMetadata, UserProfile};
use crate::services::token::looks_like_jwt;
use crate::services::{AuthSession, IdentityError};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/refresh-token", post(refresh_token))
        .route("/auth/callback", get(auth_callback))
}

// ─── Request / Response Bodies ───────────────────────────────

/// Signup body. Only email and password are required.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[serde(default)]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: Option<String>,
    #[validate(length(max = 100, message = "First name must be at most 100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    /// Identity-service refresh token whose session should be ended.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Either a session token issued here or an identity-service refresh token.
    #[serde(rename = "refreshToken", alias = "refresh_token", default)]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    /// PKCE verifier, when the client started the flow with one.
    code_verifier: Option<String>,
}

/// Successful authentication response.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthResponse {
    pub message: String,
    pub user: Identity,
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl AuthResponse {
    fn new(message: &str, user: Identity, token: String, refresh_token: Option<String>) -> Self {
        Self {
            message: message.to_string(),
            user,
            token,
            refresh_token,
        }
    }
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MessageResponse {
    pub message: String,
}

// ─── Handlers ────────────────────────────────────────────────

/// Create an account, its profile row, and a session token.
async fn signup(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let Json(request) = payload?;
    request.validate()?;

    let metadata = UserMetadata {
        username: request.username,
        first_name: request.first_name,
        last_name: request.last_name,
        favorite_teams: Vec::new(),
    };

    let session = state
        .identity
        .sign_up(&request.email, &request.password, &metadata)
        .await
        .map_err(|e| map_identity_error(e, AppError::SignupFailed))?;

    tracing::info!(user_id = %session.identity.id, "Account created");

    // No rollback if this fails: the account stays without a profile row.
    let profile = UserProfile::new(session.identity.id.clone(), &metadata);
    if let Err(e) = state.profiles.create(&profile).await {
        tracing::error!(
            user_id = %session.identity.id,
            error = %e,
            "Account created but profile row was not"
        );
        return Err(AppError::ProfileCreationFailed(e.to_string()));
    }

    let token = state.tokens.issue(&session.identity)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::new(
            "Signup successful",
            session.identity,
            token,
            session.refresh_token,
        )),
    ))
}

/// Check credentials with the identity service and issue a session token.
async fn login(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(request) = payload?;
    request.validate()?;

    let session = state
        .identity
        .sign_in_with_password(&request.email, &request.password)
        .await
        .map_err(|e| map_identity_error(e, |_| AppError::AuthenticationFailed))?;

    let token = state.tokens.issue(&session.identity)?;
    tracing::info!(user_id = %session.identity.id, "Login successful");

    Ok(Json(AuthResponse::new(
        "Login successful",
        session.identity,
        token,
        session.refresh_token,
    )))
}

/// Logout. Session tokens are stateless, so the client just drops its
/// token; an identity-service refresh token in the body is signed out.
async fn logout(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<MessageResponse>> {
    let body = body?;
    let request: LogoutRequest = if body.is_empty() {
        LogoutRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid JSON body: {}", e)))?
    };

    if let Some(refresh_token) = request.refresh_token.as_deref().filter(|t| !t.is_empty()) {
        state
            .identity
            .sign_out(refresh_token)
            .await
            .map_err(|e| map_identity_error(e, AppError::LogoutFailed))?;
    }

    Ok(Json(MessageResponse {
        message: "Logout successful".to_string(),
    }))
}

/// Mint a new session token from either a still-valid session token or an
/// identity-service refresh token.
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(request) = payload?;
    let presented = request.refresh_token.trim();

    if presented.is_empty() {
        return Err(AppError::Validation(
            "Refresh token is required".to_string(),
        ));
    }

    if looks_like_jwt(presented) {
        let (identity, token) = state.tokens.refresh(presented)?;
        tracing::debug!(user_id = %identity.id, "Session token re-issued");
        return Ok(Json(AuthResponse::new("Token refreshed", identity, token, None)));
    }

    let session = state
        .identity
        .refresh_session(presented)
        .await
        .map_err(|e| map_identity_error(e, |_| AppError::InvalidCredential))?;

    let identity = confirm_session(&state, &session).await?;
    sync_metadata(&state, &session, &identity).await;
    let token = state.tokens.issue(&identity)?;
    tracing::debug!(user_id = %identity.id, "Session token issued from refresh token");

    Ok(Json(AuthResponse::new(
        "Token refreshed",
        identity,
        token,
        session.refresh_token,
    )))
}

/// OAuth callback - exchange code for a session, redirect to the dashboard.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    params: std::result::Result<Query<CallbackParams>, QueryRejection>,
) -> Result<Redirect> {
    let Query(params) = params?;
    let code = params
        .code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("No authorization code provided".to_string()))?;

    tracing::info!("Exchanging authorization code for session");

    let session = state
        .identity
        .exchange_code_for_session(code, params.code_verifier.as_deref())
        .await
        .map_err(|e| map_identity_error(e, |_| AppError::AuthenticationFailed))?;

    let identity = confirm_session(&state, &session).await?;
    ensure_profile(&state, &identity).await?;
    sync_metadata(&state, &session, &identity).await;

    let token = state.tokens.issue(&identity)?;
    tracing::info!(user_id = %identity.id, "OAuth login successful");

    let redirect_url = dashboard_redirect_url(
        &state.config.frontend_url,
        &token,
        session.refresh_token.as_deref(),
    );

    Ok(Redirect::temporary(&redirect_url))
}

// ─── Helpers ─────────────────────────────────────────────────

/// Map an identity-service failure. Rejections become the caller's domain
/// error; outages become a generic 500.
fn map_identity_error(err: IdentityError, rejected: impl FnOnce(String) -> AppError) -> AppError {
    match err {
        IdentityError::Rejected(reason) => {
            tracing::info!(reason = %reason, "Identity service rejected request");
            rejected(reason)
        }
        IdentityError::Unavailable(reason) => {
            AppError::Internal(anyhow::anyhow!("identity service unavailable: {}", reason))
        }
    }
}

/// Re-check a fresh identity-service session with a live user lookup and
/// require both to name the same user.
async fn confirm_session(state: &AppState, session: &AuthSession) -> Result<Identity> {
    let access_token = session
        .access_token
        .as_deref()
        .ok_or(AppError::InvalidCredential)?;

    let confirmed = state
        .identity
        .get_user(access_token)
        .await
        .map_err(|e| map_identity_error(e, |_| AppError::InvalidCredential))?;

    if confirmed.id != session.identity.id {
        tracing::warn!(
            session_user = %session.identity.id,
            confirmed_user = %confirmed.id,
            "Identity mismatch between session and live lookup"
        );
        return Err(AppError::IdentityMismatch);
    }

    Ok(confirmed)
}

/// OAuth sign-ins may be the first time we see a user; give them a profile.
async fn ensure_profile(state: &AppState, identity: &Identity) -> Result<()> {
    let existing = state
        .profiles
        .get(&identity.id)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Error fetching user profile: {}", e)))?;

    if existing.is_some() {
        return Ok(());
    }

    let profile = UserProfile::new(identity.id.clone(), &UserMetadata::default());
    state.profiles.create(&profile).await.map_err(|e| {
        tracing::error!(user_id = %identity.id, error = %e, "Profile creation after OAuth failed");
        AppError::ProfileCreationFailed(e.to_string())
    })?;

    tracing::info!(user_id = %identity.id, "Profile created for OAuth user");
    Ok(())
}

/// Push the profile row into the identity-service metadata. Profile edits
/// only reach the row, so this runs whenever a live identity-service session
/// is at hand. Failures are logged and never fail the request.
async fn sync_metadata(state: &AppState, session: &AuthSession, identity: &Identity) {
    let Some(access_token) = session.access_token.as_deref() else {
        return;
    };

    let profile = match state.profiles.get(&identity.id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(user_id = %identity.id, error = %e, "Metadata sync skipped");
            return;
        }
    };

    if let Err(e) = state
        .identity
        .update_user_metadata(access_token, &profile.metadata())
        .await
    {
        tracing::warn!(user_id = %identity.id, error = %e, "Metadata sync failed");
    }
}

fn dashboard_redirect_url(frontend_url: &str, token: &str, refresh_token: Option<&str>) -> String {
    let mut url = format!(
        "{}/dashboard?token={}",
        frontend_url.trim_end_matches('/'),
        urlencoding::encode(token)
    );
    if let Some(refresh_token) = refresh_token {
        url.push_str("&refresh_token=");
        url.push_str(&urlencoding::encode(refresh_token));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_redirect_url() {
        assert_eq!(
            dashboard_redirect_url("http://localhost:5173/", "a.b.c", Some("r t")),
            "http://localhost:5173/dashboard?token=a.b.c&refresh_token=r%20t"
        );
        assert_eq!(
            dashboard_redirect_url("https://app.example.com", "a.b.c", None),
            "https://app.example.com/dashboard?token=a.b.c"
        );
    }

    #[test]
    fn test_refresh_request_accepts_both_spellings() {
        let camel: RefreshRequest = serde_json::from_str(r#"{"refreshToken":"abc"}"#).unwrap();
        let snake: RefreshRequest = serde_json::from_str(r#"{"refresh_token":"abc"}"#).unwrap();
        assert_eq!(camel.refresh_token, "abc");
        assert_eq!(snake.refresh_token, "abc");
    }

    #[test]
    fn test_signup_validation_messages() {
        let request: SignupRequest =
            serde_json::from_str(r#"{"email":"not-an-email","password":""}"#).unwrap();
        let err = AppError::from(request.validate().unwrap_err());
        let message = err.to_string();
        assert!(message.contains("A valid email is required"));
        assert!(message.contains("Email and password are required"));
    }

    #[test]
    fn test_map_identity_error() {
        assert!(matches!(
            map_identity_error(
                IdentityError::Rejected("User already registered".to_string()),
                AppError::SignupFailed
            ),
            AppError::SignupFailed(reason) if reason == "User already registered"
        ));
        assert!(matches!(
            map_identity_error(
                IdentityError::Unavailable("timeout".to_string()),
                AppError::SignupFailed
            ),
            AppError::Internal(_)
        ));
    }
}
