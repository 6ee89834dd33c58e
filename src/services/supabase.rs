// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Supabase clients for the identity service (GoTrue) and the profile
//! table (PostgREST).
//!
//! Handles:
//! - Signup, password sign-in, refresh and PKCE code exchange
//! - Access-token user lookup, metadata update and sign-out
//! - `user_profiles` select/insert/update filtered on `user_id`

use crate::models::{Identity, ProfileUpdate, UserMetadata, UserProfile};
use crate::services::identity::{AuthSession, IdentityError, IdentityProvider};
use crate::services::profile::{ProfileStore, StoreError};
use crate::time_utils::now_rfc3339;
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const PROFILES_TABLE: &str = "user_profiles";

fn build_http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("failed building Supabase HTTP client")
}

fn canonicalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

// ─── Identity service (GoTrue) ───────────────────────────────────────────────

/// GoTrue REST client.
#[derive(Clone)]
pub struct SupabaseAuth {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseAuth {
    /// Create a client for `{base_url}/auth/v1` using the project's anon key.
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        Ok(Self {
            http: build_http_client()?,
            base_url: canonicalize_base_url(base_url),
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// POST to the token endpoint with the given grant.
    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<AuthSession, IdentityError> {
        let response = self
            .http
            .post(self.endpoint("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let session: GoTrueSession = check_identity_response_json(response).await?;
        Ok(session.into())
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuth {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &UserMetadata,
    ) -> Result<AuthSession, IdentityError> {
        let response = self
            .http
            .post(self.endpoint("signup"))
            .header("apikey", &self.api_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": metadata,
            }))
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        // With email confirmation enabled GoTrue answers with the bare user
        // and no session.
        match check_identity_response_json(response).await? {
            GoTrueSignUpResponse::Session(session) => Ok(session.into()),
            GoTrueSignUpResponse::User(user) => Ok(AuthSession {
                identity: user.into(),
                access_token: None,
                refresh_token: None,
            }),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, IdentityError> {
        self.token_grant(
            "password",
            json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn sign_out(&self, refresh_token: &str) -> Result<(), IdentityError> {
        // Logout is keyed on an access token, so trade the refresh token first.
        let session = self.refresh_session(refresh_token).await?;
        let access_token = session.access_token.ok_or_else(|| {
            IdentityError::Unavailable("refresh response had no access token".to_string())
        })?;

        let response = self
            .http
            .post(self.endpoint("logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        check_identity_response(response).await?;
        tracing::info!(user_id = %session.identity.id, "Identity service session signed out");
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<Identity, IdentityError> {
        let response = self
            .http
            .get(self.endpoint("user"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let user: GoTrueUser = check_identity_response_json(response).await?;
        Ok(user.into())
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<AuthSession, IdentityError> {
        self.token_grant(
            "pkce",
            json!({
                "auth_code": code,
                "code_verifier": code_verifier.unwrap_or_default(),
            }),
        )
        .await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, IdentityError> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn update_user_metadata(
        &self,
        access_token: &str,
        metadata: &UserMetadata,
    ) -> Result<(), IdentityError> {
        let response = self
            .http
            .put(self.endpoint("user"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .json(&json!({ "data": metadata }))
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        check_identity_response(response).await?;
        Ok(())
    }
}

/// Session returned by GoTrue token grants.
#[derive(Debug, Deserialize)]
struct GoTrueSession {
    access_token: String,
    refresh_token: String,
    user: GoTrueUser,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GoTrueSignUpResponse {
    Session(GoTrueSession),
    User(GoTrueUser),
}

/// GoTrue reports errors under different keys depending on the endpoint.
#[derive(Debug, Default, Deserialize)]
struct GoTrueErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl GoTrueErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.error_description)
            .or(self.message)
            .or(self.error)
    }
}

impl From<GoTrueUser> for Identity {
    fn from(user: GoTrueUser) -> Self {
        Identity::new(user.id, user.email.unwrap_or_default())
    }
}

impl From<GoTrueSession> for AuthSession {
    fn from(session: GoTrueSession) -> Self {
        AuthSession {
            identity: session.user.into(),
            access_token: Some(session.access_token),
            refresh_token: Some(session.refresh_token),
        }
    }
}

/// Check response status: 4xx is a rejection, anything else unsuccessful
/// means the service is unavailable.
async fn check_identity_response(
    response: reqwest::Response,
) -> Result<reqwest::Response, IdentityError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();

    if status.is_client_error() {
        let message = serde_json::from_str::<GoTrueErrorBody>(&body)
            .ok()
            .and_then(GoTrueErrorBody::into_message)
            .unwrap_or_else(|| format!("HTTP {}", status));
        return Err(IdentityError::Rejected(message));
    }

    tracing::warn!(status = %status, "Identity service error response");
    Err(IdentityError::Unavailable(format!("HTTP {}: {}", status, body)))
}

/// Check response and parse JSON body.
async fn check_identity_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, IdentityError> {
    check_identity_response(response)
        .await?
        .json()
        .await
        .map_err(|e| IdentityError::Unavailable(format!("JSON parse error: {}", e)))
}

// ─── Profile store (PostgREST) ───────────────────────────────────────────────

/// `user_profiles` table client.
#[derive(Clone)]
pub struct SupabaseProfileStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseProfileStore {
    /// Create a client for `{base_url}/rest/v1`. `api_key` should be the
    /// service key so row writes are not subject to client policies.
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        Ok(Self {
            http: build_http_client()?,
            base_url: canonicalize_base_url(base_url),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, PROFILES_TABLE)
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn user_filter(user_id: &str) -> [(&'static str, String); 2] {
        [
            ("user_id", format!("eq.{}", user_id)),
            ("select", "*".to_string()),
        ]
    }
}

#[derive(Serialize)]
struct ProfilePatch<'a> {
    #[serde(flatten)]
    update: &'a ProfileUpdate,
    updated_at: String,
}

#[async_trait]
impl ProfileStore for SupabaseProfileStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let response = self
            .request(reqwest::Method::GET)
            .query(&Self::user_filter(user_id))
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows: Vec<UserProfile> = check_store_response_json(response).await?;
        Ok(rows.into_iter().next())
    }

    async fn create(&self, profile: &UserProfile) -> Result<UserProfile, StoreError> {
        let now = now_rfc3339();
        let mut row = profile.clone();
        row.created_at.get_or_insert_with(|| now.clone());
        row.updated_at.get_or_insert(now);

        let response = self
            .request(reqwest::Method::POST)
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows: Vec<UserProfile> = check_store_response_json(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("insert returned no rows".to_string()))
    }

    async fn update(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, StoreError> {
        let patch = ProfilePatch {
            update,
            updated_at: now_rfc3339(),
        };

        let response = self
            .request(reqwest::Method::PATCH)
            .query(&Self::user_filter(user_id))
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        // PATCH on a missing row succeeds with an empty array.
        let rows: Vec<UserProfile> = check_store_response_json(response).await?;
        rows.into_iter().next().ok_or(StoreError::NotFound)
    }
}

async fn check_store_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, StoreError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Backend(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| StoreError::Backend(format!("JSON parse error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_message_precedence() {
        let body: GoTrueErrorBody = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        )
        .unwrap();
        assert_eq!(
            body.into_message().as_deref(),
            Some("Invalid login credentials")
        );

        let body: GoTrueErrorBody =
            serde_json::from_str(r#"{"code":422,"msg":"User already registered"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("User already registered"));
    }

    #[test]
    fn test_signup_response_variants() {
        let session: GoTrueSignUpResponse = serde_json::from_str(
            r#"{"access_token":"at","refresh_token":"rt","user":{"id":"u1","email":"a@x.com"}}"#,
        )
        .unwrap();
        assert!(matches!(session, GoTrueSignUpResponse::Session(_)));

        let user: GoTrueSignUpResponse =
            serde_json::from_str(r#"{"id":"u1","email":"a@x.com","aud":"authenticated"}"#)
                .unwrap();
        assert!(matches!(user, GoTrueSignUpResponse::User(_)));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let auth = SupabaseAuth::new("https://project.supabase.co/", "anon").unwrap();
        assert_eq!(
            auth.endpoint("signup"),
            "https://project.supabase.co/auth/v1/signup"
        );

        let store = SupabaseProfileStore::new("https://project.supabase.co//", "svc").unwrap();
        assert_eq!(
            store.table_url(),
            "https://project.supabase.co/rest/v1/user_profiles"
        );
    }
}
