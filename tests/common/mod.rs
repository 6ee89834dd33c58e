// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, Response};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use sports_tracker::config::Config;
use sports_tracker::routes::create_router;
use sports_tracker::services::{
    IdentityProvider, InMemoryIdentityProvider, InMemoryProfileStore, ProfileStore,
};
use sports_tracker::AppState;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Test app plus handles on its in-memory collaborators.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub identity: Arc<InMemoryIdentityProvider>,
    pub profiles: Arc<InMemoryProfileStore>,
}

/// Create a test app backed by in-memory collaborators.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    let identity = Arc::new(InMemoryIdentityProvider::new());
    let profiles = Arc::new(InMemoryProfileStore::new());
    create_test_app_with(identity.clone(), identity, profiles)
}

/// Create a test app whose router talks to `provider`, which may wrap the
/// in-memory identity service.
#[allow(dead_code)]
pub fn create_test_app_with(
    provider: Arc<dyn IdentityProvider>,
    identity: Arc<InMemoryIdentityProvider>,
    profiles: Arc<InMemoryProfileStore>,
) -> TestApp {
    let state = Arc::new(AppState::new(
        Config::test_default(),
        provider,
        profiles.clone() as Arc<dyn ProfileStore>,
    ));

    TestApp {
        router: create_router(state.clone()),
        state,
        identity,
        profiles,
    }
}

/// Create a session token signed with `signing_key`, expiring `ttl_secs`
/// from now (negative for an already expired token).
#[allow(dead_code)]
pub fn create_test_jwt(id: &str, email: &str, ttl_secs: i64, signing_key: &[u8]) -> String {
    #[derive(Serialize)]
    struct Claims<'a> {
        id: &'a str,
        email: &'a str,
        iat: i64,
        exp: i64,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    encode(
        &Header::new(Algorithm::HS256),
        &Claims {
            id,
            email,
            iat: now,
            exp: now + ttl_secs,
        },
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}

/// Build a JSON request.
#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Build a JSON request carrying a bearer token.
#[allow(dead_code)]
pub fn authed_request(
    method: &str,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
