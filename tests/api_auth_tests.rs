// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without valid tokens, with a code
//!    that says why
//! 2. Protected routes accept requests with valid tokens
//! 3. CORS preflight requests return correct headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

use common::{body_json, create_test_app, create_test_jwt};

const USER_ID: &str = "0b9d6a4e-2f1c-4f57-9d37-5a1f0c6f1e01";

fn profile_request(auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri("/user/profile");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = create_test_app();

    let response = app.router.oneshot(profile_request(None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "missing_credential");
    assert_eq!(body["message"], "No token provided");
}

#[tokio::test]
async fn test_protected_route_with_malformed_header() {
    for auth in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer ", "Token abc.def.ghi"] {
        let app = create_test_app();

        let response = app
            .router
            .oneshot(profile_request(Some(auth)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", auth);
        let body = body_json(response).await;
        assert_eq!(body["error"], "malformed_credential", "{}", auth);
    }
}

#[tokio::test]
async fn test_protected_route_with_invalid_token() {
    let app = create_test_app();

    let response = app
        .router
        .oneshot(profile_request(Some("Bearer invalid.token.here")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "invalid_credential");
    assert_eq!(body["message"], "Unauthorized");
}

#[tokio::test]
async fn test_protected_route_with_expired_token() {
    let app = create_test_app();
    let key = app.state.config.jwt_signing_key.clone();
    let token = create_test_jwt(USER_ID, "a@x.com", -60, &key);

    let response = app
        .router
        .oneshot(profile_request(Some(&format!("Bearer {}", token))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "invalid_credential");
}

#[tokio::test]
async fn test_protected_route_with_wrong_secret() {
    let app = create_test_app();
    let token = create_test_jwt(
        USER_ID,
        "a@x.com",
        3600,
        b"some_other_key_that_is_32_bytes!",
    );

    let response = app
        .router
        .oneshot(profile_request(Some(&format!("Bearer {}", token))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "invalid_credential");
}

#[tokio::test]
async fn test_protected_route_with_valid_token() {
    let app = create_test_app();
    let key = app.state.config.jwt_signing_key.clone();
    let token = create_test_jwt(USER_ID, "a@x.com", 3600, &key);

    let response = app
        .router
        .oneshot(profile_request(Some(&format!("Bearer {}", token))))
        .await
        .unwrap();

    // Auth passes; there is simply no profile row for this user.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "Profile not found");
}

#[tokio::test]
async fn test_lowercase_bearer_scheme_accepted() {
    let app = create_test_app();
    let key = app.state.config.jwt_signing_key.clone();
    let token = create_test_jwt(USER_ID, "a@x.com", 3600, &key);

    let response = app
        .router
        .oneshot(profile_request(Some(&format!("bearer {}", token))))
        .await
        .unwrap();

    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = create_test_app();

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/user/profile")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // OPTIONS should return 200 (CORS preflight success)
    assert_eq!(response.status(), StatusCode::OK);

    // Should have CORS headers
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}

#[tokio::test]
async fn test_cors_rejects_unknown_origin() {
    let app = create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .header(header::ORIGIN, "https://evil.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(!response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

    // Hosts that merely start with a local dev host are not local.
    for origin in [
        "http://localhost.attacker.example",
        "http://127.0.0.1.attacker.example",
    ] {
        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/user/profile")
                    .header(header::ORIGIN, origin)
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(
            !response
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            "{}",
            origin
        );
    }
}

#[tokio::test]
async fn test_public_routes_no_auth_required() {
    let app = create_test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Health should be accessible without auth
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(body_json(response).await["status"], "ok");

    let response = app
        .router
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        "Sports Tracking API is running!"
    );
}
