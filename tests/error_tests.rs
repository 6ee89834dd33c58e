// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use sports_tracker::error::AppError;

#[test]
fn test_status_codes() {
    let cases = [
        (AppError::Validation("x".to_string()), StatusCode::BAD_REQUEST),
        (AppError::SignupFailed("x".to_string()), StatusCode::BAD_REQUEST),
        (AppError::LogoutFailed("x".to_string()), StatusCode::BAD_REQUEST),
        (AppError::AuthenticationFailed, StatusCode::UNAUTHORIZED),
        (AppError::MissingCredential, StatusCode::UNAUTHORIZED),
        (AppError::MalformedCredential, StatusCode::UNAUTHORIZED),
        (AppError::InvalidCredential, StatusCode::UNAUTHORIZED),
        (AppError::IdentityMismatch, StatusCode::UNAUTHORIZED),
        (AppError::NotFound("x".to_string()), StatusCode::NOT_FOUND),
        (AppError::PayloadTooLarge, StatusCode::PAYLOAD_TOO_LARGE),
        (
            AppError::ProfileCreationFailed("x".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            AppError::ProfileUpdateFailed("x".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            AppError::Internal(anyhow::anyhow!("boom")),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, status) in cases {
        assert_eq!(err.status(), status, "{:?}", err);
    }
}

#[test]
fn test_credential_codes_distinguish_failures() {
    assert_eq!(AppError::MissingCredential.code(), "missing_credential");
    assert_eq!(AppError::MalformedCredential.code(), "malformed_credential");
    assert_eq!(AppError::InvalidCredential.code(), "invalid_credential");
    assert_eq!(AppError::IdentityMismatch.code(), "identity_mismatch");
}

#[tokio::test]
async fn test_internal_error_hides_details() {
    let response =
        AppError::ProfileUpdateFailed("connection refused to db.internal:5432".to_string())
            .into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "Profile update failed");
    assert_eq!(body["error"], "profile_update_failed");
    assert!(!bytes.windows(7).any(|w| w == b"db.inte"));
}

#[tokio::test]
async fn test_signup_failure_carries_reason() {
    let response = AppError::SignupFailed("User already registered".to_string()).into_response();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "Signup failed: User already registered");
}
