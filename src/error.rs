// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    extract::rejection::{BytesRejection, JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("No token provided")]
    MissingCredential,

    #[error("Invalid token format")]
    MalformedCredential,

    #[error("Invalid or expired token")]
    InvalidCredential,

    #[error("Token identity does not match the confirmed session")]
    IdentityMismatch,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Signup failed: {0}")]
    SignupFailed(String),

    #[error("Logout failed: {0}")]
    LogoutFailed(String),

    #[error("Profile creation failed: {0}")]
    ProfileCreationFailed(String),

    #[error("Profile update failed: {0}")]
    ProfileUpdateFailed(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::SignupFailed(_) | AppError::LogoutFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::AuthenticationFailed
            | AppError::MissingCredential
            | AppError::MalformedCredential
            | AppError::InvalidCredential
            | AppError::IdentityMismatch => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::ProfileCreationFailed(_)
            | AppError::ProfileUpdateFailed(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::AuthenticationFailed => "authentication_failed",
            AppError::MissingCredential => "missing_credential",
            AppError::MalformedCredential => "malformed_credential",
            AppError::InvalidCredential => "invalid_credential",
            AppError::IdentityMismatch => "identity_mismatch",
            AppError::NotFound(_) => "not_found",
            AppError::PayloadTooLarge => "payload_too_large",
            AppError::SignupFailed(_) => "signup_failed",
            AppError::LogoutFailed(_) => "logout_failed",
            AppError::ProfileCreationFailed(_) => "profile_creation_failed",
            AppError::ProfileUpdateFailed(_) => "profile_update_failed",
            AppError::Internal(_) => "unknown_error",
        }
    }

    /// Message shown to the client. Server-side failures never carry details.
    fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::AuthenticationFailed => "Login failed".to_string(),
            AppError::MissingCredential => "No token provided".to_string(),
            AppError::MalformedCredential => "Invalid token format".to_string(),
            AppError::InvalidCredential | AppError::IdentityMismatch => {
                "Unauthorized".to_string()
            }
            AppError::NotFound(msg) => msg.clone(),
            AppError::PayloadTooLarge => "Request body too large".to_string(),
            AppError::SignupFailed(msg) => format!("Signup failed: {}", msg),
            AppError::LogoutFailed(msg) => format!("Logout failed: {}", msg),
            AppError::ProfileCreationFailed(_) => "Profile creation failed".to_string(),
            AppError::ProfileUpdateFailed(_) => "Profile update failed".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

/// JSON error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
    error: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::ProfileCreationFailed(msg) | AppError::ProfileUpdateFailed(msg) => {
                tracing::error!(error = %msg, code = self.code(), "Profile store write failed");
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
            }
            _ => {}
        }

        let body = ErrorResponse {
            message: self.public_message(),
            error: self.code(),
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge;
        }
        AppError::Validation(rejection.body_text())
    }
}

impl From<BytesRejection> for AppError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::PayloadTooLarge;
        }
        tracing::debug!(error = %rejection.body_text(), "Request body rejected");
        AppError::Validation("Invalid request body".to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Query string rejected");
        AppError::Validation("Invalid query parameters".to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid value for '{}'", field),
                })
            })
            .collect();
        messages.sort();
        messages.dedup();

        AppError::Validation(messages.join("; "))
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
