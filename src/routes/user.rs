// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ProfileUpdateRequest, UserProfile};
use crate::services::StoreError;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Profile routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/user/profile", get(get_profile).put(update_profile))
}

/// Profile as returned to the client.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub favorite_teams: Vec<String>,
    pub profile_pic_url: Option<String>,
}

impl ProfileResponse {
    fn new(user: &AuthUser, profile: UserProfile) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            username: profile.username.unwrap_or_default(),
            first_name: profile.first_name.unwrap_or_default(),
            last_name: profile.last_name.unwrap_or_default(),
            favorite_teams: profile.favorite_teams,
            profile_pic_url: profile.profile_pic_url,
        }
    }
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GetProfileResponse {
    pub user: ProfileResponse,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdateProfileResponse {
    pub message: String,
    pub user: ProfileResponse,
}

/// Get current user profile.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<GetProfileResponse>> {
    let profile = state
        .profiles
        .get(&user.id)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Error fetching user profile: {}", e)))?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    Ok(Json(GetProfileResponse {
        user: ProfileResponse::new(&user, profile),
    }))
}

/// Update the current user's profile. Everything is validated before the
/// store is touched.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<ProfileUpdateRequest>, JsonRejection>,
) -> Result<Json<UpdateProfileResponse>> {
    let Json(request) = payload?;
    let update = request.into_update()?;

    let profile = state
        .profiles
        .update(&user.id, &update)
        .await
        .map_err(|e| match e {
            StoreError::NotFound => AppError::NotFound("Profile not found".to_string()),
            StoreError::Backend(reason) => AppError::ProfileUpdateFailed(reason),
        })?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(Json(UpdateProfileResponse {
        message: "Profile updated successfully".to_string(),
        user: ProfileResponse::new(&user, profile),
    }))
}
