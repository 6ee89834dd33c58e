// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile row and the partial update applied to it.

use crate::error::AppError;
use crate::models::UserMetadata;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;

/// Maximum number of favorite teams a profile may hold.
pub const MAX_FAVORITE_TEAMS: usize = 5;

/// User profile stored in the `user_profiles` table, keyed by identity ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// Ordered, at most `MAX_FAVORITE_TEAMS` entries
    #[serde(default, deserialize_with = "null_as_empty")]
    pub favorite_teams: Vec<String>,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
    /// RFC3339, set when the row is created
    #[serde(default)]
    pub created_at: Option<String>,
    /// RFC3339, bumped on every update
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl UserProfile {
    /// Fresh profile for a newly created identity.
    pub fn new(user_id: impl Into<String>, metadata: &UserMetadata) -> Self {
        Self {
            user_id: user_id.into(),
            username: metadata.username.clone(),
            first_name: metadata.first_name.clone(),
            last_name: metadata.last_name.clone(),
            favorite_teams: Vec::new(),
            profile_pic_url: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Identity-service metadata mirroring this row.
    pub fn metadata(&self) -> UserMetadata {
        UserMetadata {
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            favorite_teams: self.favorite_teams.clone(),
        }
    }

    /// Apply a partial update in place. Absent fields are left untouched.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(username) = &update.username {
            self.username = Some(username.clone());
        }
        if let Some(first_name) = &update.first_name {
            self.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &update.last_name {
            self.last_name = Some(last_name.clone());
        }
        if let Some(teams) = &update.favorite_teams {
            self.favorite_teams = teams.clone();
        }
        if let Some(url) = &update.profile_pic_url {
            self.profile_pic_url = Some(url.clone());
        }
    }
}

/// Validated partial profile update. Serializes only the fields being set,
/// which is also the PATCH body sent to the profile store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite_teams: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_pic_url: Option<String>,
}

/// Raw `PUT /user/profile` body.
///
/// `favorite_teams` is kept as raw JSON so that wrong element types are
/// reported as validation errors instead of body parse failures.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProfileUpdateRequest {
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: Option<String>,
    #[validate(length(max = 100, message = "First name must be at most 100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: Option<String>,
    pub favorite_teams: Option<Value>,
    #[validate(url(message = "Profile picture URL must be a valid URL"))]
    pub profile_pic_url: Option<String>,
}

impl ProfileUpdateRequest {
    /// Validate every field and produce the update to write.
    pub fn into_update(self) -> Result<ProfileUpdate, AppError> {
        self.validate()?;

        let favorite_teams = self
            .favorite_teams
            .as_ref()
            .map(parse_favorite_teams)
            .transpose()?;

        Ok(ProfileUpdate {
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            favorite_teams,
            profile_pic_url: self.profile_pic_url,
        })
    }
}

/// Check a raw `favorite_teams` value: an array of at most five non-blank
/// strings. Names are trimmed, order is kept.
pub fn parse_favorite_teams(value: &Value) -> Result<Vec<String>, AppError> {
    let entries = value
        .as_array()
        .ok_or_else(|| AppError::Validation("Favorite teams must be an array".to_string()))?;

    if entries.len() > MAX_FAVORITE_TEAMS {
        return Err(AppError::Validation(format!(
            "Maximum {} favorite teams allowed",
            MAX_FAVORITE_TEAMS
        )));
    }

    entries
        .iter()
        .map(|entry| match entry.as_str().map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name.to_string()),
            _ => Err(AppError::Validation(
                "Invalid team names provided".to_string(),
            )),
        })
        .collect()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
