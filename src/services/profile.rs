// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile store interface (rows keyed by identity ID).

use crate::models::{ProfileUpdate, UserProfile};
use async_trait::async_trait;

/// Profile store errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("profile not found")]
    NotFound,

    #[error("profile store error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Insert a new row. Timestamps are filled in by the store.
    async fn create(&self, profile: &UserProfile) -> Result<UserProfile, StoreError>;

    /// Apply a partial update and return the stored row.
    async fn update(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, StoreError>;
}
