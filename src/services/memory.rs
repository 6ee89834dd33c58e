// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process identity service and profile store.
//!
//! Used by the `memory` backend for local development and by the test
//! suite. Behaves like the hosted services as far as this API can observe:
//! duplicate signups are rejected, refresh tokens rotate on use (retiring
//! the access token issued with them), OAuth codes are single-use.

use crate::models::{Identity, ProfileUpdate, UserMetadata, UserProfile};
use crate::rand_utils::random_hex;
use crate::services::identity::{AuthSession, IdentityError, IdentityProvider};
use crate::services::profile::{ProfileStore, StoreError};
use crate::time_utils::now_rfc3339;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ring::digest::{digest, SHA256};
use std::sync::atomic::{AtomicBool, Ordering};

const MIN_PASSWORD_LEN: usize = 6;
const TOKEN_BYTES: usize = 32;

struct Account {
    identity: Identity,
    password_digest: Vec<u8>,
}

/// What a refresh token was issued with.
struct RefreshGrant {
    user_id: String,
    access_token: String,
}

/// Identity service held in memory.
#[derive(Default)]
pub struct InMemoryIdentityProvider {
    /// Keyed by lowercased email
    accounts: DashMap<String, Account>,
    /// Keyed by user ID
    users: DashMap<String, Identity>,
    metadata: DashMap<String, UserMetadata>,
    /// Token -> user ID
    access_tokens: DashMap<String, String>,
    refresh_tokens: DashMap<String, RefreshGrant>,
    oauth_codes: DashMap<String, String>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a single-use OAuth authorization code for an existing account,
    /// as the hosted service would after a provider redirect.
    pub fn issue_oauth_code(&self, email: &str) -> Option<String> {
        let user_id = self
            .accounts
            .get(&email.to_lowercase())
            .map(|account| account.identity.id.clone())?;
        let code = random_hex(TOKEN_BYTES).ok()?;
        self.oauth_codes.insert(code.clone(), user_id);
        Some(code)
    }

    /// Metadata currently attached to a user.
    pub fn user_metadata(&self, user_id: &str) -> Option<UserMetadata> {
        self.metadata.get(user_id).map(|metadata| metadata.clone())
    }

    fn new_session(&self, identity: Identity) -> Result<AuthSession, IdentityError> {
        let access_token =
            random_hex(TOKEN_BYTES).map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        let refresh_token =
            random_hex(TOKEN_BYTES).map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        self.access_tokens
            .insert(access_token.clone(), identity.id.clone());
        self.refresh_tokens.insert(
            refresh_token.clone(),
            RefreshGrant {
                user_id: identity.id.clone(),
                access_token: access_token.clone(),
            },
        );

        Ok(AuthSession {
            identity,
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
        })
    }

    fn identity_for(&self, user_id: &str) -> Result<Identity, IdentityError> {
        self.users
            .get(user_id)
            .map(|identity| identity.clone())
            .ok_or_else(|| IdentityError::Rejected("User not found".to_string()))
    }
}

fn password_digest(password: &str) -> Vec<u8> {
    digest(&SHA256, password.as_bytes()).as_ref().to_vec()
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &UserMetadata,
    ) -> Result<AuthSession, IdentityError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(IdentityError::Rejected(format!(
                "Password should be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let identity = Identity::new(uuid::Uuid::new_v4().to_string(), email);

        match self.accounts.entry(email.to_lowercase()) {
            Entry::Occupied(_) => {
                return Err(IdentityError::Rejected(
                    "User already registered".to_string(),
                ))
            }
            Entry::Vacant(slot) => {
                slot.insert(Account {
                    identity: identity.clone(),
                    password_digest: password_digest(password),
                });
            }
        }

        self.users.insert(identity.id.clone(), identity.clone());
        self.metadata.insert(identity.id.clone(), metadata.clone());
        self.new_session(identity)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, IdentityError> {
        let identity = self
            .accounts
            .get(&email.to_lowercase())
            .filter(|account| account.password_digest == password_digest(password))
            .map(|account| account.identity.clone())
            .ok_or_else(|| IdentityError::Rejected("Invalid login credentials".to_string()))?;

        self.new_session(identity)
    }

    async fn sign_out(&self, refresh_token: &str) -> Result<(), IdentityError> {
        let (_, grant) = self
            .refresh_tokens
            .remove(refresh_token)
            .ok_or_else(|| IdentityError::Rejected("Invalid Refresh Token".to_string()))?;

        self.access_tokens.retain(|_, owner| owner != &grant.user_id);
        self.refresh_tokens
            .retain(|_, other| other.user_id != grant.user_id);
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<Identity, IdentityError> {
        let user_id = self
            .access_tokens
            .get(access_token)
            .map(|owner| owner.clone())
            .ok_or_else(|| IdentityError::Rejected("Invalid access token".to_string()))?;

        self.identity_for(&user_id)
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
        _code_verifier: Option<&str>,
    ) -> Result<AuthSession, IdentityError> {
        let (_, user_id) = self
            .oauth_codes
            .remove(code)
            .ok_or_else(|| IdentityError::Rejected("invalid flow state".to_string()))?;

        let identity = self.identity_for(&user_id)?;
        self.new_session(identity)
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, IdentityError> {
        let (_, grant) = self
            .refresh_tokens
            .remove(refresh_token)
            .ok_or_else(|| IdentityError::Rejected("Invalid Refresh Token".to_string()))?;
        self.access_tokens.remove(&grant.access_token);

        let identity = self.identity_for(&grant.user_id)?;
        self.new_session(identity)
    }

    async fn update_user_metadata(
        &self,
        access_token: &str,
        metadata: &UserMetadata,
    ) -> Result<(), IdentityError> {
        let identity = self.get_user(access_token).await?;
        self.metadata.insert(identity.id, metadata.clone());
        Ok(())
    }
}

/// Profile rows held in memory.
#[derive(Default)]
pub struct InMemoryProfileStore {
    rows: DashMap<String, UserProfile>,
    fail_writes: AtomicBool,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, simulating a store outage.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("profile store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.rows.get(user_id).map(|row| row.clone()))
    }

    async fn create(&self, profile: &UserProfile) -> Result<UserProfile, StoreError> {
        self.check_writable()?;

        let now = now_rfc3339();
        let mut row = profile.clone();
        row.created_at.get_or_insert_with(|| now.clone());
        row.updated_at.get_or_insert(now);

        match self.rows.entry(row.user_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Backend(format!(
                "duplicate profile for user {}",
                row.user_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(row.clone());
                Ok(row)
            }
        }
    }

    async fn update(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, StoreError> {
        self.check_writable()?;

        let mut row = self.rows.get_mut(user_id).ok_or(StoreError::NotFound)?;
        row.apply(update);
        row.updated_at = Some(now_rfc3339());
        Ok(row.clone())
    }
}
