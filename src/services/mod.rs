// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - token issuing and the external collaborators.

pub mod identity;
pub mod memory;
pub mod profile;
pub mod supabase;
pub mod token;

pub use identity::{AuthSession, IdentityError, IdentityProvider};
pub use memory::{InMemoryIdentityProvider, InMemoryProfileStore};
pub use profile::{ProfileStore, StoreError};
pub use supabase::{SupabaseAuth, SupabaseProfileStore};
pub use token::{Claims, TokenIssuer, TOKEN_LIFETIME_SECS};
