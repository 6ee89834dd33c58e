// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sports Tracker API Server

use sports_tracker::{
    config::{Backend, Config},
    services::{
        IdentityProvider, InMemoryIdentityProvider, InMemoryProfileStore, ProfileStore,
        SupabaseAuth, SupabaseProfileStore,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, backend = ?config.backend, "Starting Sports Tracker API");

    let (identity, profiles) = build_collaborators(&config)?;

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), identity, profiles));

    // Build router
    let app = sports_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Connect to the identity service and profile store for the configured backend.
fn build_collaborators(
    config: &Config,
) -> anyhow::Result<(Arc<dyn IdentityProvider>, Arc<dyn ProfileStore>)> {
    match config.backend {
        Backend::Supabase => {
            let identity: Arc<dyn IdentityProvider> = Arc::new(SupabaseAuth::new(
                &config.supabase_url,
                &config.supabase_anon_key,
            )?);
            let profiles: Arc<dyn ProfileStore> = Arc::new(SupabaseProfileStore::new(
                &config.supabase_url,
                &config.supabase_service_key,
            )?);
            tracing::info!(url = %config.supabase_url, "Supabase clients initialized");
            Ok((identity, profiles))
        }
        Backend::Memory => {
            tracing::warn!("Using in-memory identity and profile backends; data is lost on exit");
            let identity: Arc<dyn IdentityProvider> = Arc::new(InMemoryIdentityProvider::new());
            let profiles: Arc<dyn ProfileStore> = Arc::new(InMemoryProfileStore::new());
            Ok((identity, profiles))
        }
    }
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sports_tracker=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();

    Ok(())
}
