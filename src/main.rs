// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shirt Collector API Server

use shirt_collector::{
    config::Config,
    db::Database,
    services::{GoogleAuthVerifier, ImageStore},
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const RATE_LIMIT_PRUNE_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        environment = %config.environment,
        "Starting Shirt Collector API"
    );

    let db = Database::connect(&config).await?;
    tracing::info!(backend = ?config.database_backend, "Database initialized");

    let images = ImageStore::from_config(config.cloudinary.as_ref())?;
    let google = Arc::new(GoogleAuthVerifier::new(&config)?);

    let state = Arc::new(AppState::new(config.clone(), db, images, google));

    // Periodically drop expired rate limit windows
    let prune_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            prune_state.api_limiter.prune();
            prune_state.auth_limiter.prune();
        }
    });

    let app = shirt_collector::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("shirt_collector=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
