// SPDX-License-Identifier: MIT

//! Pantry-Planner API Server
//!
//! Serves the grocery wallet, buying list, recipe, and meal-planning
//! endpoints on top of the embedded entity store.

use pantry_planner::{config::Config, db::Database, services::ImageStore, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Pantry-Planner API");

    // Initialize the entity store
    let db = Database::new();

    // Initialize image storage
    let images = ImageStore::new(&config.image_dir);
    tracing::info!(dir = %config.image_dir, "Image store initialized");

    // Build shared state
    let state = Arc::new(AppState { config: config.clone(), db, images });

    // Build router
    let app = pantry_planner::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pantry_planner=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
