//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API over a fresh in-memory ledger.
//!
//! ## Intended use
//! Useful for development and debugging. Nothing is persisted; the workspace's main
//! `citizen-run` binary adds snapshot loading and saving.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use citizen_core::{
    constants::DEFAULT_REST_ADDR, host_for, InMemoryLedger, RecordVariant, ServiceConfig,
};

/// Main entry point for the citizen REST API server
///
/// # Environment Variables
/// - `CITIZEN_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `CITIZEN_CONFIG`: Path to a YAML service configuration (default: health deployment)
/// - `API_KEY`: When set, every request must carry it in `x-api-key`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration file cannot be read or parsed,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("citizen_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CITIZEN_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    let config = match std::env::var("CITIZEN_CONFIG") {
        Ok(path) => ServiceConfig::load(std::path::Path::new(&path))?,
        Err(_) => ServiceConfig::for_variant(RecordVariant::Health),
    };
    let host = host_for(Arc::new(config), InMemoryLedger::new())?;

    tracing::info!("-- Starting citizen REST API on {} ({} records)", addr, host.variant());

    let app = router(AppState {
        host,
        api_key: std::env::var("API_KEY").ok(),
    });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
