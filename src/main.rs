use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use citizen_core::{
    Host, InMemoryLedger, RecordVariant, ServiceConfig, Snapshot, constants::DEFAULT_REST_ADDR,
    host_for,
};

/// Main entry point for the citizen records service
///
/// Serves the REST API over an in-memory ledger, optionally seeded from and saved back to a
/// snapshot file.
///
/// # Environment Variables
/// - `CITIZEN_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CITIZEN_CONFIG`: YAML service configuration (default: health deployment)
/// - `CITIZEN_LEDGER_FILE`: Ledger snapshot loaded at startup and written on shutdown
/// - `API_KEY`: When set, required in the `x-api-key` header of every request
///
/// # Returns
/// * `Ok(())` - If the server runs and shuts down cleanly
/// * `Err(anyhow::Error)` - If startup, serving or the final snapshot write fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("citizen=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("CITIZEN_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());
    let ledger_file = std::env::var_os("CITIZEN_LEDGER_FILE").map(PathBuf::from);

    let config = match std::env::var_os("CITIZEN_CONFIG") {
        Some(path) => ServiceConfig::load(&PathBuf::from(path))?,
        None => ServiceConfig::for_variant(RecordVariant::Health),
    };

    let ledger = match &ledger_file {
        Some(path) => {
            let snapshot = Snapshot::read_from(path)?;
            tracing::info!("++ Loaded {} keys from {}", snapshot.len(), path.display());
            InMemoryLedger::from_snapshot(snapshot)
        }
        None => InMemoryLedger::new(),
    };
    let host = host_for(Arc::new(config), ledger)?;

    tracing::info!(
        "++ Starting citizen REST on {} ({} records)",
        rest_addr,
        host.variant()
    );

    let app = router(AppState {
        host: Arc::clone(&host),
        api_key: std::env::var("API_KEY").ok(),
    });

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(path) = &ledger_file {
        save_snapshot(host.as_ref(), path)?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("-- Shutting down");
}

fn save_snapshot(host: &dyn Host, path: &std::path::Path) -> anyhow::Result<()> {
    let snapshot = host.snapshot()?;
    snapshot.write_to(path)?;
    tracing::info!("-- Saved {} keys to {}", snapshot.len(), path.display());
    Ok(())
}
