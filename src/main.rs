//! fuel-ledger server entry point.
//!
//! Loads configuration, opens the record store and starts the Axum HTTP
//! server.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use fuel_ledger::api;
use fuel_ledger::app_state::AppState;
use fuel_ledger::config::{LedgerConfig, LogFormat};
use fuel_ledger::persistence::RecordStore;
use fuel_ledger::service::LedgerService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = LedgerConfig::from_env()
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!(
        addr = %config.listen_addr,
        backend = %config.storage_backend,
        strategy = %config.resolution_strategy,
        "starting fuel-ledger"
    );

    // Build persistence and service layers
    let store = RecordStore::connect(&config)
        .await
        .context("cannot open record store")?;
    let ledger_service = LedgerService::new(
        Arc::new(store),
        config.resolution_strategy,
        config.cache_enabled,
    );

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(config.request_timeout()))
                .layer(CorsLayer::permissive()),
        )
        .with_state(AppState::new(ledger_service));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
