//! System endpoints: health check and strategy catalog.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::ResolutionStrategy;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    storage_backend: String,
    strategy: String,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, storage backend and configured strategy.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let service = &state.ledger_service;
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            storage_backend: service.store().backend().to_string(),
            strategy: service.strategy().to_string(),
        }),
    )
}

/// Supported resolution strategy.
#[derive(Debug, Serialize, ToSchema)]
pub struct StrategyInfo {
    strategy: &'static str,
    description: &'static str,
    configured: bool,
}

/// `GET /config/strategies`: List resolution strategies.
#[utoipa::path(
    get,
    path = "/config/strategies",
    tag = "System",
    summary = "List resolution strategies",
    description = "Returns every interval resolution strategy and marks the configured one.",
    responses(
        (status = 200, description = "Strategy catalog", body = Vec<StrategyInfo>),
    )
)]
pub async fn strategies_handler(State(state): State<AppState>) -> impl IntoResponse {
    let configured = state.ledger_service.strategy();
    let strategies: Vec<StrategyInfo> = ResolutionStrategy::ALL
        .iter()
        .map(|strategy| StrategyInfo {
            strategy: strategy.as_str(),
            description: strategy.description(),
            configured: *strategy == configured,
        })
        .collect();
    (StatusCode::OK, Json(strategies))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/strategies", get(strategies_handler))
}
