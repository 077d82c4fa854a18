//! Report handlers: summary statistics and trip estimates.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{ReportQuery, ReportResponse, TripEstimateDto, TripEstimateListResponse};
use crate::app_state::AppState;
use crate::domain::ResolutionStrategy;
use crate::error::{ErrorResponse, LedgerError};

/// `GET /report`: Summary statistics.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidRequest`] for an unknown strategy name.
#[utoipa::path(
    get,
    path = "/api/v1/report",
    tag = "Report",
    summary = "Summary statistics",
    description = "Mean economy and cost per distance, climate-control partitions, trip totals and every diagnostic. Passing `strategy` recomputes under that strategy without writing anything.",
    params(ReportQuery),
    responses(
        (status = 200, description = "Report", body = ReportResponse),
        (status = 400, description = "Unknown strategy", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse),
    )
)]
pub async fn get_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, LedgerError> {
    let strategy = query
        .strategy
        .as_deref()
        .map(str::parse::<ResolutionStrategy>)
        .transpose()
        .map_err(LedgerError::InvalidRequest)?;
    let report = state.ledger_service.report(strategy).await?;
    Ok(Json(ReportResponse::from(&report)))
}

/// `GET /report/trip-estimates`: Fuel and cost estimates per trip.
///
/// # Errors
///
/// Returns [`LedgerError::StorageUnavailable`] if the store cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/report/trip-estimates",
    tag = "Report",
    summary = "Trip estimates from historical averages",
    description = "Estimates each trip's fuel and cost from the mean fill economy. Every entry is labeled `historical_average` and is never mixed into fill metrics.",
    responses(
        (status = 200, description = "Estimates", body = TripEstimateListResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse),
    )
)]
pub async fn get_trip_estimates(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, LedgerError> {
    let estimates = state.ledger_service.trip_estimates().await?;
    Ok(Json(TripEstimateListResponse {
        data: estimates.iter().map(TripEstimateDto::from).collect(),
    }))
}

/// Report routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/report", get(get_report))
        .route("/report/trip-estimates", get(get_trip_estimates))
}
