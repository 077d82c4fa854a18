//! Fill-event handlers: record, list, edit, delete.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{post, put};
use axum::{Json, Router};

use crate::api::dto::{FillChangeResponse, FillListResponse, FillRequest};
use crate::app_state::AppState;
use crate::domain::RecordId;
use crate::error::{ErrorResponse, LedgerError};

/// `POST /fills`: Record a fuel fill.
///
/// # Errors
///
/// Returns [`LedgerError::Validation`] for non-positive fuel or price, or
/// a start odometer not below the fill odometer.
#[utoipa::path(
    post,
    path = "/api/v1/fills",
    tag = "Fills",
    summary = "Record a fill",
    description = "Validates and stores a fill event, then recomputes the derived metrics of the fill and its successor in timestamp order.",
    request_body = FillRequest,
    responses(
        (status = 201, description = "Fill recorded", body = FillChangeResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse),
    )
)]
pub async fn create_fill(
    State(state): State<AppState>,
    Json(req): Json<FillRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let change = state.ledger_service.record_fill(req.into()).await?;
    Ok((StatusCode::CREATED, Json(FillChangeResponse::from(change))))
}

/// `GET /fills`: List fills with derived metrics.
///
/// # Errors
///
/// Returns [`LedgerError::StorageUnavailable`] if the store cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/fills",
    tag = "Fills",
    summary = "List fills",
    description = "Returns every fill in (timestamp, submission) order with distance, economy, cost per distance and diagnostics.",
    responses(
        (status = 200, description = "Resolved fills", body = FillListResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse),
    )
)]
pub async fn list_fills(State(state): State<AppState>) -> Result<impl IntoResponse, LedgerError> {
    let resolution = state.ledger_service.list_fills().await?;
    let strategy = state.ledger_service.strategy();
    Ok(Json(FillListResponse::new(strategy.as_str(), &resolution)))
}

/// `PUT /fills/{id}`: Replace a fill's raw values.
///
/// # Errors
///
/// Returns [`LedgerError::NotFound`] for an unknown id.
#[utoipa::path(
    put,
    path = "/api/v1/fills/{id}",
    tag = "Fills",
    summary = "Edit a fill",
    description = "Replaces every raw field of a fill. Its old and new successors are re-measured.",
    params(
        ("id" = uuid::Uuid, Path, description = "Fill UUID"),
    ),
    request_body = FillRequest,
    responses(
        (status = 200, description = "Fill updated", body = FillChangeResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Fill not found", body = ErrorResponse),
    )
)]
pub async fn update_fill(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<FillRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let change = state
        .ledger_service
        .edit_fill(RecordId::from_uuid(id), req.into())
        .await?;
    Ok(Json(FillChangeResponse::from(change)))
}

/// `DELETE /fills/{id}`: Remove a fill.
///
/// # Errors
///
/// Returns [`LedgerError::NotFound`] for an unknown id.
#[utoipa::path(
    delete,
    path = "/api/v1/fills/{id}",
    tag = "Fills",
    summary = "Delete a fill",
    description = "Deletes a fill; the fill after it is re-measured against the fill before it.",
    params(
        ("id" = uuid::Uuid, Path, description = "Fill UUID"),
    ),
    responses(
        (status = 200, description = "Fill deleted", body = FillChangeResponse),
        (status = 404, description = "Fill not found", body = ErrorResponse),
    )
)]
pub async fn delete_fill(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, LedgerError> {
    let change = state
        .ledger_service
        .remove_fill(RecordId::from_uuid(id))
        .await?;
    Ok(Json(FillChangeResponse::from(change)))
}

/// Fill routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/fills", post(create_fill).get(list_fills))
        .route("/fills/{id}", put(update_fill).delete(delete_fill))
}
