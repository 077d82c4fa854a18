//! Trip handlers, including the start/finish session flow.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::api::dto::{
    FinishTripRequest, SessionDto, StartTripRequest, TripChangeResponse, TripListResponse,
    TripRequest,
};
use crate::app_state::AppState;
use crate::domain::RecordId;
use crate::error::{ErrorResponse, LedgerError};

/// `POST /trips`: Record a trip.
///
/// # Errors
///
/// Returns [`LedgerError::Validation`] when the end odometer is not above
/// the start.
#[utoipa::path(
    post,
    path = "/api/v1/trips",
    tag = "Trips",
    summary = "Record a trip",
    request_body = TripRequest,
    responses(
        (status = 201, description = "Trip recorded", body = TripChangeResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse),
    )
)]
pub async fn create_trip(
    State(state): State<AppState>,
    Json(req): Json<TripRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let change = state.ledger_service.record_trip(req.into()).await?;
    Ok((StatusCode::CREATED, Json(TripChangeResponse::from(change))))
}

/// `GET /trips`: List trips.
///
/// # Errors
///
/// Returns [`LedgerError::StorageUnavailable`] if the store cannot be read.
#[utoipa::path(
    get,
    path = "/api/v1/trips",
    tag = "Trips",
    summary = "List trips",
    responses(
        (status = 200, description = "Resolved trips", body = TripListResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse),
    )
)]
pub async fn list_trips(State(state): State<AppState>) -> Result<impl IntoResponse, LedgerError> {
    let resolution = state.ledger_service.list_trips().await?;
    Ok(Json(TripListResponse::from(&resolution)))
}

/// `PUT /trips/{id}`: Replace a trip's raw values.
///
/// # Errors
///
/// Returns [`LedgerError::NotFound`] for an unknown id.
#[utoipa::path(
    put,
    path = "/api/v1/trips/{id}",
    tag = "Trips",
    summary = "Edit a trip",
    params(
        ("id" = uuid::Uuid, Path, description = "Trip UUID"),
    ),
    request_body = TripRequest,
    responses(
        (status = 200, description = "Trip updated", body = TripChangeResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Trip not found", body = ErrorResponse),
    )
)]
pub async fn update_trip(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<TripRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let change = state
        .ledger_service
        .edit_trip(RecordId::from_uuid(id), req.into())
        .await?;
    Ok(Json(TripChangeResponse::from(change)))
}

/// `DELETE /trips/{id}`: Remove a trip.
///
/// # Errors
///
/// Returns [`LedgerError::NotFound`] for an unknown id.
#[utoipa::path(
    delete,
    path = "/api/v1/trips/{id}",
    tag = "Trips",
    summary = "Delete a trip",
    params(
        ("id" = uuid::Uuid, Path, description = "Trip UUID"),
    ),
    responses(
        (status = 204, description = "Trip deleted"),
        (status = 404, description = "Trip not found", body = ErrorResponse),
    )
)]
pub async fn delete_trip(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, LedgerError> {
    state
        .ledger_service
        .remove_trip(RecordId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /trips/session`: Current session state.
#[utoipa::path(
    get,
    path = "/api/v1/trips/session",
    tag = "Trip session",
    summary = "Current trip session",
    responses(
        (status = 200, description = "Session state", body = SessionDto),
    )
)]
pub async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    Json(SessionDto::from(state.ledger_service.session().await))
}

/// `POST /trips/session/start`: Begin a trip.
///
/// # Errors
///
/// Returns [`LedgerError::SessionConflict`] if a trip is already running.
#[utoipa::path(
    post,
    path = "/api/v1/trips/session/start",
    tag = "Trip session",
    summary = "Start a trip",
    request_body = StartTripRequest,
    responses(
        (status = 200, description = "Trip started", body = SessionDto),
        (status = 409, description = "A trip is already in progress", body = ErrorResponse),
    )
)]
pub async fn start_trip(
    State(state): State<AppState>,
    Json(req): Json<StartTripRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let session = state
        .ledger_service
        .start_trip(req.start_odometer, req.started_at)
        .await?;
    Ok(Json(SessionDto::from(session)))
}

/// `POST /trips/session/finish`: End the running trip and store it.
///
/// # Errors
///
/// Returns [`LedgerError::SessionConflict`] when no trip is running, or
/// [`LedgerError::Validation`] when the end odometer is not above the
/// start; the session stays in progress in that case.
#[utoipa::path(
    post,
    path = "/api/v1/trips/session/finish",
    tag = "Trip session",
    summary = "Finish the running trip",
    request_body = FinishTripRequest,
    responses(
        (status = 201, description = "Trip stored", body = TripChangeResponse),
        (status = 400, description = "End odometer not above start", body = ErrorResponse),
        (status = 409, description = "No trip in progress", body = ErrorResponse),
    )
)]
pub async fn finish_trip(
    State(state): State<AppState>,
    Json(req): Json<FinishTripRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let change = state.ledger_service.finish_trip(req.into()).await?;
    Ok((StatusCode::CREATED, Json(TripChangeResponse::from(change))))
}

/// `POST /trips/session/cancel`: Abandon the running trip.
///
/// # Errors
///
/// Returns [`LedgerError::SessionConflict`] when no trip is running.
#[utoipa::path(
    post,
    path = "/api/v1/trips/session/cancel",
    tag = "Trip session",
    summary = "Cancel the running trip",
    responses(
        (status = 200, description = "Back to idle", body = SessionDto),
        (status = 409, description = "No trip in progress", body = ErrorResponse),
    )
)]
pub async fn cancel_trip(State(state): State<AppState>) -> Result<impl IntoResponse, LedgerError> {
    let session = state.ledger_service.cancel_trip().await?;
    Ok(Json(SessionDto::from(session)))
}

/// Trip and session routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trips", post(create_trip).get(list_trips))
        .route("/trips/{id}", put(update_trip).delete(delete_trip))
        .route("/trips/session", get(get_session))
        .route("/trips/session/start", post(start_trip))
        .route("/trips/session/finish", post(finish_trip))
        .route("/trips/session/cancel", post(cancel_trip))
}
