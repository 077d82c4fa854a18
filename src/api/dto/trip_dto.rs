//! Trip and trip-session DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::common_dto::{DiagnosticDto, diagnostics_to_dto};
use crate::domain::{Diagnostic, ResolvedTrip, TripFinish, TripInput, TripResolution, TripSession};
use crate::service::TripChange;

/// Request body for `POST /trips` and `PUT /trips/{id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TripRequest {
    /// When the trip started. Defaults to now.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Odometer on departure.
    pub odometer_start: u32,
    /// Odometer on arrival.
    pub odometer_end: u32,
    /// Whether climate control ran.
    #[serde(default)]
    pub climate_control_used: bool,
    /// Dashboard range on arrival.
    #[serde(default)]
    pub board_remaining_range: Option<u32>,
}

impl From<TripRequest> for TripInput {
    fn from(req: TripRequest) -> Self {
        Self {
            timestamp: req.timestamp.unwrap_or_else(Utc::now),
            odometer_start: req.odometer_start,
            odometer_end: req.odometer_end,
            climate_control_used: req.climate_control_used,
            board_remaining_range: req.board_remaining_range,
        }
    }
}

/// A stored trip with its derived distance.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TripDto {
    /// Record identifier.
    pub id: Uuid,
    /// Submission order.
    pub sequence: u64,
    /// Start time.
    pub timestamp: DateTime<Utc>,
    /// Odometer on departure.
    pub odometer_start: u32,
    /// Odometer on arrival.
    pub odometer_end: u32,
    /// `odometer_end - odometer_start`; `null` when not positive.
    pub distance: Option<i64>,
    /// Whether climate control ran.
    pub climate_control_used: bool,
    /// Dashboard range on arrival.
    pub board_remaining_range: Option<u32>,
    /// Warnings on this trip.
    pub diagnostics: Vec<DiagnosticDto>,
}

impl TripDto {
    /// Builds the DTO with the diagnostics that belong to this trip.
    #[must_use]
    pub fn new<'a>(
        resolved: &ResolvedTrip,
        diagnostics: impl IntoIterator<Item = &'a Diagnostic>,
    ) -> Self {
        let trip = &resolved.trip;
        Self {
            id: trip.id.into(),
            sequence: trip.sequence,
            timestamp: trip.timestamp,
            odometer_start: trip.odometer_start,
            odometer_end: trip.odometer_end,
            distance: resolved.distance,
            climate_control_used: trip.climate_control_used,
            board_remaining_range: trip.board_remaining_range,
            diagnostics: diagnostics_to_dto(
                diagnostics.into_iter().filter(|d| d.record_id == trip.id),
            ),
        }
    }
}

/// Response body for `GET /trips`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TripListResponse {
    /// Trips in `(timestamp, sequence)` order.
    pub data: Vec<TripDto>,
}

impl From<&TripResolution> for TripListResponse {
    fn from(resolution: &TripResolution) -> Self {
        Self {
            data: resolution
                .trips
                .iter()
                .map(|trip| TripDto::new(trip, &resolution.diagnostics))
                .collect(),
        }
    }
}

/// Response body for trip mutations.
#[derive(Debug, Serialize, ToSchema)]
pub struct TripChangeResponse {
    /// The stored trip; absent after a delete.
    pub trip: Option<TripDto>,
    /// Warnings on the trip.
    pub diagnostics: Vec<DiagnosticDto>,
}

impl From<TripChange> for TripChangeResponse {
    fn from(change: TripChange) -> Self {
        Self {
            trip: change
                .trip
                .as_ref()
                .map(|trip| TripDto::new(trip, &change.diagnostics)),
            diagnostics: diagnostics_to_dto(&change.diagnostics),
        }
    }
}

/// Request body for `POST /trips/session/start`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StartTripRequest {
    /// Odometer on departure.
    pub start_odometer: u32,
    /// Departure time. Defaults to now.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

/// Request body for `POST /trips/session/finish`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FinishTripRequest {
    /// Odometer on arrival.
    pub end_odometer: u32,
    /// Whether climate control ran.
    #[serde(default)]
    pub climate_control_used: bool,
    /// Dashboard range on arrival.
    #[serde(default)]
    pub board_remaining_range: Option<u32>,
}

impl From<FinishTripRequest> for TripFinish {
    fn from(req: FinishTripRequest) -> Self {
        Self {
            end_odometer: req.end_odometer,
            climate_control_used: req.climate_control_used,
            board_remaining_range: req.board_remaining_range,
        }
    }
}

/// Current trip session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionDto {
    /// `"idle"` or `"trip_in_progress"`.
    pub state: String,
    /// Departure odometer while a trip is running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_odometer: Option<u32>,
    /// Departure time while a trip is running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl From<TripSession> for SessionDto {
    fn from(session: TripSession) -> Self {
        match session {
            TripSession::Idle => Self {
                state: "idle".to_string(),
                start_odometer: None,
                started_at: None,
            },
            TripSession::TripInProgress {
                start_odometer,
                started_at,
            } => Self {
                state: "trip_in_progress".to_string(),
                start_odometer: Some(start_odometer),
                started_at: Some(started_at),
            },
        }
    }
}
