//! Fill-event DTOs for create, edit, list and delete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::common_dto::{DiagnosticDto, diagnostics_to_dto};
use crate::domain::{Diagnostic, FillInput, Resolution, ResolvedFill};
use crate::service::FillChange;

/// Request body for `POST /fills` and `PUT /fills/{id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FillRequest {
    /// When the tank was filled. Defaults to now.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Odometer at the pump.
    pub odometer: u32,
    /// Odometer when the measured stretch began, for the explicit strategy.
    #[serde(default)]
    pub odometer_start: Option<u32>,
    /// Fuel added.
    pub fuel_amount: f64,
    /// Total paid.
    pub price_total: f64,
    /// Whether climate control ran since the previous fill.
    #[serde(default)]
    pub climate_control: Option<bool>,
}

impl From<FillRequest> for FillInput {
    fn from(req: FillRequest) -> Self {
        Self {
            timestamp: req.timestamp.unwrap_or_else(Utc::now),
            odometer: req.odometer,
            odometer_start: req.odometer_start,
            fuel_amount: req.fuel_amount,
            price_total: req.price_total,
            climate_control: req.climate_control,
        }
    }
}

/// A stored fill with its derived metrics. Undefined metrics are `null`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FillDto {
    /// Record identifier.
    pub id: Uuid,
    /// Submission order, used to break timestamp ties.
    pub sequence: u64,
    /// Fill time.
    pub timestamp: DateTime<Utc>,
    /// Odometer at the pump.
    pub odometer: u32,
    /// Explicit start odometer, if recorded.
    pub odometer_start: Option<u32>,
    /// Fuel added.
    pub fuel_amount: f64,
    /// Total paid.
    pub price_total: f64,
    /// Climate-control tag, if recorded.
    pub climate_control: Option<bool>,
    /// Distance measured for this fill.
    pub distance_since_prior_fill: Option<i64>,
    /// Distance per fuel unit.
    pub economy: Option<f64>,
    /// Price per distance unit.
    pub cost_per_distance: Option<f64>,
    /// Warnings on this fill.
    pub diagnostics: Vec<DiagnosticDto>,
}

impl FillDto {
    /// Builds the DTO with the diagnostics that belong to this fill.
    #[must_use]
    pub fn new<'a>(
        resolved: &ResolvedFill,
        diagnostics: impl IntoIterator<Item = &'a Diagnostic>,
    ) -> Self {
        let event = &resolved.event;
        Self {
            id: event.id.into(),
            sequence: event.sequence,
            timestamp: event.timestamp,
            odometer: event.odometer,
            odometer_start: event.odometer_start,
            fuel_amount: event.fuel_amount,
            price_total: event.price_total,
            climate_control: event.climate_control,
            distance_since_prior_fill: resolved.metrics.distance_since_prior_fill,
            economy: resolved.metrics.economy,
            cost_per_distance: resolved.metrics.cost_per_distance,
            diagnostics: diagnostics_to_dto(
                diagnostics
                    .into_iter()
                    .filter(|d| d.record_id == event.id),
            ),
        }
    }
}

/// Response body for `GET /fills`.
#[derive(Debug, Serialize, ToSchema)]
pub struct FillListResponse {
    /// Strategy the metrics were computed with.
    pub strategy: String,
    /// Fills in `(timestamp, sequence)` order.
    pub data: Vec<FillDto>,
    /// Every fill diagnostic.
    pub diagnostics: Vec<DiagnosticDto>,
}

impl FillListResponse {
    /// Converts a full resolution.
    #[must_use]
    pub fn new(strategy: &str, resolution: &Resolution) -> Self {
        Self {
            strategy: strategy.to_string(),
            data: resolution
                .fills
                .iter()
                .map(|fill| FillDto::new(fill, resolution.diagnostics_for(fill.event.id)))
                .collect(),
            diagnostics: diagnostics_to_dto(&resolution.diagnostics),
        }
    }
}

/// Response body for fill mutations.
#[derive(Debug, Serialize, ToSchema)]
pub struct FillChangeResponse {
    /// The stored fill; absent after a delete.
    pub fill: Option<FillDto>,
    /// Fills whose derived values were recomputed.
    pub recomputed: Vec<Uuid>,
    /// Warnings on the changed fill and its successor.
    pub diagnostics: Vec<DiagnosticDto>,
}

impl From<FillChange> for FillChangeResponse {
    fn from(change: FillChange) -> Self {
        Self {
            fill: change
                .fill
                .as_ref()
                .map(|fill| FillDto::new(fill, &change.diagnostics)),
            recomputed: change.recomputed.into_iter().map(Uuid::from).collect(),
            diagnostics: diagnostics_to_dto(&change.diagnostics),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_optional_fields() {
        let Ok(req) = serde_json::from_str::<FillRequest>(
            r#"{"odometer": 1400, "fuel_amount": 10.0, "price_total": 150000.0}"#,
        ) else {
            panic!("minimal request rejected");
        };
        let input = FillInput::from(req);
        assert_eq!(input.odometer, 1400);
        assert!(input.odometer_start.is_none());
        assert!(input.climate_control.is_none());
    }
}
