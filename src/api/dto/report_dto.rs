//! Report and estimate DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::common_dto::{DiagnosticDto, MeanDto, PartitionedDto, diagnostics_to_dto};
use crate::domain::{EstimationMode, FillSummary, HistoryStatus, TripEstimate, TripSummary};
use crate::service::Report;

/// Query parameters for `GET /report`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// `fill_to_fill` or `explicit_odometer`; the configured strategy when absent.
    #[serde(default)]
    pub strategy: Option<String>,
}

/// Fill statistics.
#[derive(Debug, Serialize, ToSchema)]
pub struct FillSummaryDto {
    /// Strategy used.
    pub strategy: String,
    /// Fills on record.
    pub fill_count: usize,
    /// Fills with a defined economy.
    pub interval_count: usize,
    /// Odometer ordering anomalies.
    pub anomaly_count: usize,
    /// Sum of defined distances.
    pub total_distance: i64,
    /// Fuel across every fill.
    pub total_fuel: f64,
    /// Money across every fill.
    pub total_cost: f64,
    /// Mean distance per fuel unit.
    pub mean_economy: MeanDto,
    /// Mean price per distance unit.
    pub mean_cost_per_distance: MeanDto,
    /// Economy with and without climate control.
    pub economy_by_climate_control: PartitionedDto,
    /// `"sufficient"` or `"insufficient"`.
    pub history: String,
}

impl From<&FillSummary> for FillSummaryDto {
    fn from(summary: &FillSummary) -> Self {
        Self {
            strategy: summary.strategy.as_str().to_string(),
            fill_count: summary.fill_count,
            interval_count: summary.interval_count,
            anomaly_count: summary.anomaly_count,
            total_distance: summary.total_distance,
            total_fuel: summary.total_fuel,
            total_cost: summary.total_cost,
            mean_economy: summary.mean_economy.into(),
            mean_cost_per_distance: summary.mean_cost_per_distance.into(),
            economy_by_climate_control: summary.economy_by_climate_control.into(),
            history: match summary.history {
                HistoryStatus::Sufficient => "sufficient",
                HistoryStatus::Insufficient => "insufficient",
            }
            .to_string(),
        }
    }
}

/// Trip statistics.
#[derive(Debug, Serialize, ToSchema)]
pub struct TripSummaryDto {
    /// Trips on record.
    pub trip_count: usize,
    /// Sum of defined trip distances.
    pub total_distance: i64,
    /// Mean trip distance.
    pub mean_distance: MeanDto,
    /// Trip distance with and without climate control.
    pub distance_by_climate_control: PartitionedDto,
}

impl From<&TripSummary> for TripSummaryDto {
    fn from(summary: &TripSummary) -> Self {
        Self {
            trip_count: summary.trip_count,
            total_distance: summary.total_distance,
            mean_distance: summary.mean_distance.into(),
            distance_by_climate_control: summary.distance_by_climate_control.into(),
        }
    }
}

/// Response body for `GET /report`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReportResponse {
    /// Fill statistics.
    pub fills: FillSummaryDto,
    /// Trip statistics.
    pub trips: TripSummaryDto,
    /// Every warning found while resolving.
    pub diagnostics: Vec<DiagnosticDto>,
}

impl From<&Report> for ReportResponse {
    fn from(report: &Report) -> Self {
        Self {
            fills: (&report.fills).into(),
            trips: (&report.trips).into(),
            diagnostics: diagnostics_to_dto(&report.diagnostics),
        }
    }
}

/// Historical-average estimate for one trip.
#[derive(Debug, Serialize, ToSchema)]
pub struct TripEstimateDto {
    /// Trip the estimate is for.
    pub trip_id: Uuid,
    /// Always `"historical_average"`.
    pub mode: String,
    /// Trip distance.
    pub distance: Option<i64>,
    /// Fuel burned at the historical mean economy.
    pub estimated_fuel_used: Option<f64>,
    /// Cost at the historical mean cost per distance.
    pub estimated_cost: Option<f64>,
    /// Fuel left, from the dashboard range.
    pub estimated_fuel_remaining: Option<f64>,
}

impl From<&TripEstimate> for TripEstimateDto {
    fn from(estimate: &TripEstimate) -> Self {
        Self {
            trip_id: estimate.trip_id.into(),
            mode: match estimate.mode {
                EstimationMode::HistoricalAverage => "historical_average",
            }
            .to_string(),
            distance: estimate.distance,
            estimated_fuel_used: estimate.estimated_fuel_used,
            estimated_cost: estimate.estimated_cost,
            estimated_fuel_remaining: estimate.estimated_fuel_remaining,
        }
    }
}

/// Response body for `GET /report/trip-estimates`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TripEstimateListResponse {
    /// One estimate per trip, in trip order.
    pub data: Vec<TripEstimateDto>,
}
