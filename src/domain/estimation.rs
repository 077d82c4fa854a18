//! Historical-average fuel estimates for trips.
//!
//! This is a separate, explicitly labeled mode: it applies the mean economy
//! of past fills to a trip's distance (and to the dashboard's remaining
//! range) instead of measuring fuel that was actually pumped. Its output is
//! never written back into fill metrics.

use serde::Serialize;

use super::RecordId;
use super::aggregation::Mean;
use super::resolver::ResolvedTrip;

/// How an estimate was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationMode {
    /// Mean fill-to-fill economy applied to the trip distance.
    HistoricalAverage,
}

/// Estimated fuel figures for one trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripEstimate {
    /// Trip being estimated.
    pub trip_id: RecordId,
    /// Always [`EstimationMode::HistoricalAverage`].
    pub mode: EstimationMode,
    /// Trip distance, when defined.
    pub distance: Option<i64>,
    /// `distance / mean economy`.
    pub estimated_fuel_used: Option<f64>,
    /// `distance * mean cost per distance`.
    pub estimated_cost: Option<f64>,
    /// `board_remaining_range / mean economy`.
    pub estimated_fuel_remaining: Option<f64>,
}

/// Estimates fuel for every trip from reference means.
///
/// Every figure is undefined when its reference mean is
/// [`Mean::InsufficientData`] or not positive.
#[must_use]
pub fn estimate_trips(
    trips: &[ResolvedTrip],
    mean_economy: Mean,
    mean_cost_per_distance: Mean,
) -> Vec<TripEstimate> {
    let economy = mean_economy.value().filter(|e| e.is_finite() && *e > 0.0);
    let cost_rate = mean_cost_per_distance.value().filter(|c| c.is_finite() && *c > 0.0);

    trips
        .iter()
        .map(|resolved| {
            #[allow(clippy::cast_precision_loss)]
            let distance = resolved.distance.map(|d| d as f64);
            TripEstimate {
                trip_id: resolved.trip.id,
                mode: EstimationMode::HistoricalAverage,
                distance: resolved.distance,
                estimated_fuel_used: distance.zip(economy).map(|(d, e)| d / e),
                estimated_cost: distance.zip(cost_rate).map(|(d, c)| d * c),
                estimated_fuel_remaining: resolved
                    .trip
                    .board_remaining_range
                    .zip(economy)
                    .map(|(range, e)| f64::from(range) / e),
            }
        })
        .collect()
}
