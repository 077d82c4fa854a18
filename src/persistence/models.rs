//! Stored row shapes for the `repostajes` (fills) and `recorridos` (trips)
//! tables.
//!
//! Column names follow the persisted schema. Derived columns are carried so
//! other readers of the table see current values, but nothing here reads
//! them back as a source of truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{FillEvent, FillMetrics, RecordId, Trip};

/// One row of the fill table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillRow {
    /// Unique key.
    pub id: RecordId,
    /// Submission order.
    pub seq: u64,
    /// Fill timestamp.
    #[serde(rename = "fecha")]
    pub timestamp: DateTime<Utc>,
    /// Explicit start odometer.
    #[serde(rename = "km_inicial", default)]
    pub odometer_start: Option<u32>,
    /// Odometer at the pump.
    #[serde(rename = "km_actual")]
    pub odometer: u32,
    /// Fuel added.
    #[serde(rename = "galones")]
    pub fuel_amount: f64,
    /// Total paid.
    #[serde(rename = "precio")]
    pub price_total: f64,
    /// Climate-control tag.
    #[serde(rename = "aire_acondicionado", default)]
    pub climate_control: Option<bool>,
    /// Derived distance since the prior fill.
    #[serde(rename = "km_recorridos_acum", default)]
    pub distance: Option<f64>,
    /// Derived distance per fuel unit.
    #[serde(rename = "consumo_km_gal", default)]
    pub economy: Option<f64>,
    /// Derived price per distance unit.
    #[serde(rename = "costo_por_km", default)]
    pub cost_per_distance: Option<f64>,
}

impl FillRow {
    /// Row for a freshly stored event; derived columns start empty.
    #[must_use]
    pub fn from_event(event: &FillEvent) -> Self {
        Self {
            id: event.id,
            seq: event.sequence,
            timestamp: event.timestamp,
            odometer_start: event.odometer_start,
            odometer: event.odometer,
            fuel_amount: event.fuel_amount,
            price_total: event.price_total,
            climate_control: event.climate_control,
            distance: None,
            economy: None,
            cost_per_distance: None,
        }
    }

    /// Raw fields only.
    #[must_use]
    pub fn to_event(&self) -> FillEvent {
        FillEvent {
            id: self.id,
            sequence: self.seq,
            timestamp: self.timestamp,
            odometer: self.odometer,
            odometer_start: self.odometer_start,
            fuel_amount: self.fuel_amount,
            price_total: self.price_total,
            climate_control: self.climate_control,
        }
    }

    /// Derived values as last persisted.
    #[must_use]
    pub fn stored_metrics(&self) -> FillMetrics {
        #[allow(clippy::cast_possible_truncation)]
        let distance = self.distance.map(|d| d.round() as i64);
        FillMetrics {
            distance_since_prior_fill: distance,
            economy: self.economy,
            cost_per_distance: self.cost_per_distance,
        }
    }

    /// Overwrites the derived columns.
    pub fn set_metrics(&mut self, metrics: &FillMetrics) {
        #[allow(clippy::cast_precision_loss)]
        let distance = metrics.distance_since_prior_fill.map(|d| d as f64);
        self.distance = distance;
        self.economy = metrics.economy;
        self.cost_per_distance = metrics.cost_per_distance;
    }

    /// Overwrites the raw columns, keeping id and sequence. Derived columns
    /// are cleared until the next recompute.
    pub fn set_raw(&mut self, event: &FillEvent) {
        *self = Self {
            id: self.id,
            seq: self.seq,
            ..Self::from_event(event)
        };
    }
}

/// One row of the trip table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRow {
    /// Unique key.
    pub id: RecordId,
    /// Submission order.
    pub seq: u64,
    /// Trip start timestamp.
    #[serde(rename = "fecha")]
    pub timestamp: DateTime<Utc>,
    /// Odometer at departure.
    #[serde(rename = "km_inicial")]
    pub odometer_start: u32,
    /// Odometer at arrival.
    #[serde(rename = "km_final")]
    pub odometer_end: u32,
    /// Derived trip distance.
    #[serde(rename = "km_recorridos", default)]
    pub distance: Option<i64>,
    /// Climate control flag.
    #[serde(rename = "aire_acondicionado", default)]
    pub climate_control_used: bool,
    /// Dashboard range at arrival.
    #[serde(rename = "km_restante", default)]
    pub board_remaining_range: Option<u32>,
}

impl TripRow {
    /// Row for a trip; the distance column is derived on the spot since it
    /// depends on this row alone.
    #[must_use]
    pub fn from_trip(trip: &Trip) -> Self {
        let distance = trip.distance();
        Self {
            id: trip.id,
            seq: trip.sequence,
            timestamp: trip.timestamp,
            odometer_start: trip.odometer_start,
            odometer_end: trip.odometer_end,
            distance: (distance > 0).then_some(distance),
            climate_control_used: trip.climate_control_used,
            board_remaining_range: trip.board_remaining_range,
        }
    }

    /// Raw fields only.
    #[must_use]
    pub fn to_trip(&self) -> Trip {
        Trip {
            id: self.id,
            sequence: self.seq,
            timestamp: self.timestamp,
            odometer_start: self.odometer_start,
            odometer_end: self.odometer_end,
            climate_control_used: self.climate_control_used,
            board_remaining_range: self.board_remaining_range,
        }
    }
}
