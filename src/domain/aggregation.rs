//! Summary statistics over resolved fills and trips.
//!
//! Means are only taken over records with defined metrics. An empty input
//! yields [`Mean::InsufficientData`], never a zero or a NaN.

use serde::Serialize;

use super::fill::ResolvedFill;
use super::resolver::{Resolution, ResolutionStrategy, TripResolution};

/// Arithmetic mean of a sample, or the lack of one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Mean {
    /// At least one sample was available.
    Value {
        /// The mean.
        value: f64,
        /// How many samples went into it.
        samples: usize,
    },
    /// No qualifying samples.
    InsufficientData,
}

impl Mean {
    /// Mean of the finite values in `values`.
    pub fn of(values: impl IntoIterator<Item = f64>) -> Self {
        let (sum, samples) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
        if samples == 0 {
            return Self::InsufficientData;
        }
        #[allow(clippy::cast_precision_loss)]
        let value = sum / samples as f64;
        Self::Value { value, samples }
    }

    /// The mean, if there is one.
    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        match self {
            Self::Value { value, .. } => Some(*value),
            Self::InsufficientData => None,
        }
    }

    /// Number of samples behind the mean (zero when insufficient).
    #[must_use]
    pub const fn samples(&self) -> usize {
        match self {
            Self::Value { samples, .. } => *samples,
            Self::InsufficientData => 0,
        }
    }
}

/// Whether there is enough history to report anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    /// At least one interval is defined.
    Sufficient,
    /// Too few fills, or none of them produced an interval.
    Insufficient,
}

/// Means for records tagged true vs false on a boolean attribute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Partitioned {
    /// Records where the attribute is `true`.
    pub when_true: Mean,
    /// Records where the attribute is `false`.
    pub when_false: Mean,
}

/// Headline numbers over the fill sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillSummary {
    /// Strategy the metrics were computed with.
    pub strategy: ResolutionStrategy,
    /// Fills on record, defined or not.
    pub fill_count: usize,
    /// Fills with a defined economy figure.
    pub interval_count: usize,
    /// Ordering anomalies found while resolving.
    pub anomaly_count: usize,
    /// Sum of defined distances.
    pub total_distance: i64,
    /// Fuel across every fill.
    pub total_fuel: f64,
    /// Money across every fill.
    pub total_cost: f64,
    /// Mean distance per fuel unit.
    pub mean_economy: Mean,
    /// Mean price per distance unit.
    pub mean_cost_per_distance: Mean,
    /// Economy split by climate-control tag.
    pub economy_by_climate_control: Partitioned,
    /// Enough data to trust the means?
    pub history: HistoryStatus,
}

/// Headline numbers over trips.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripSummary {
    /// Trips on record.
    pub trip_count: usize,
    /// Sum of defined trip distances.
    pub total_distance: i64,
    /// Mean trip distance.
    pub mean_distance: Mean,
    /// Trip distance split by climate-control use.
    pub distance_by_climate_control: Partitioned,
}

/// Mean of `metric` over fills where `attribute` is `Some(true)` and
/// `Some(false)` respectively. Untagged fills land in neither partition.
pub fn partition_fills<A, M>(fills: &[ResolvedFill], attribute: A, metric: M) -> Partitioned
where
    A: Fn(&ResolvedFill) -> Option<bool>,
    M: Fn(&ResolvedFill) -> Option<f64>,
{
    let side = |wanted: bool| {
        Mean::of(
            fills
                .iter()
                .filter(|fill| attribute(*fill) == Some(wanted))
                .filter_map(&metric),
        )
    };
    Partitioned {
        when_true: side(true),
        when_false: side(false),
    }
}

/// Summarizes a fill resolution.
#[must_use]
pub fn summarize_fills(strategy: ResolutionStrategy, resolution: &Resolution) -> FillSummary {
    let fills = &resolution.fills;
    let mean_economy = Mean::of(fills.iter().filter_map(|f| f.metrics.economy));
    let mean_cost_per_distance = Mean::of(fills.iter().filter_map(|f| f.metrics.cost_per_distance));
    let interval_count = mean_economy.samples();

    let history = if fills.len() < strategy.min_history() || interval_count == 0 {
        HistoryStatus::Insufficient
    } else {
        HistoryStatus::Sufficient
    };

    FillSummary {
        strategy,
        fill_count: fills.len(),
        interval_count,
        anomaly_count: resolution
            .diagnostics
            .iter()
            .filter(|d| d.is_ordering_anomaly())
            .count(),
        total_distance: fills
            .iter()
            .filter(|f| f.metrics.is_defined())
            .filter_map(|f| f.metrics.distance_since_prior_fill)
            .sum(),
        total_fuel: fills.iter().map(|f| f.event.fuel_amount).sum(),
        total_cost: fills.iter().map(|f| f.event.price_total).sum(),
        mean_economy,
        mean_cost_per_distance,
        economy_by_climate_control: partition_fills(
            fills,
            |f| f.event.climate_control,
            |f| f.metrics.economy,
        ),
        history,
    }
}

/// Summarizes a trip resolution.
#[must_use]
pub fn summarize_trips(resolution: &TripResolution) -> TripSummary {
    let trips = &resolution.trips;
    #[allow(clippy::cast_precision_loss)]
    let distance_of = |distance: Option<i64>| distance.map(|d| d as f64);
    let side = |wanted: bool| {
        Mean::of(
            trips
                .iter()
                .filter(|t| t.trip.climate_control_used == wanted)
                .filter_map(|t| distance_of(t.distance)),
        )
    };

    TripSummary {
        trip_count: trips.len(),
        total_distance: trips.iter().filter_map(|t| t.distance).sum(),
        mean_distance: Mean::of(trips.iter().filter_map(|t| distance_of(t.distance))),
        distance_by_climate_control: Partitioned {
            when_true: side(true),
            when_false: side(false),
        },
    }
}
