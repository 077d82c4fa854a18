//! Interval resolution: turns an ordered record sequence into derived metrics.
//!
//! One resolver serves every pairing rule through [`ResolutionStrategy`].
//! Records are always sorted by `(timestamp, sequence)` first, so two
//! fills sharing a timestamp pair the same way on every run no matter how
//! the backing store returned them.
//!
//! The resolver fails soft: a record whose interval cannot be measured gets
//! undefined metrics plus a [`Diagnostic`], and the rest of the sequence is
//! still resolved.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::RecordId;
use super::fill::{FillEvent, FillMetrics, ResolvedFill};
use super::trip::Trip;

/// How a fill's distance is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Distance since the previous fill in `(timestamp, sequence)` order.
    #[default]
    FillToFill,
    /// Distance from the start odometer recorded on the fill itself.
    ExplicitOdometer,
}

impl ResolutionStrategy {
    /// Every strategy, for catalogs.
    pub const ALL: [Self; 2] = [Self::FillToFill, Self::ExplicitOdometer];

    /// Wire name of the strategy.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FillToFill => "fill_to_fill",
            Self::ExplicitOdometer => "explicit_odometer",
        }
    }

    /// One-line description for catalogs.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::FillToFill => {
                "Distance between consecutive full-tank fills divided by the fuel added at the later fill"
            }
            Self::ExplicitOdometer => {
                "Distance between the start and end odometer recorded on each fill"
            }
        }
    }

    /// Minimum number of fills before any interval can be defined.
    #[must_use]
    pub const fn min_history(&self) -> usize {
        match self {
            Self::FillToFill => 2,
            Self::ExplicitOdometer => 1,
        }
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fill_to_fill" | "fill-to-fill" => Ok(Self::FillToFill),
            "explicit_odometer" | "explicit-odometer" | "explicit" => Ok(Self::ExplicitOdometer),
            other => Err(format!("unknown resolution strategy `{other}`")),
        }
    }
}

/// What went wrong with a single record's interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Odometer went down relative to the previous fill.
    OdometerDecreased {
        /// Odometer of the preceding fill.
        previous: u32,
        /// Odometer of this fill.
        current: u32,
    },
    /// Same odometer as the previous fill; nothing to divide by.
    ZeroDistance {
        /// The repeated reading.
        odometer: u32,
    },
    /// Explicit strategy, but the fill has no start odometer.
    MissingStartOdometer,
    /// Explicit start odometer is not below the fill odometer.
    StartNotBelowEnd {
        /// Recorded start.
        start: u32,
        /// Recorded end.
        end: u32,
    },
    /// Stored fuel amount is zero or negative.
    NonPositiveFuel,
    /// Stored price is zero or negative.
    NonPositivePrice,
    /// Trip departs below the arrival odometer of the trip before it.
    TripOverlap {
        /// Arrival odometer of the preceding trip.
        previous_end: u32,
        /// Departure odometer of this trip.
        start: u32,
    },
    /// Stored trip does not move forward.
    NonPositiveTripDistance,
}

impl DiagnosticKind {
    /// Snake-case tag, same as the serialized `kind`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::OdometerDecreased { .. } => "odometer_decreased",
            Self::ZeroDistance { .. } => "zero_distance",
            Self::MissingStartOdometer => "missing_start_odometer",
            Self::StartNotBelowEnd { .. } => "start_not_below_end",
            Self::NonPositiveFuel => "non_positive_fuel",
            Self::NonPositivePrice => "non_positive_price",
            Self::TripOverlap { .. } => "trip_overlap",
            Self::NonPositiveTripDistance => "non_positive_trip_distance",
        }
    }
}

/// A non-fatal data-entry warning tied to one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Record the warning belongs to.
    pub record_id: RecordId,
    /// Machine-readable cause.
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    /// Human-readable explanation.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.kind {
            DiagnosticKind::OdometerDecreased { previous, current } => format!(
                "odometer {current} is below the previous fill's {previous}; economy left undefined"
            ),
            DiagnosticKind::ZeroDistance { odometer } => {
                format!("odometer {odometer} repeats the previous fill; economy left undefined")
            }
            DiagnosticKind::MissingStartOdometer => {
                "no start odometer recorded; distance left undefined".to_string()
            }
            DiagnosticKind::StartNotBelowEnd { start, end } => {
                format!("start odometer {start} is not below {end}; distance left undefined")
            }
            DiagnosticKind::NonPositiveFuel => {
                "fuel amount is not positive; economy left undefined".to_string()
            }
            DiagnosticKind::NonPositivePrice => {
                "price is not positive; cost per distance left undefined".to_string()
            }
            DiagnosticKind::TripOverlap {
                previous_end,
                start,
            } => format!("trip starts at {start}, below the previous trip's end {previous_end}"),
            DiagnosticKind::NonPositiveTripDistance => {
                "trip end odometer does not exceed its start".to_string()
            }
        }
    }

    /// `true` for odometer ordering problems, as opposed to bad quantities.
    #[must_use]
    pub const fn is_ordering_anomaly(&self) -> bool {
        matches!(
            self.kind,
            DiagnosticKind::OdometerDecreased { .. }
                | DiagnosticKind::ZeroDistance { .. }
                | DiagnosticKind::TripOverlap { .. }
        )
    }
}

/// Resolved fills in `(timestamp, sequence)` order, plus warnings.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Resolution {
    /// Every input fill, sorted, with derived metrics.
    pub fills: Vec<ResolvedFill>,
    /// Warnings for records whose metrics are undefined.
    pub diagnostics: Vec<Diagnostic>,
}

impl Resolution {
    /// Metrics for one record, if present.
    #[must_use]
    pub fn metrics_of(&self, id: RecordId) -> Option<FillMetrics> {
        self.fills
            .iter()
            .find(|fill| fill.event.id == id)
            .map(|fill| fill.metrics)
    }

    /// Warnings for one record.
    pub fn diagnostics_for(&self, id: RecordId) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.record_id == id)
    }
}

/// A trip together with its derived distance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTrip {
    /// Raw stored values.
    pub trip: Trip,
    /// `odometer_end - odometer_start`, undefined when not positive.
    pub distance: Option<i64>,
}

/// Resolved trips in `(timestamp, sequence)` order, plus warnings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TripResolution {
    /// Every input trip, sorted, with derived distance.
    pub trips: Vec<ResolvedTrip>,
    /// Overlap and distance warnings.
    pub diagnostics: Vec<Diagnostic>,
}

/// Sorts fills into the deterministic total order.
pub fn sort_fills(events: &mut [FillEvent]) {
    events.sort_by_key(FillEvent::order_key);
}

/// Resolves fills that are already sorted by [`sort_fills`].
#[must_use]
pub fn resolve_sorted(strategy: ResolutionStrategy, events: &[FillEvent]) -> Resolution {
    let mut resolution = Resolution {
        fills: Vec::with_capacity(events.len()),
        diagnostics: Vec::new(),
    };
    let mut previous: Option<&FillEvent> = None;
    for event in events {
        let (metrics, mut diagnostics) = resolve_one(strategy, previous, event);
        resolution.fills.push(ResolvedFill {
            event: event.clone(),
            metrics,
        });
        resolution.diagnostics.append(&mut diagnostics);
        previous = Some(event);
    }
    resolution
}

/// Sorts a copy of `events` and resolves it.
#[must_use]
pub fn resolve_fills(strategy: ResolutionStrategy, events: &[FillEvent]) -> Resolution {
    let mut sorted = events.to_vec();
    sort_fills(&mut sorted);
    resolve_sorted(strategy, &sorted)
}

fn resolve_one(
    strategy: ResolutionStrategy,
    previous: Option<&FillEvent>,
    event: &FillEvent,
) -> (FillMetrics, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let mut warn = |kind| {
        diagnostics.push(Diagnostic {
            record_id: event.id,
            kind,
        });
    };

    let distance = match strategy {
        ResolutionStrategy::FillToFill => match previous {
            // First fill has nothing to measure against.
            None => return (FillMetrics::UNDEFINED, diagnostics),
            Some(prior) => {
                let distance = i64::from(event.odometer) - i64::from(prior.odometer);
                if distance < 0 {
                    warn(DiagnosticKind::OdometerDecreased {
                        previous: prior.odometer,
                        current: event.odometer,
                    });
                    return (FillMetrics::UNDEFINED, diagnostics);
                }
                if distance == 0 {
                    warn(DiagnosticKind::ZeroDistance {
                        odometer: event.odometer,
                    });
                }
                distance
            }
        },
        ResolutionStrategy::ExplicitOdometer => match event.odometer_start {
            None => {
                warn(DiagnosticKind::MissingStartOdometer);
                return (FillMetrics::UNDEFINED, diagnostics);
            }
            Some(start) => {
                let distance = i64::from(event.odometer) - i64::from(start);
                if distance <= 0 {
                    warn(DiagnosticKind::StartNotBelowEnd {
                        start,
                        end: event.odometer,
                    });
                    return (FillMetrics::UNDEFINED, diagnostics);
                }
                distance
            }
        },
    };

    #[allow(clippy::cast_precision_loss)]
    let km = distance as f64;

    let economy = if distance > 0 && event.fuel_amount > 0.0 {
        Some(km / event.fuel_amount)
    } else {
        if event.fuel_amount <= 0.0 {
            warn(DiagnosticKind::NonPositiveFuel);
        }
        None
    };

    let cost_per_distance = if distance > 0 && event.price_total > 0.0 {
        Some(event.price_total / km)
    } else {
        if event.price_total <= 0.0 {
            warn(DiagnosticKind::NonPositivePrice);
        }
        None
    };

    (
        FillMetrics {
            distance_since_prior_fill: Some(distance),
            economy,
            cost_per_distance,
        },
        diagnostics,
    )
}

/// Sorts trips and derives their distances.
#[must_use]
pub fn resolve_trips(trips: &[Trip]) -> TripResolution {
    let mut sorted = trips.to_vec();
    sorted.sort_by_key(Trip::order_key);

    let mut resolution = TripResolution {
        trips: Vec::with_capacity(sorted.len()),
        diagnostics: Vec::new(),
    };
    let mut previous_end: Option<u32> = None;
    for trip in sorted {
        if let Some(previous_end) = previous_end
            && trip.odometer_start < previous_end
        {
            resolution.diagnostics.push(Diagnostic {
                record_id: trip.id,
                kind: DiagnosticKind::TripOverlap {
                    previous_end,
                    start: trip.odometer_start,
                },
            });
        }
        let distance = trip.distance();
        let distance = if distance > 0 {
            Some(distance)
        } else {
            resolution.diagnostics.push(Diagnostic {
                record_id: trip.id,
                kind: DiagnosticKind::NonPositiveTripDistance,
            });
            None
        };
        previous_end = Some(trip.odometer_end);
        resolution.trips.push(ResolvedTrip { trip, distance });
    }
    resolution
}
