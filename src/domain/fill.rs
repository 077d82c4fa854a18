//! Fuel purchase records and their derived metrics.
//!
//! A fill goes through three shapes: [`FillInput`] (raw submitted values),
//! [`ValidatedFill`] (passed the business rules, not yet stored) and
//! [`FillEvent`] (stored, with an id and a submission sequence). Derived
//! values live apart in [`FillMetrics`] and are recomputed, never edited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordId;
use super::validation::{ValidationError, require_positive};

/// Raw values for one fuel purchase as submitted by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillInput {
    /// When the fill happened. Primary ordering key.
    pub timestamp: DateTime<Utc>,
    /// Odometer reading at the pump.
    pub odometer: u32,
    /// Odometer reading when the tank was last filled, if the user tracked it
    /// explicitly.
    #[serde(default)]
    pub odometer_start: Option<u32>,
    /// Fuel added.
    pub fuel_amount: f64,
    /// Total paid.
    pub price_total: f64,
    /// Whether climate control was mostly on since the previous fill.
    #[serde(default)]
    pub climate_control: Option<bool>,
}

impl FillInput {
    /// Checks the business rules for a fill.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the first failing field when
    /// fuel or price is not a positive finite number, or when an explicit
    /// start odometer is not below the fill odometer.
    pub fn validate(self) -> Result<ValidatedFill, ValidationError> {
        require_positive("fuel_amount", self.fuel_amount)?;
        require_positive("price_total", self.price_total)?;
        if let Some(start) = self.odometer_start
            && self.odometer <= start
        {
            return Err(ValidationError::new(
                "odometer",
                format!("must exceed the start odometer ({start})"),
            ));
        }
        Ok(ValidatedFill(self))
    }
}

/// Fill values that passed [`FillInput::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedFill(FillInput);

impl ValidatedFill {
    /// Returns the validated raw values.
    #[must_use]
    pub const fn input(&self) -> &FillInput {
        &self.0
    }
}

/// A stored fuel purchase. Only raw fields; see [`FillMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillEvent {
    /// Immutable identifier.
    pub id: RecordId,
    /// Submission order, strictly increasing per store. Breaks timestamp ties.
    pub sequence: u64,
    /// When the fill happened.
    pub timestamp: DateTime<Utc>,
    /// Odometer at the pump.
    pub odometer: u32,
    /// Explicit start odometer, when tracked.
    pub odometer_start: Option<u32>,
    /// Fuel added.
    pub fuel_amount: f64,
    /// Total paid.
    pub price_total: f64,
    /// Climate-control tag for partitioned reporting.
    pub climate_control: Option<bool>,
}

impl FillEvent {
    /// Builds a stored event from validated values and store-assigned keys.
    #[must_use]
    pub fn from_validated(id: RecordId, sequence: u64, fill: &ValidatedFill) -> Self {
        let input = fill.input();
        Self {
            id,
            sequence,
            timestamp: input.timestamp,
            odometer: input.odometer,
            odometer_start: input.odometer_start,
            fuel_amount: input.fuel_amount,
            price_total: input.price_total,
            climate_control: input.climate_control,
        }
    }

    /// Replaces every raw field, keeping id and sequence.
    pub fn apply_edit(&mut self, fill: &ValidatedFill) {
        *self = Self::from_validated(self.id, self.sequence, fill);
    }

    /// Total ordering key: timestamp, then submission order.
    #[must_use]
    pub fn order_key(&self) -> (DateTime<Utc>, u64) {
        (self.timestamp, self.sequence)
    }
}

/// Values derived from the ordered fill sequence. `None` means undefined.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FillMetrics {
    /// Distance covered on this tank.
    pub distance_since_prior_fill: Option<i64>,
    /// Distance per fuel unit.
    pub economy: Option<f64>,
    /// Price per distance unit.
    pub cost_per_distance: Option<f64>,
}

impl FillMetrics {
    /// All fields undefined.
    pub const UNDEFINED: Self = Self {
        distance_since_prior_fill: None,
        economy: None,
        cost_per_distance: None,
    };

    /// `true` when an economy figure was computed.
    #[must_use]
    pub const fn is_defined(&self) -> bool {
        self.economy.is_some()
    }
}

/// A fill event together with its current derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedFill {
    /// Raw stored values.
    pub event: FillEvent,
    /// Derived values for the current ordered sequence.
    pub metrics: FillMetrics,
}
