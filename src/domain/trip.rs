//! Odometer-delimited journeys, independent of fueling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RecordId;
use super::validation::ValidationError;

/// Raw values for one trip as submitted by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripInput {
    /// When the trip started.
    pub timestamp: DateTime<Utc>,
    /// Odometer at departure.
    pub odometer_start: u32,
    /// Odometer at arrival.
    pub odometer_end: u32,
    /// Whether climate control ran during the trip.
    #[serde(default)]
    pub climate_control_used: bool,
    /// Range the dashboard reported at arrival, if noted.
    #[serde(default)]
    pub board_remaining_range: Option<u32>,
}

impl TripInput {
    /// Checks the business rules for a trip.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] on `odometer_end` when it does not
    /// exceed `odometer_start`.
    pub fn validate(self) -> Result<ValidatedTrip, ValidationError> {
        if self.odometer_end <= self.odometer_start {
            return Err(ValidationError::new(
                "odometer_end",
                format!(
                    "must exceed the start odometer ({})",
                    self.odometer_start
                ),
            ));
        }
        Ok(ValidatedTrip(self))
    }
}

/// Trip values that passed [`TripInput::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTrip(TripInput);

impl ValidatedTrip {
    /// Returns the validated raw values.
    #[must_use]
    pub const fn input(&self) -> &TripInput {
        &self.0
    }
}

/// A stored trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    /// Immutable identifier.
    pub id: RecordId,
    /// Submission order.
    pub sequence: u64,
    /// When the trip started.
    pub timestamp: DateTime<Utc>,
    /// Odometer at departure.
    pub odometer_start: u32,
    /// Odometer at arrival.
    pub odometer_end: u32,
    /// Climate control flag.
    pub climate_control_used: bool,
    /// Dashboard range at arrival.
    pub board_remaining_range: Option<u32>,
}

impl Trip {
    /// Builds a stored trip from validated values and store-assigned keys.
    #[must_use]
    pub fn from_validated(id: RecordId, sequence: u64, trip: &ValidatedTrip) -> Self {
        let input = trip.input();
        Self {
            id,
            sequence,
            timestamp: input.timestamp,
            odometer_start: input.odometer_start,
            odometer_end: input.odometer_end,
            climate_control_used: input.climate_control_used,
            board_remaining_range: input.board_remaining_range,
        }
    }

    /// Replaces every raw field, keeping id and sequence.
    pub fn apply_edit(&mut self, trip: &ValidatedTrip) {
        *self = Self::from_validated(self.id, self.sequence, trip);
    }

    /// `odometer_end - odometer_start`, signed so that rows written by
    /// other tools cannot underflow.
    #[must_use]
    pub fn distance(&self) -> i64 {
        i64::from(self.odometer_end) - i64::from(self.odometer_start)
    }

    /// Total ordering key: timestamp, then submission order.
    #[must_use]
    pub fn order_key(&self) -> (DateTime<Utc>, u64) {
        (self.timestamp, self.sequence)
    }
}
