//! Start/finish trip interaction as an explicit state value.
//!
//! Transitions are pure: each consumes a reference to the current state and
//! returns the next one, so the holder decides when to commit it (only
//! after the finished trip is safely stored).

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::trip::TripInput;
use crate::error::LedgerError;

/// Where the user is in the start/finish trip flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TripSession {
    /// No trip under way.
    #[default]
    Idle,
    /// A trip was started and not yet finished.
    TripInProgress {
        /// Odometer when the trip started.
        start_odometer: u32,
        /// When the trip started.
        started_at: DateTime<Utc>,
    },
}

/// Values supplied when a trip ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripFinish {
    /// Odometer on arrival.
    pub end_odometer: u32,
    /// Whether climate control ran.
    pub climate_control_used: bool,
    /// Dashboard range on arrival, if noted.
    pub board_remaining_range: Option<u32>,
}

impl TripSession {
    /// Begins a trip.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::SessionConflict`] if a trip is already under way.
    pub fn start(&self, start_odometer: u32, started_at: DateTime<Utc>) -> Result<Self, LedgerError> {
        match self {
            Self::Idle => Ok(Self::TripInProgress {
                start_odometer,
                started_at,
            }),
            Self::TripInProgress { start_odometer, .. } => Err(LedgerError::SessionConflict(
                format!("a trip started at odometer {start_odometer} is still in progress"),
            )),
        }
    }

    /// Ends the trip, yielding the raw trip to store and the next state.
    ///
    /// The returned input is not validated; the caller validates it and
    /// only moves to the next state once the trip is stored.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::SessionConflict`] if no trip is under way.
    pub fn finish(&self, finish: TripFinish) -> Result<(Self, TripInput), LedgerError> {
        match *self {
            Self::Idle => Err(LedgerError::SessionConflict(
                "no trip in progress to finish".to_string(),
            )),
            Self::TripInProgress {
                start_odometer,
                started_at,
            } => Ok((
                Self::Idle,
                TripInput {
                    timestamp: started_at,
                    odometer_start: start_odometer,
                    odometer_end: finish.end_odometer,
                    climate_control_used: finish.climate_control_used,
                    board_remaining_range: finish.board_remaining_range,
                },
            )),
        }
    }

    /// Abandons the trip under way.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::SessionConflict`] if no trip is under way.
    pub fn cancel(&self) -> Result<Self, LedgerError> {
        match self {
            Self::Idle => Err(LedgerError::SessionConflict(
                "no trip in progress to cancel".to_string(),
            )),
            Self::TripInProgress { .. } => Ok(Self::Idle),
        }
    }

    /// `true` while a trip is under way.
    #[must_use]
    pub const fn is_in_progress(&self) -> bool {
        matches!(self, Self::TripInProgress { .. })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn finish(end: u32) -> TripFinish {
        TripFinish {
            end_odometer: end,
            climate_control_used: true,
            board_remaining_range: Some(210),
        }
    }

    #[test]
    fn start_then_finish_produces_trip() {
        let now = Utc::now();
        let Ok(session) = TripSession::Idle.start(5000, now) else {
            panic!("start failed");
        };
        assert!(session.is_in_progress());

        let Ok((next, trip)) = session.finish(finish(5120)) else {
            panic!("finish failed");
        };
        assert_eq!(next, TripSession::Idle);
        assert_eq!(trip.odometer_start, 5000);
        assert_eq!(trip.odometer_end, 5120);
        assert_eq!(trip.timestamp, now);
        assert!(trip.validate().is_ok());
    }

    #[test]
    fn double_start_conflicts() {
        let Ok(session) = TripSession::Idle.start(10, Utc::now()) else {
            panic!("start failed");
        };
        assert!(matches!(
            session.start(20, Utc::now()),
            Err(LedgerError::SessionConflict(_))
        ));
    }

    #[test]
    fn finish_or_cancel_while_idle_conflicts() {
        assert!(TripSession::Idle.finish(finish(10)).is_err());
        assert!(TripSession::Idle.cancel().is_err());
    }

    #[test]
    fn finish_below_start_is_caught_by_validation() {
        let Ok(session) = TripSession::Idle.start(800, Utc::now()) else {
            panic!("start failed");
        };
        let Ok((_, trip)) = session.finish(finish(790)) else {
            panic!("finish failed");
        };
        assert!(trip.validate().is_err());
        // The held state is untouched until the caller commits.
        assert!(session.is_in_progress());
    }

    #[test]
    fn serializes_with_state_tag() {
        let Ok(value) = serde_json::to_value(TripSession::Idle) else {
            panic!("serialization failed");
        };
        assert_eq!(value, serde_json::json!({ "state": "idle" }));
    }
}
