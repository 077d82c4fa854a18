//! Table operations shared by the in-memory and flat-file backends.
//!
//! [`Tables`] is the whole store as one serializable document. Every
//! mutation checks first and writes second, so a failed call leaves the
//! document unchanged.

use serde::{Deserialize, Serialize};

use super::models::{FillRow, TripRow};
use crate::domain::{FillEvent, FillMetrics, RecordId, Trip, ValidatedFill, ValidatedTrip};
use crate::error::LedgerError;

/// Both tables plus the submission-order counter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tables {
    /// Last sequence number handed out.
    #[serde(default)]
    pub last_seq: u64,
    /// Fill rows in insertion order.
    #[serde(default)]
    pub repostajes: Vec<FillRow>,
    /// Trip rows in insertion order.
    #[serde(default)]
    pub recorridos: Vec<TripRow>,
}

impl Tables {
    fn next_seq(&mut self) -> u64 {
        self.last_seq = self.last_seq.saturating_add(1);
        self.last_seq
    }

    /// Fill rows ordered by (`fecha`, `seq`).
    #[must_use]
    pub fn fills_ordered(&self) -> Vec<FillRow> {
        let mut rows = self.repostajes.clone();
        rows.sort_by_key(|row| (row.timestamp, row.seq));
        rows
    }

    /// Trip rows ordered by (`fecha`, `seq`).
    #[must_use]
    pub fn trips_ordered(&self) -> Vec<TripRow> {
        let mut rows = self.recorridos.clone();
        rows.sort_by_key(|row| (row.timestamp, row.seq));
        rows
    }

    /// Stores a new fill under a fresh id and sequence.
    pub fn append_fill(&mut self, fill: &ValidatedFill) -> FillEvent {
        let seq = self.next_seq();
        let event = FillEvent::from_validated(RecordId::new(), seq, fill);
        self.repostajes.push(FillRow::from_event(&event));
        event
    }

    /// Replaces the raw columns of an existing fill.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if no fill has this id.
    pub fn update_fill(&mut self, id: RecordId, fill: &ValidatedFill) -> Result<FillEvent, LedgerError> {
        let row = self
            .repostajes
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(LedgerError::fill_not_found(id))?;
        let mut event = row.to_event();
        event.apply_edit(fill);
        row.set_raw(&event);
        Ok(event)
    }

    /// Removes a fill.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if no fill has this id.
    pub fn delete_fill(&mut self, id: RecordId) -> Result<(), LedgerError> {
        let before = self.repostajes.len();
        self.repostajes.retain(|row| row.id != id);
        if self.repostajes.len() == before {
            return Err(LedgerError::fill_not_found(id));
        }
        Ok(())
    }

    /// Writes derived columns; ids no longer present are skipped.
    pub fn save_fill_metrics(&mut self, updates: &[(RecordId, FillMetrics)]) {
        for (id, metrics) in updates {
            if let Some(row) = self.repostajes.iter_mut().find(|row| row.id == *id) {
                row.set_metrics(metrics);
            }
        }
    }

    /// Stores a new trip under a fresh id and sequence.
    pub fn append_trip(&mut self, trip: &ValidatedTrip) -> Trip {
        let seq = self.next_seq();
        let trip = Trip::from_validated(RecordId::new(), seq, trip);
        self.recorridos.push(TripRow::from_trip(&trip));
        trip
    }

    /// Replaces an existing trip's raw columns.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if no trip has this id.
    pub fn update_trip(&mut self, id: RecordId, trip: &ValidatedTrip) -> Result<Trip, LedgerError> {
        let row = self
            .recorridos
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(LedgerError::trip_not_found(id))?;
        let mut stored = row.to_trip();
        stored.apply_edit(trip);
        *row = TripRow::from_trip(&stored);
        Ok(stored)
    }

    /// Removes a trip.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] if no trip has this id.
    pub fn delete_trip(&mut self, id: RecordId) -> Result<(), LedgerError> {
        let before = self.recorridos.len();
        self.recorridos.retain(|row| row.id != id);
        if self.recorridos.len() == before {
            return Err(LedgerError::trip_not_found(id));
        }
        Ok(())
    }
}
