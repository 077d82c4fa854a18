//! In-process store, lost on restart. Used for tests and demos.

use tokio::sync::RwLock;

use super::models::{FillRow, TripRow};
use super::tables::Tables;
use crate::domain::{FillEvent, FillMetrics, RecordId, Trip, ValidatedFill, ValidatedTrip};
use crate::error::LedgerError;

/// Tables behind a [`tokio::sync::RwLock`]. Never unavailable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill rows ordered by (`fecha`, `seq`).
    pub async fn load_fills(&self) -> Vec<FillRow> {
        self.tables.read().await.fills_ordered()
    }

    /// Trip rows ordered by (`fecha`, `seq`).
    pub async fn load_trips(&self) -> Vec<TripRow> {
        self.tables.read().await.trips_ordered()
    }

    /// Appends a fill.
    pub async fn append_fill(&self, fill: &ValidatedFill) -> FillEvent {
        self.tables.write().await.append_fill(fill)
    }

    /// Replaces a fill's raw values.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown id.
    pub async fn update_fill(&self, id: RecordId, fill: &ValidatedFill) -> Result<FillEvent, LedgerError> {
        self.tables.write().await.update_fill(id, fill)
    }

    /// Deletes a fill.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown id.
    pub async fn delete_fill(&self, id: RecordId) -> Result<(), LedgerError> {
        self.tables.write().await.delete_fill(id)
    }

    /// Writes derived fill columns.
    pub async fn save_fill_metrics(&self, updates: &[(RecordId, FillMetrics)]) {
        self.tables.write().await.save_fill_metrics(updates);
    }

    /// Appends a trip.
    pub async fn append_trip(&self, trip: &ValidatedTrip) -> Trip {
        self.tables.write().await.append_trip(trip)
    }

    /// Replaces a trip's raw values.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown id.
    pub async fn update_trip(&self, id: RecordId, trip: &ValidatedTrip) -> Result<Trip, LedgerError> {
        self.tables.write().await.update_trip(id, trip)
    }

    /// Deletes a trip.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown id.
    pub async fn delete_trip(&self, id: RecordId) -> Result<(), LedgerError> {
        self.tables.write().await.delete_trip(id)
    }
}
