//! Flat-file store: the whole [`Tables`] document as one JSON file.
//!
//! Every operation re-reads the file so edits made by hand between requests
//! are picked up. Writes go to a sibling temp file that is then renamed over
//! the original, so a crash mid-write never leaves a truncated document.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use super::models::{FillRow, TripRow};
use super::tables::Tables;
use crate::domain::{FillEvent, FillMetrics, RecordId, Trip, ValidatedFill, ValidatedTrip};
use crate::error::LedgerError;

/// JSON document store at a fixed path.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Store backed by `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Tables, LedgerError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Tables::default()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                LedgerError::StorageUnavailable(format!(
                    "{} is not a valid ledger document: {e}",
                    self.path.display()
                ))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Tables::default()),
            Err(e) => Err(LedgerError::StorageUnavailable(format!(
                "cannot read {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn write(&self, tables: &Tables) -> Result<(), LedgerError> {
        let bytes = serde_json::to_vec_pretty(tables)
            .map_err(|e| LedgerError::Internal(format!("cannot encode ledger document: {e}")))?;
        let temp = self.path.with_extension("json.tmp");
        let unavailable = |e: std::io::Error| {
            LedgerError::StorageUnavailable(format!("cannot write {}: {e}", self.path.display()))
        };
        tokio::fs::write(&temp, bytes).await.map_err(unavailable)?;
        tokio::fs::rename(&temp, &self.path).await.map_err(unavailable)?;
        Ok(())
    }

    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Tables) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let _guard = self.write_lock.lock().await;
        let mut tables = self.read().await?;
        let outcome = change(&mut tables)?;
        self.write(&tables).await?;
        Ok(outcome)
    }

    /// Fill rows ordered by (`fecha`, `seq`).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] if the file cannot be read
    /// or parsed. A missing file is an empty store.
    pub async fn load_fills(&self) -> Result<Vec<FillRow>, LedgerError> {
        Ok(self.read().await?.fills_ordered())
    }

    /// Trip rows ordered by (`fecha`, `seq`).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] if the file cannot be read
    /// or parsed.
    pub async fn load_trips(&self) -> Result<Vec<TripRow>, LedgerError> {
        Ok(self.read().await?.trips_ordered())
    }

    /// Appends a fill.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] on I/O failure.
    pub async fn append_fill(&self, fill: &ValidatedFill) -> Result<FillEvent, LedgerError> {
        self.mutate(|tables| Ok(tables.append_fill(fill))).await
    }

    /// Replaces a fill's raw values.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown id, or
    /// [`LedgerError::StorageUnavailable`] on I/O failure.
    pub async fn update_fill(&self, id: RecordId, fill: &ValidatedFill) -> Result<FillEvent, LedgerError> {
        self.mutate(|tables| tables.update_fill(id, fill)).await
    }

    /// Deletes a fill.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown id, or
    /// [`LedgerError::StorageUnavailable`] on I/O failure.
    pub async fn delete_fill(&self, id: RecordId) -> Result<(), LedgerError> {
        self.mutate(|tables| tables.delete_fill(id)).await
    }

    /// Writes derived fill columns.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] on I/O failure.
    pub async fn save_fill_metrics(&self, updates: &[(RecordId, FillMetrics)]) -> Result<(), LedgerError> {
        self.mutate(|tables| {
            tables.save_fill_metrics(updates);
            Ok(())
        })
        .await
    }

    /// Appends a trip.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] on I/O failure.
    pub async fn append_trip(&self, trip: &ValidatedTrip) -> Result<Trip, LedgerError> {
        self.mutate(|tables| Ok(tables.append_trip(trip))).await
    }

    /// Replaces a trip's raw values.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown id, or
    /// [`LedgerError::StorageUnavailable`] on I/O failure.
    pub async fn update_trip(&self, id: RecordId, trip: &ValidatedTrip) -> Result<Trip, LedgerError> {
        self.mutate(|tables| tables.update_trip(id, trip)).await
    }

    /// Deletes a trip.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown id, or
    /// [`LedgerError::StorageUnavailable`] on I/O failure.
    pub async fn delete_trip(&self, id: RecordId) -> Result<(), LedgerError> {
        self.mutate(|tables| tables.delete_trip(id)).await
    }
}
