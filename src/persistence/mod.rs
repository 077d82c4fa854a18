//! Persistence layer: the two record tables behind one of three backends.
//!
//! [`RecordStore`] dispatches to an in-memory store, a flat JSON file, or
//! PostgreSQL. Every backend keeps raw columns plus the derived fill
//! columns, orders rows by (`fecha`, `seq`) and assigns the sequence on
//! insert.

pub mod file;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod tables;

use tracing::info;

use crate::config::{LedgerConfig, StorageBackend};
use crate::domain::{FillEvent, FillMetrics, RecordId, Trip, ValidatedFill, ValidatedTrip};
use crate::error::LedgerError;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use models::{FillRow, TripRow};
pub use postgres::PostgresStore;

/// Record store selected at startup.
#[derive(Debug)]
pub enum RecordStore {
    /// In-process tables.
    Memory(MemoryStore),
    /// JSON document on disk.
    File(FileStore),
    /// PostgreSQL pool.
    Postgres(PostgresStore),
}

impl RecordStore {
    /// Opens the backend named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] if the database cannot be
    /// reached or migrated.
    pub async fn connect(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let store = match config.storage_backend {
            StorageBackend::Memory => Self::Memory(MemoryStore::new()),
            StorageBackend::File => Self::File(FileStore::new(&config.ledger_file_path)),
            StorageBackend::Postgres => {
                Self::Postgres(PostgresStore::connect(&config.postgres_settings()).await?)
            }
        };
        info!(backend = %store.backend(), "record store ready");
        Ok(store)
    }

    /// Which backend this is.
    #[must_use]
    pub const fn backend(&self) -> StorageBackend {
        match self {
            Self::Memory(_) => StorageBackend::Memory,
            Self::File(_) => StorageBackend::File,
            Self::Postgres(_) => StorageBackend::Postgres,
        }
    }

    /// Fill rows ordered by (`fecha`, `seq`).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] if the backend cannot be read.
    pub async fn load_fills(&self) -> Result<Vec<FillRow>, LedgerError> {
        match self {
            Self::Memory(store) => Ok(store.load_fills().await),
            Self::File(store) => store.load_fills().await,
            Self::Postgres(store) => store.load_fills().await,
        }
    }

    /// Trip rows ordered by (`fecha`, `seq`).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] if the backend cannot be read.
    pub async fn load_trips(&self) -> Result<Vec<TripRow>, LedgerError> {
        match self {
            Self::Memory(store) => Ok(store.load_trips().await),
            Self::File(store) => store.load_trips().await,
            Self::Postgres(store) => store.load_trips().await,
        }
    }

    /// Stores a new fill and returns it with its assigned id and sequence.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] if the write fails.
    pub async fn append_fill(&self, fill: &ValidatedFill) -> Result<FillEvent, LedgerError> {
        match self {
            Self::Memory(store) => Ok(store.append_fill(fill).await),
            Self::File(store) => store.append_fill(fill).await,
            Self::Postgres(store) => store.append_fill(fill).await,
        }
    }

    /// Replaces a fill's raw values, keeping id and sequence.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown id, or
    /// [`LedgerError::StorageUnavailable`] if the write fails.
    pub async fn update_fill(&self, id: RecordId, fill: &ValidatedFill) -> Result<FillEvent, LedgerError> {
        match self {
            Self::Memory(store) => store.update_fill(id, fill).await,
            Self::File(store) => store.update_fill(id, fill).await,
            Self::Postgres(store) => store.update_fill(id, fill).await,
        }
    }

    /// Deletes a fill.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown id, or
    /// [`LedgerError::StorageUnavailable`] if the write fails.
    pub async fn delete_fill(&self, id: RecordId) -> Result<(), LedgerError> {
        match self {
            Self::Memory(store) => store.delete_fill(id).await,
            Self::File(store) => store.delete_fill(id).await,
            Self::Postgres(store) => store.delete_fill(id).await,
        }
    }

    /// Writes derived fill columns.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] if the write fails.
    pub async fn save_fill_metrics(&self, updates: &[(RecordId, FillMetrics)]) -> Result<(), LedgerError> {
        if updates.is_empty() {
            return Ok(());
        }
        match self {
            Self::Memory(store) => {
                store.save_fill_metrics(updates).await;
                Ok(())
            }
            Self::File(store) => store.save_fill_metrics(updates).await,
            Self::Postgres(store) => store.save_fill_metrics(updates).await,
        }
    }

    /// Stores a new trip.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] if the write fails.
    pub async fn append_trip(&self, trip: &ValidatedTrip) -> Result<Trip, LedgerError> {
        match self {
            Self::Memory(store) => Ok(store.append_trip(trip).await),
            Self::File(store) => store.append_trip(trip).await,
            Self::Postgres(store) => store.append_trip(trip).await,
        }
    }

    /// Replaces a trip's raw values.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown id, or
    /// [`LedgerError::StorageUnavailable`] if the write fails.
    pub async fn update_trip(&self, id: RecordId, trip: &ValidatedTrip) -> Result<Trip, LedgerError> {
        match self {
            Self::Memory(store) => store.update_trip(id, trip).await,
            Self::File(store) => store.update_trip(id, trip).await,
            Self::Postgres(store) => store.update_trip(id, trip).await,
        }
    }

    /// Deletes a trip.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown id, or
    /// [`LedgerError::StorageUnavailable`] if the write fails.
    pub async fn delete_trip(&self, id: RecordId) -> Result<(), LedgerError> {
        match self {
            Self::Memory(store) => store.delete_trip(id).await,
            Self::File(store) => store.delete_trip(id).await,
            Self::Postgres(store) => store.delete_trip(id).await,
        }
    }
}
