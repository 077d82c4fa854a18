//! Ledger service: validate, persist, recompute, report.
//!
//! Every mutation runs the same pipeline: validate the raw input, write it
//! to the [`RecordStore`], drop the read cache, feed the change through
//! [`Ledger::apply`] and write back whichever derived columns moved.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::domain::aggregation::{summarize_fills, summarize_trips};
use crate::domain::estimation::estimate_trips;
use crate::domain::resolver::resolve_trips;
use crate::domain::{
    Diagnostic, FillInput, FillMetrics, FillMutation, FillSummary, Ledger, RecordId, Resolution,
    ResolutionStrategy, ResolvedFill, ResolvedTrip, Trip, TripEstimate, TripFinish, TripInput,
    TripResolution, TripSession, TripSummary,
};
use crate::error::LedgerError;
use crate::persistence::{FillRow, RecordStore, TripRow};

/// Relative tolerance when comparing persisted derived values with
/// recomputed ones.
const DRIFT_TOLERANCE: f64 = 1e-9;

/// Everything read from the store, resolved.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    /// Fill events and their derived metrics under the configured strategy.
    pub ledger: Ledger,
    /// Trips and their derived distances.
    pub trips: TripResolution,
}

/// Outcome of a fill mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillChange {
    /// The stored fill with fresh metrics; `None` after a delete.
    pub fill: Option<ResolvedFill>,
    /// Fills whose derived values were recomputed to something new.
    pub recomputed: Vec<RecordId>,
    /// Diagnostics on the mutated fill and its successor.
    pub diagnostics: Vec<Diagnostic>,
}

/// Outcome of a trip mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripChange {
    /// The stored trip with its derived distance; `None` after a delete.
    pub trip: Option<ResolvedTrip>,
    /// Diagnostics on the mutated trip.
    pub diagnostics: Vec<Diagnostic>,
}

/// Summary statistics over both tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Fill statistics.
    pub fills: FillSummary,
    /// Trip statistics.
    pub trips: TripSummary,
    /// Every soft failure found while resolving.
    pub diagnostics: Vec<Diagnostic>,
}

/// Orchestration layer for every ledger action.
///
/// Mutations are serialized through an internal lock so each one sees the
/// state committed by the previous one.
#[derive(Debug)]
pub struct LedgerService {
    store: Arc<RecordStore>,
    strategy: ResolutionStrategy,
    cache_enabled: bool,
    cache: RwLock<Option<Arc<LedgerSnapshot>>>,
    session: Mutex<TripSession>,
    write_lock: Mutex<()>,
}

impl LedgerService {
    /// Creates a service over `store`.
    #[must_use]
    pub fn new(store: Arc<RecordStore>, strategy: ResolutionStrategy, cache_enabled: bool) -> Self {
        Self {
            store,
            strategy,
            cache_enabled,
            cache: RwLock::new(None),
            session: Mutex::new(TripSession::Idle),
            write_lock: Mutex::new(()),
        }
    }

    /// The configured resolution strategy.
    #[must_use]
    pub const fn strategy(&self) -> ResolutionStrategy {
        self.strategy
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// Current resolved state, from cache when allowed.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] if the store cannot be read.
    pub async fn snapshot(&self) -> Result<Arc<LedgerSnapshot>, LedgerError> {
        if self.cache_enabled
            && let Some(cached) = self.cache.read().await.as_ref()
        {
            debug!("ledger snapshot served from cache");
            return Ok(Arc::clone(cached));
        }
        let snapshot = Arc::new(self.load_snapshot().await?);
        if self.cache_enabled {
            *self.cache.write().await = Some(Arc::clone(&snapshot));
        }
        Ok(snapshot)
    }

    async fn invalidate(&self) {
        if self.cache.write().await.take().is_some() {
            debug!("ledger snapshot cache invalidated");
        }
    }

    /// Reads both tables, resolves them and repairs drifted derived columns.
    async fn load_snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        let fill_rows = self.store.load_fills().await?;
        let trip_rows = self.store.load_trips().await?;

        let ledger = Ledger::new(
            self.strategy,
            fill_rows.iter().map(FillRow::to_event).collect(),
        );
        let drifted: Vec<(RecordId, FillMetrics)> = fill_rows
            .iter()
            .filter_map(|row| {
                let fresh = ledger.resolution().metrics_of(row.id)?;
                metrics_drifted(&row.stored_metrics(), &fresh).then_some((row.id, fresh))
            })
            .collect();
        if !drifted.is_empty() {
            info!(count = drifted.len(), "repairing stale derived fill columns");
            self.persist_metrics(&drifted).await;
        }

        let trips: Vec<Trip> = trip_rows.iter().map(TripRow::to_trip).collect();
        debug!(fills = ledger.len(), trips = trips.len(), "ledger loaded");
        Ok(LedgerSnapshot {
            ledger,
            trips: resolve_trips(&trips),
        })
    }

    async fn persist_metrics(&self, updates: &[(RecordId, FillMetrics)]) {
        if let Err(e) = self.store.save_fill_metrics(updates).await {
            warn!(error = %e, count = updates.len(), "derived fill columns not written back");
        }
    }

    async fn apply_fill_mutation(
        &self,
        mut ledger: Ledger,
        mutation: FillMutation,
    ) -> Result<FillChange, LedgerError> {
        let id = mutation.record_id();
        let deleted = matches!(mutation, FillMutation::Delete(_));
        let edited = matches!(mutation, FillMutation::Update(_));
        let recalculation = ledger.apply(mutation)?;

        // An edit clears the row's derived columns, so it is written back
        // even when its metrics came out the same.
        let mut written = recalculation.changed.clone();
        if edited && !written.contains(&id) {
            written.push(id);
        }
        let updates: Vec<(RecordId, FillMetrics)> = written
            .iter()
            .filter_map(|changed| {
                ledger
                    .resolution()
                    .metrics_of(*changed)
                    .map(|metrics| (*changed, metrics))
            })
            .collect();
        self.persist_metrics(&updates).await;

        let resolution = ledger.resolution();
        let diagnostics: Vec<Diagnostic> = resolution
            .diagnostics
            .iter()
            .filter(|d| recalculation.affected.contains(&d.record_id))
            .cloned()
            .collect();
        for anomaly in diagnostics.iter().filter(|d| d.is_ordering_anomaly()) {
            warn!(id = %anomaly.record_id, "{}", anomaly.message());
        }
        let fill = if deleted {
            None
        } else {
            resolution.fills.iter().find(|f| f.event.id == id).cloned()
        };
        Ok(FillChange {
            fill,
            recomputed: recalculation.changed,
            diagnostics,
        })
    }

    /// Validates and stores a new fill, recomputing its neighbours.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] for rejected input (nothing is
    /// stored), or [`LedgerError::StorageUnavailable`] if the write fails.
    pub async fn record_fill(&self, input: FillInput) -> Result<FillChange, LedgerError> {
        let valid = input.validate()?;
        let _guard = self.write_lock.lock().await;
        let before = self.load_snapshot().await?;

        let event = self.store.append_fill(&valid).await?;
        self.invalidate().await;
        info!(id = %event.id, odometer = event.odometer, "fill recorded");

        self.apply_fill_mutation(before.ledger, FillMutation::Insert(event))
            .await
    }

    /// Replaces a fill's raw values.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] for rejected input,
    /// [`LedgerError::NotFound`] for an unknown id, or
    /// [`LedgerError::StorageUnavailable`] if the write fails.
    pub async fn edit_fill(&self, id: RecordId, input: FillInput) -> Result<FillChange, LedgerError> {
        let valid = input.validate()?;
        let _guard = self.write_lock.lock().await;
        let before = self.load_snapshot().await?;

        let event = self.store.update_fill(id, &valid).await?;
        self.invalidate().await;
        info!(%id, odometer = event.odometer, "fill edited");

        self.apply_fill_mutation(before.ledger, FillMutation::Update(event))
            .await
    }

    /// Deletes a fill; its successor is re-measured against the fill before it.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] for an unknown id, or
    /// [`LedgerError::StorageUnavailable`] if the write fails.
    pub async fn remove_fill(&self, id: RecordId) -> Result<FillChange, LedgerError> {
        let _guard = self.write_lock.lock().await;
        let before = self.load_snapshot().await?;

        self.store.delete_fill(id).await?;
        self.invalidate().await;
        info!(%id, "fill deleted");

        self.apply_fill_mutation(before.ledger, FillMutation::Delete(id))
            .await
    }

    /// All fills in order with their metrics and diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] if the store cannot be read.
    pub async fn list_fills(&self) -> Result<Resolution, LedgerError> {
        Ok(self.snapshot().await?.ledger.resolution().clone())
    }

    /// Resolves `trips`, which already hold the written row, and picks out
    /// `id`. The store is not read again.
    fn trip_change(trips: &[Trip], id: RecordId) -> TripChange {
        let resolution = resolve_trips(trips);
        TripChange {
            trip: resolution.trips.iter().find(|t| t.trip.id == id).cloned(),
            diagnostics: resolution
                .diagnostics
                .into_iter()
                .filter(|d| d.record_id == id)
                .collect(),
        }
    }

    async fn stored_trips(&self) -> Result<Vec<Trip>, LedgerError> {
        Ok(self
            .store
            .load_trips()
            .await?
            .iter()
            .map(TripRow::to_trip)
            .collect())
    }

    /// Validates and stores a new trip.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`] when the end odometer is not
    /// above the start, or [`LedgerError::StorageUnavailable`]. The store is
    /// not read after the trip is appended, so an error means nothing was
    /// stored.
    pub async fn record_trip(&self, input: TripInput) -> Result<TripChange, LedgerError> {
        let valid = input.validate()?;
        let _guard = self.write_lock.lock().await;
        let mut trips = self.stored_trips().await?;

        let trip = self.store.append_trip(&valid).await?;
        self.invalidate().await;
        info!(id = %trip.id, distance = trip.distance(), "trip recorded");

        let id = trip.id;
        trips.push(trip);
        Ok(Self::trip_change(&trips, id))
    }

    /// Replaces a trip's raw values.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Validation`], [`LedgerError::NotFound`] or
    /// [`LedgerError::StorageUnavailable`].
    pub async fn edit_trip(&self, id: RecordId, input: TripInput) -> Result<TripChange, LedgerError> {
        let valid = input.validate()?;
        let _guard = self.write_lock.lock().await;
        let mut trips = self.stored_trips().await?;

        let updated = self.store.update_trip(id, &valid).await?;
        self.invalidate().await;
        info!(%id, "trip edited");

        trips.retain(|t| t.id != id);
        trips.push(updated);
        Ok(Self::trip_change(&trips, id))
    }

    /// Deletes a trip.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] or [`LedgerError::StorageUnavailable`].
    pub async fn remove_trip(&self, id: RecordId) -> Result<TripChange, LedgerError> {
        {
            let _guard = self.write_lock.lock().await;
            self.store.delete_trip(id).await?;
            self.invalidate().await;
        }
        info!(%id, "trip deleted");
        Ok(TripChange {
            trip: None,
            diagnostics: Vec::new(),
        })
    }

    /// All trips in order with their distances and diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] if the store cannot be read.
    pub async fn list_trips(&self) -> Result<TripResolution, LedgerError> {
        Ok(self.snapshot().await?.trips.clone())
    }

    /// Current trip session state.
    pub async fn session(&self) -> TripSession {
        *self.session.lock().await
    }

    /// Starts a trip at `start_odometer`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::SessionConflict`] if a trip is already running.
    pub async fn start_trip(
        &self,
        start_odometer: u32,
        started_at: Option<DateTime<Utc>>,
    ) -> Result<TripSession, LedgerError> {
        let mut session = self.session.lock().await;
        let next = session.start(start_odometer, started_at.unwrap_or_else(Utc::now))?;
        *session = next;
        info!(start_odometer, "trip started");
        Ok(next)
    }

    /// Finishes the running trip and stores it.
    ///
    /// The session stays in progress if the trip is rejected or cannot be
    /// stored, so the finish can be retried.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::SessionConflict`] when idle,
    /// [`LedgerError::Validation`] when the end odometer is not above the
    /// start, or [`LedgerError::StorageUnavailable`].
    pub async fn finish_trip(&self, finish: TripFinish) -> Result<TripChange, LedgerError> {
        let mut session = self.session.lock().await;
        let (next, input) = session.finish(finish)?;
        let change = self.record_trip(input).await?;
        *session = next;
        Ok(change)
    }

    /// Abandons the running trip without storing anything.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::SessionConflict`] when idle.
    pub async fn cancel_trip(&self) -> Result<TripSession, LedgerError> {
        let mut session = self.session.lock().await;
        let next = session.cancel()?;
        *session = next;
        info!("trip cancelled");
        Ok(next)
    }

    /// Summary statistics, optionally under a strategy other than the
    /// configured one. Nothing is written.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] if the store cannot be read.
    pub async fn report(&self, strategy: Option<ResolutionStrategy>) -> Result<Report, LedgerError> {
        let snapshot = self.snapshot().await?;
        let strategy = strategy.unwrap_or(self.strategy);
        let ledger = snapshot.ledger.with_strategy(strategy);
        let resolution = ledger.resolution();

        let mut diagnostics = resolution.diagnostics.clone();
        diagnostics.extend(snapshot.trips.diagnostics.iter().cloned());
        Ok(Report {
            fills: summarize_fills(strategy, resolution),
            trips: summarize_trips(&snapshot.trips),
            diagnostics,
        })
    }

    /// Per-trip fuel and cost estimates from historical fill averages.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StorageUnavailable`] if the store cannot be read.
    pub async fn trip_estimates(&self) -> Result<Vec<TripEstimate>, LedgerError> {
        let snapshot = self.snapshot().await?;
        let summary = summarize_fills(self.strategy, snapshot.ledger.resolution());
        Ok(estimate_trips(
            &snapshot.trips.trips,
            summary.mean_economy,
            summary.mean_cost_per_distance,
        ))
    }
}

fn metrics_drifted(stored: &FillMetrics, fresh: &FillMetrics) -> bool {
    stored.distance_since_prior_fill != fresh.distance_since_prior_fill
        || !close(stored.economy, fresh.economy)
        || !close(stored.cost_per_distance, fresh.cost_per_distance)
}

fn close(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => (a - b).abs() <= DRIFT_TOLERANCE * a.abs().max(b.abs()).max(1.0),
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing, clippy::float_cmp)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::domain::{HistoryStatus, Mean};
    use crate::persistence::{FileStore, MemoryStore};

    fn service() -> LedgerService {
        service_with_cache(true)
    }

    fn service_with_cache(cache_enabled: bool) -> LedgerService {
        LedgerService::new(
            Arc::new(RecordStore::Memory(MemoryStore::new())),
            ResolutionStrategy::FillToFill,
            cache_enabled,
        )
    }

    fn day(n: i64) -> DateTime<Utc> {
        let Some(base) = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).single() else {
            panic!("invalid base date");
        };
        base + Duration::days(n)
    }

    fn fill(n: i64, odometer: u32, fuel_amount: f64) -> FillInput {
        FillInput {
            timestamp: day(n),
            odometer,
            odometer_start: None,
            fuel_amount,
            price_total: fuel_amount * 15_000.0,
            climate_control: Some(n % 2 == 0),
        }
    }

    fn trip(n: i64, start: u32, end: u32) -> TripInput {
        TripInput {
            timestamp: day(n),
            odometer_start: start,
            odometer_end: end,
            climate_control_used: false,
            board_remaining_range: Some(200),
        }
    }

    async fn record(service: &LedgerService, input: FillInput) -> FillChange {
        let Ok(change) = service.record_fill(input).await else {
            panic!("fill rejected");
        };
        change
    }

    async fn stored_at(service: &LedgerService, odometer: u32) -> FillMetrics {
        let Ok(rows) = service.store().load_fills().await else {
            panic!("store read failed");
        };
        let Some(row) = rows.iter().find(|row| row.odometer == odometer) else {
            panic!("no stored row at odometer {odometer}");
        };
        row.stored_metrics()
    }

    fn stored_id(change: &FillChange) -> RecordId {
        let Some(fill) = &change.fill else {
            panic!("stored fill missing");
        };
        fill.event.id
    }

    fn metrics_at(resolution: &Resolution, odometer: u32) -> FillMetrics {
        let Some(found) = resolution.fills.iter().find(|f| f.event.odometer == odometer) else {
            panic!("no fill at odometer {odometer}");
        };
        found.metrics
    }

    #[tokio::test]
    async fn first_fill_has_no_metrics() {
        let service = service();
        let change = record(&service, fill(0, 1000, 10.0)).await;
        let Some(stored) = change.fill else {
            panic!("stored fill missing");
        };
        assert_eq!(stored.metrics, FillMetrics::UNDEFINED);
    }

    #[tokio::test]
    async fn inserting_between_fills_remeasures_the_successor() {
        let service = service();
        record(&service, fill(0, 1000, 10.0)).await;
        let last = record(&service, fill(4, 1400, 10.0)).await;
        let Some(last) = last.fill else {
            panic!("stored fill missing");
        };
        assert_eq!(last.metrics.distance_since_prior_fill, Some(400));

        let middle = record(&service, fill(2, 1200, 5.0)).await;
        assert!(middle.recomputed.contains(&last.event.id));

        let Ok(resolution) = service.list_fills().await else {
            panic!("list failed");
        };
        assert_eq!(metrics_at(&resolution, 1400).distance_since_prior_fill, Some(200));
    }

    #[tokio::test]
    async fn deleting_the_middle_fill_remeasures_against_the_first() {
        let service = service();
        record(&service, fill(0, 1000, 10.0)).await;
        let middle = record(&service, fill(1, 1200, 10.0)).await;
        record(&service, fill(2, 1400, 10.0)).await;
        let Some(middle) = middle.fill else {
            panic!("stored fill missing");
        };

        let Ok(change) = service.remove_fill(middle.event.id).await else {
            panic!("delete failed");
        };
        assert!(change.fill.is_none());
        assert_eq!(change.recomputed.len(), 1);

        let Ok(resolution) = service.list_fills().await else {
            panic!("list failed");
        };
        assert_eq!(resolution.fills.len(), 2);
        assert_eq!(metrics_at(&resolution, 1400).distance_since_prior_fill, Some(400));
    }

    #[tokio::test]
    async fn invalid_fill_is_not_stored() {
        let service = service();
        let result = service.record_fill(fill(0, 1000, 0.0)).await;
        assert!(matches!(result, Err(LedgerError::Validation(_))));
        let Ok(resolution) = service.list_fills().await else {
            panic!("list failed");
        };
        assert!(resolution.fills.is_empty());
    }

    #[tokio::test]
    async fn editing_unknown_fill_is_not_found() {
        let service = service();
        let result = service.edit_fill(RecordId::new(), fill(0, 1000, 10.0)).await;
        assert!(matches!(result, Err(LedgerError::NotFound { .. })));
    }

    #[tokio::test]
    async fn decreasing_odometer_is_reported_not_fatal() {
        let service = service();
        record(&service, fill(0, 2000, 10.0)).await;
        let change = record(&service, fill(1, 1900, 10.0)).await;
        assert!(change.diagnostics.iter().any(Diagnostic::is_ordering_anomaly));

        let Ok(report) = service.report(None).await else {
            panic!("report failed");
        };
        assert_eq!(report.fills.anomaly_count, 1);
        assert_eq!(report.fills.mean_economy, Mean::InsufficientData);
    }

    #[tokio::test]
    async fn cached_reads_see_every_write() {
        let service = service();
        record(&service, fill(0, 1000, 10.0)).await;
        let Ok(first) = service.list_fills().await else {
            panic!("list failed");
        };
        record(&service, fill(1, 1400, 10.0)).await;
        let Ok(second) = service.list_fills().await else {
            panic!("list failed");
        };
        assert_eq!(first.fills.len(), 1);
        assert_eq!(second.fills.len(), 2);
    }

    #[tokio::test]
    async fn report_under_other_strategy_writes_nothing() {
        let service = service();
        let mut explicit = fill(0, 1300, 10.0);
        explicit.odometer_start = Some(1000);
        record(&service, explicit).await;

        let Ok(fill_to_fill) = service.report(None).await else {
            panic!("report failed");
        };
        let Ok(explicit) = service.report(Some(ResolutionStrategy::ExplicitOdometer)).await else {
            panic!("report failed");
        };
        assert_eq!(fill_to_fill.fills.history, HistoryStatus::Insufficient);
        assert_eq!(explicit.fills.mean_economy.value(), Some(30.0));

        let Ok(resolution) = service.list_fills().await else {
            panic!("list failed");
        };
        assert_eq!(resolution.fills[0].metrics, FillMetrics::UNDEFINED);
    }

    #[tokio::test]
    async fn trips_round_trip_with_distance() {
        let service = service();
        let Ok(change) = service.record_trip(trip(0, 5000, 5120)).await else {
            panic!("trip rejected");
        };
        let Some(stored) = change.trip else {
            panic!("stored trip missing");
        };
        assert_eq!(stored.distance, Some(120));

        assert!(matches!(
            service.record_trip(trip(1, 5200, 5200)).await,
            Err(LedgerError::Validation(_))
        ));
        assert!(service.remove_trip(stored.trip.id).await.is_ok());
        assert!(matches!(
            service.remove_trip(stored.trip.id).await,
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn session_flow_stores_trip_and_returns_to_idle() {
        let service = service();
        assert!(service.start_trip(7000, Some(day(0))).await.is_ok());
        assert!(matches!(
            service.start_trip(7001, None).await,
            Err(LedgerError::SessionConflict(_))
        ));

        let bad_finish = TripFinish {
            end_odometer: 6900,
            climate_control_used: true,
            board_remaining_range: None,
        };
        assert!(matches!(
            service.finish_trip(bad_finish).await,
            Err(LedgerError::Validation(_))
        ));
        assert!(service.session().await.is_in_progress());

        let finish = TripFinish {
            end_odometer: 7080,
            ..bad_finish
        };
        let Ok(change) = service.finish_trip(finish).await else {
            panic!("finish failed");
        };
        assert_eq!(change.trip.and_then(|t| t.distance), Some(80));
        assert_eq!(service.session().await, TripSession::Idle);
        assert!(matches!(
            service.cancel_trip().await,
            Err(LedgerError::SessionConflict(_))
        ));
    }

    #[tokio::test]
    async fn estimates_use_historical_average() {
        let service = service();
        record(&service, fill(0, 1000, 10.0)).await;
        record(&service, fill(1, 1400, 10.0)).await;
        assert!(service.record_trip(trip(2, 1400, 1480)).await.is_ok());

        let Ok(estimates) = service.trip_estimates().await else {
            panic!("estimates failed");
        };
        assert_eq!(estimates.len(), 1);
        assert_eq!(estimates[0].estimated_fuel_used, Some(2.0));
        assert_eq!(estimates[0].estimated_fuel_remaining, Some(5.0));
    }

    #[test]
    fn drift_detection_tolerates_float_noise() {
        let stored = FillMetrics {
            distance_since_prior_fill: Some(400),
            economy: Some(40.000_000_000_001),
            cost_per_distance: Some(375.0),
        };
        let fresh = FillMetrics {
            economy: Some(40.0),
            ..stored
        };
        assert!(!metrics_drifted(&stored, &fresh));
        assert!(metrics_drifted(&FillMetrics::UNDEFINED, &fresh));
    }

    #[tokio::test]
    async fn reloading_from_file_reproduces_metrics() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("cannot create temp dir");
        };
        let path = dir.path().join("ledger.json");

        let writer = LedgerService::new(
            Arc::new(RecordStore::File(FileStore::new(&path))),
            ResolutionStrategy::FillToFill,
            false,
        );
        record(&writer, fill(0, 1000, 10.0)).await;
        record(&writer, fill(1, 1400, 10.0)).await;
        record(&writer, fill(2, 1850, 12.0)).await;
        let Ok(before) = writer.list_fills().await else {
            panic!("load failed");
        };

        let reader = LedgerService::new(
            Arc::new(RecordStore::File(FileStore::new(&path))),
            ResolutionStrategy::FillToFill,
            true,
        );
        let Ok(after) = reader.list_fills().await else {
            panic!("reload failed");
        };
        assert_eq!(before, after);
        assert_eq!(metrics_at(&after, 1850).economy, Some(37.5));
    }

    #[tokio::test]
    async fn inserted_fills_persist_derived_columns() {
        let service = service();
        record(&service, fill(0, 1000, 10.0)).await;
        record(&service, fill(2, 1400, 10.0)).await;
        assert_eq!(stored_at(&service, 1000).await, FillMetrics::UNDEFINED);
        assert_eq!(stored_at(&service, 1400).await.economy, Some(40.0));

        record(&service, fill(1, 1200, 5.0)).await;
        let successor = stored_at(&service, 1400).await;
        assert_eq!(successor.distance_since_prior_fill, Some(200));
        assert_eq!(successor.economy, Some(20.0));
        assert_eq!(stored_at(&service, 1200).await.economy, Some(40.0));
    }

    #[tokio::test]
    async fn moving_a_fill_rewrites_both_successors() {
        let service = service();
        record(&service, fill(0, 1000, 10.0)).await;
        let moved = record(&service, fill(1, 1200, 10.0)).await;
        record(&service, fill(2, 1400, 10.0)).await;
        record(&service, fill(3, 1600, 10.0)).await;
        assert_eq!(stored_at(&service, 1400).await.distance_since_prior_fill, Some(200));

        let relocated = FillInput {
            timestamp: day(2) + Duration::hours(12),
            odometer: 1500,
            ..fill(1, 1200, 10.0)
        };
        let Ok(change) = service.edit_fill(stored_id(&moved), relocated).await else {
            panic!("edit failed");
        };
        assert_eq!(
            change.fill.map(|f| f.metrics.distance_since_prior_fill),
            Some(Some(100))
        );

        let old_successor = stored_at(&service, 1400).await;
        assert_eq!(old_successor.distance_since_prior_fill, Some(400));
        assert_eq!(old_successor.economy, Some(40.0));
        assert_eq!(old_successor.cost_per_distance, Some(375.0));

        let new_successor = stored_at(&service, 1600).await;
        assert_eq!(new_successor.distance_since_prior_fill, Some(100));
        assert_eq!(new_successor.economy, Some(10.0));

        let edited = stored_at(&service, 1500).await;
        assert_eq!(edited.distance_since_prior_fill, Some(100));
        assert_eq!(edited.economy, Some(10.0));
    }

    #[tokio::test]
    async fn editing_climate_tag_keeps_stored_metrics() {
        let service = service();
        record(&service, fill(0, 1000, 10.0)).await;
        let second = record(&service, fill(1, 1400, 10.0)).await;
        let before = stored_at(&service, 1400).await;
        assert_eq!(before.economy, Some(40.0));

        let retagged = FillInput {
            climate_control: Some(true),
            ..fill(1, 1400, 10.0)
        };
        let Ok(change) = service.edit_fill(stored_id(&second), retagged).await else {
            panic!("edit failed");
        };
        assert!(change.recomputed.is_empty());
        assert_eq!(change.fill.map(|f| f.metrics), Some(before));
        assert_eq!(stored_at(&service, 1400).await, before);
    }

    #[tokio::test]
    async fn loading_repairs_hand_corrupted_columns() {
        let service = service_with_cache(false);
        record(&service, fill(0, 1000, 10.0)).await;
        let second = record(&service, fill(1, 1400, 10.0)).await;
        let expected = stored_at(&service, 1400).await;

        let corrupted = FillMetrics {
            distance_since_prior_fill: Some(9),
            economy: Some(0.9),
            cost_per_distance: None,
        };
        if service
            .store()
            .save_fill_metrics(&[(stored_id(&second), corrupted)])
            .await
            .is_err()
        {
            panic!("cannot corrupt fixture");
        }
        assert_eq!(stored_at(&service, 1400).await, corrupted);

        assert!(service.list_fills().await.is_ok());
        assert_eq!(stored_at(&service, 1400).await, expected);
    }

    #[tokio::test]
    async fn failed_finish_stores_nothing_and_retry_stores_once() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("cannot create temp dir");
        };
        let path = dir.path().join("ledger.json");
        let service = LedgerService::new(
            Arc::new(RecordStore::File(FileStore::new(&path))),
            ResolutionStrategy::FillToFill,
            false,
        );
        assert!(service.record_trip(trip(0, 4000, 4050)).await.is_ok());
        let Ok(document) = std::fs::read(&path) else {
            panic!("ledger file missing");
        };

        assert!(service.start_trip(5000, Some(day(1))).await.is_ok());
        let finish = TripFinish {
            end_odometer: 5090,
            climate_control_used: false,
            board_remaining_range: Some(150),
        };
        if std::fs::write(&path, "{ not json").is_err() {
            panic!("cannot corrupt fixture");
        }
        assert!(matches!(
            service.finish_trip(finish).await,
            Err(LedgerError::StorageUnavailable(_))
        ));
        assert!(service.session().await.is_in_progress());

        if std::fs::write(&path, &document).is_err() {
            panic!("cannot restore fixture");
        }
        let Ok(change) = service.finish_trip(finish).await else {
            panic!("retried finish failed");
        };
        assert_eq!(service.session().await, TripSession::Idle);

        let Ok(trips) = service.list_trips().await else {
            panic!("list failed");
        };
        assert_eq!(trips.trips.len(), 2);
        assert_eq!(trips.trips.last().cloned(), change.trip);
        assert_eq!(change.trip.and_then(|t| t.distance), Some(90));
    }

    #[tokio::test]
    async fn trip_change_reports_overlap_with_stored_trips() {
        let service = service();
        assert!(service.record_trip(trip(0, 3000, 3100)).await.is_ok());
        let Ok(change) = service.record_trip(trip(1, 3050, 3200)).await else {
            panic!("trip rejected");
        };
        assert_eq!(change.diagnostics.len(), 1);
        assert_eq!(change.trip.and_then(|t| t.distance), Some(150));
    }
}
