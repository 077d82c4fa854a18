//! Recalculation engine for the fill sequence.
//!
//! [`Ledger`] owns the raw fill events in their total order together with
//! the current [`Resolution`]. Every [`FillMutation`] triggers a full
//! recompute of the sequence; the returned [`Recalculation`] names the
//! records whose derived values moved so callers can persist just those.

use std::collections::HashMap;

use super::RecordId;
use super::fill::{FillEvent, FillMetrics};
use super::resolver::{Resolution, ResolutionStrategy, resolve_sorted, sort_fills};
use crate::error::LedgerError;

/// A change to the raw fill sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum FillMutation {
    /// A newly stored fill.
    Insert(FillEvent),
    /// New raw values for an existing fill (same id and sequence).
    Update(FillEvent),
    /// Removal of the fill with this id.
    Delete(RecordId),
}

impl FillMutation {
    /// Id of the record being changed.
    #[must_use]
    pub const fn record_id(&self) -> RecordId {
        match self {
            Self::Insert(event) | Self::Update(event) => event.id,
            Self::Delete(id) => *id,
        }
    }
}

/// Outcome of applying one mutation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Recalculation {
    /// Records whose derived metrics differ from before the mutation,
    /// in sequence order. Newly inserted records are always listed.
    pub changed: Vec<RecordId>,
    /// The mutated record and its successor, measured in the order that
    /// holds after the mutation (before it, for deletes).
    pub affected: Vec<RecordId>,
}

/// Ordered fill events plus their derived metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    strategy: ResolutionStrategy,
    events: Vec<FillEvent>,
    resolution: Resolution,
}

impl Ledger {
    /// Sorts `events` and resolves them under `strategy`.
    #[must_use]
    pub fn new(strategy: ResolutionStrategy, mut events: Vec<FillEvent>) -> Self {
        sort_fills(&mut events);
        let resolution = resolve_sorted(strategy, &events);
        Self {
            strategy,
            events,
            resolution,
        }
    }

    /// Pairing rule in use.
    #[must_use]
    pub const fn strategy(&self) -> ResolutionStrategy {
        self.strategy
    }

    /// Raw events in `(timestamp, sequence)` order.
    #[must_use]
    pub fn events(&self) -> &[FillEvent] {
        &self.events
    }

    /// Current derived state.
    #[must_use]
    pub const fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    /// Number of fills in the ledger.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// `true` when no fills are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Re-resolves the same raw events under another strategy.
    #[must_use]
    pub fn with_strategy(&self, strategy: ResolutionStrategy) -> Self {
        if strategy == self.strategy {
            return self.clone();
        }
        Self {
            strategy,
            events: self.events.clone(),
            resolution: resolve_sorted(strategy, &self.events),
        }
    }

    /// Ids of the record and the one right after it in sorted order.
    ///
    /// Those are the only records whose derived values can move when the
    /// record's raw fields change in place.
    #[must_use]
    pub fn affected_region(&self, id: RecordId) -> Vec<RecordId> {
        let Some(position) = self.position_of(id) else {
            return Vec::new();
        };
        self.events
            .iter()
            .skip(position)
            .take(2)
            .map(|event| event.id)
            .collect()
    }

    /// Applies a mutation and recomputes the whole sequence.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotFound`] when an update or delete targets
    /// an unknown id, and [`LedgerError::Internal`] when an insert reuses
    /// an existing id. The ledger is left untouched on error.
    pub fn apply(&mut self, mutation: FillMutation) -> Result<Recalculation, LedgerError> {
        let id = mutation.record_id();
        let before: HashMap<RecordId, FillMetrics> = self
            .resolution
            .fills
            .iter()
            .map(|fill| (fill.event.id, fill.metrics))
            .collect();

        let mut affected = Vec::new();
        match mutation {
            FillMutation::Insert(event) => {
                if before.contains_key(&id) {
                    return Err(LedgerError::Internal(format!(
                        "fill {id} is already in the ledger"
                    )));
                }
                self.events.push(event);
            }
            FillMutation::Update(event) => {
                // The old successor loses this record as its predecessor.
                affected = self.affected_region(id);
                let slot = self
                    .events
                    .iter_mut()
                    .find(|existing| existing.id == id)
                    .ok_or(LedgerError::fill_not_found(id))?;
                *slot = event;
            }
            FillMutation::Delete(_) => {
                affected = self.affected_region(id);
                if affected.is_empty() {
                    return Err(LedgerError::fill_not_found(id));
                }
                self.events.retain(|event| event.id != id);
            }
        }

        sort_fills(&mut self.events);
        self.resolution = resolve_sorted(self.strategy, &self.events);

        for region_id in self.affected_region(id) {
            if !affected.contains(&region_id) {
                affected.push(region_id);
            }
        }

        let changed = self
            .resolution
            .fills
            .iter()
            .filter(|fill| before.get(&fill.event.id) != Some(&fill.metrics))
            .map(|fill| fill.event.id)
            .collect();

        Ok(Recalculation { changed, affected })
    }

    fn position_of(&self, id: RecordId) -> Option<usize> {
        self.events.iter().position(|event| event.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing, clippy::float_cmp)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;

    fn day(n: i64) -> DateTime<Utc> {
        let Some(base) = Utc.with_ymd_and_hms(2024, 5, 1, 7, 30, 0).single() else {
            panic!("valid date");
        };
        base + Duration::days(n)
    }

    fn fill(sequence: u64, at: i64, odometer: u32) -> FillEvent {
        FillEvent {
            id: RecordId::new(),
            sequence,
            timestamp: day(at),
            odometer,
            odometer_start: None,
            fuel_amount: 10.0,
            price_total: 160_000.0,
            climate_control: None,
        }
    }

    fn distance_of(ledger: &Ledger, id: RecordId) -> Option<i64> {
        ledger
            .resolution()
            .metrics_of(id)
            .and_then(|m| m.distance_since_prior_fill)
    }

    #[test]
    fn scenario_b_insert_between_repairs_successor() {
        let first = fill(1, 0, 1000);
        let last = fill(2, 10, 1400);
        let last_id = last.id;
        let mut ledger = Ledger::new(ResolutionStrategy::FillToFill, vec![first, last]);
        assert_eq!(distance_of(&ledger, last_id), Some(400));

        let middle = fill(3, 5, 1200);
        let middle_id = middle.id;
        let Ok(recalc) = ledger.apply(FillMutation::Insert(middle)) else {
            panic!("insert failed");
        };

        assert_eq!(distance_of(&ledger, middle_id), Some(200));
        assert_eq!(distance_of(&ledger, last_id), Some(200));
        assert_eq!(recalc.changed, vec![middle_id, last_id]);
        assert_eq!(recalc.affected, vec![middle_id, last_id]);
    }

    #[test]
    fn scenario_c_delete_middle_remeasures_against_first() {
        let first = fill(1, 0, 1000);
        let middle = fill(2, 5, 1200);
        let last = fill(3, 10, 1400);
        let (middle_id, last_id) = (middle.id, last.id);
        let mut ledger = Ledger::new(ResolutionStrategy::FillToFill, vec![first, middle, last]);
        assert_eq!(distance_of(&ledger, last_id), Some(200));

        let Ok(recalc) = ledger.apply(FillMutation::Delete(middle_id)) else {
            panic!("delete failed");
        };

        assert_eq!(ledger.len(), 2);
        assert_eq!(distance_of(&ledger, last_id), Some(400));
        assert_eq!(
            ledger.resolution().metrics_of(last_id).and_then(|m| m.economy),
            Some(40.0)
        );
        assert_eq!(recalc.changed, vec![last_id]);
        assert_eq!(recalc.affected, vec![middle_id, last_id]);
    }

    #[test]
    fn update_that_moves_a_record_repairs_both_neighbourhoods() {
        let a = fill(1, 0, 1000);
        let b = fill(2, 5, 1200);
        let c = fill(3, 10, 1400);
        let d = fill(4, 15, 1600);
        let (b_id, c_id, d_id) = (b.id, c.id, d.id);
        let mut ledger = Ledger::new(ResolutionStrategy::FillToFill, vec![a, b.clone(), c, d]);

        // Move b after c by editing its timestamp and odometer.
        let moved = FillEvent {
            timestamp: day(12),
            odometer: 1500,
            ..b
        };
        let Ok(recalc) = ledger.apply(FillMutation::Update(moved)) else {
            panic!("update failed");
        };

        let order: Vec<_> = ledger.events().iter().map(|e| e.odometer).collect();
        assert_eq!(order, vec![1000, 1400, 1500, 1600]);
        assert_eq!(distance_of(&ledger, c_id), Some(400));
        assert_eq!(distance_of(&ledger, b_id), Some(100));
        assert_eq!(distance_of(&ledger, d_id), Some(100));
        assert!(recalc.changed.contains(&c_id));
        assert!(recalc.changed.contains(&d_id));
        assert!(recalc.affected.contains(&c_id));
        assert!(recalc.affected.contains(&d_id));
    }

    #[test]
    fn unknown_ids_are_not_found_and_leave_state_untouched() {
        let mut ledger = Ledger::new(ResolutionStrategy::FillToFill, vec![fill(1, 0, 1000)]);
        let snapshot = ledger.clone();

        let result = ledger.apply(FillMutation::Delete(RecordId::new()));
        assert!(matches!(result, Err(LedgerError::NotFound { .. })));

        let result = ledger.apply(FillMutation::Update(fill(9, 1, 1100)));
        assert!(matches!(result, Err(LedgerError::NotFound { .. })));
        assert_eq!(ledger, snapshot);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let event = fill(1, 0, 1000);
        let mut ledger = Ledger::new(ResolutionStrategy::FillToFill, vec![event.clone()]);
        assert!(ledger.apply(FillMutation::Insert(event)).is_err());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn recompute_is_idempotent() {
        let events = vec![fill(1, 0, 1000), fill(2, 3, 1350), fill(3, 9, 1300), fill(4, 12, 1800)];
        let once = Ledger::new(ResolutionStrategy::FillToFill, events.clone());
        let twice = Ledger::new(ResolutionStrategy::FillToFill, once.events().to_vec());
        assert_eq!(once.resolution(), twice.resolution());
    }

    #[test]
    fn incremental_matches_fresh_recompute() {
        let mut ledger = Ledger::new(ResolutionStrategy::FillToFill, Vec::new());
        let events = vec![fill(1, 4, 1400), fill(2, 0, 1000), fill(3, 2, 1180), fill(4, 9, 1900)];
        for event in events.clone() {
            let Ok(_) = ledger.apply(FillMutation::Insert(event)) else {
                panic!("insert failed");
            };
        }
        let Ok(_) = ledger.apply(FillMutation::Delete(events[2].id)) else {
            panic!("delete failed");
        };

        let fresh = Ledger::new(
            ResolutionStrategy::FillToFill,
            vec![events[0].clone(), events[1].clone(), events[3].clone()],
        );
        assert_eq!(ledger.resolution(), fresh.resolution());
    }

    #[test]
    fn affected_region_is_record_and_successor() {
        let a = fill(1, 0, 1000);
        let b = fill(2, 1, 1100);
        let c = fill(3, 2, 1200);
        let (a_id, b_id, c_id) = (a.id, b.id, c.id);
        let ledger = Ledger::new(ResolutionStrategy::FillToFill, vec![c, a, b]);
        assert_eq!(ledger.affected_region(a_id), vec![a_id, b_id]);
        assert_eq!(ledger.affected_region(c_id), vec![c_id]);
        assert!(ledger.affected_region(RecordId::new()).is_empty());
    }

    #[test]
    fn strategy_switch_keeps_raw_events() {
        let ledger = Ledger::new(ResolutionStrategy::FillToFill, vec![fill(1, 0, 1000), fill(2, 1, 1200)]);
        let explicit = ledger.with_strategy(ResolutionStrategy::ExplicitOdometer);
        assert_eq!(explicit.events(), ledger.events());
        assert_eq!(explicit.resolution().diagnostics.len(), 2);
    }
}
