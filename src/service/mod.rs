//! Service layer: business logic orchestration.
//!
//! [`LedgerService`] validates input, writes through the
//! [`crate::persistence::RecordStore`], drives the recalculation engine and
//! builds reports.

pub mod ledger_service;

pub use ledger_service::{FillChange, LedgerService, LedgerSnapshot, Report, TripChange};
