//! Domain layer: record model, interval resolution, recalculation and
//! reporting.
//!
//! Everything here is synchronous and free of I/O. The service layer feeds
//! it raw records loaded from storage and persists what it derives.

pub mod aggregation;
pub mod estimation;
pub mod fill;
pub mod ledger;
pub mod record_id;
pub mod resolver;
pub mod trip;
pub mod trip_session;
pub mod validation;

pub use aggregation::{FillSummary, HistoryStatus, Mean, Partitioned, TripSummary};
pub use estimation::{EstimationMode, TripEstimate};
pub use fill::{FillEvent, FillInput, FillMetrics, ResolvedFill, ValidatedFill};
pub use ledger::{FillMutation, Ledger, Recalculation};
pub use record_id::{EntityKind, RecordId};
pub use resolver::{Diagnostic, DiagnosticKind, Resolution, ResolutionStrategy, ResolvedTrip, TripResolution};
pub use trip::{Trip, TripInput, ValidatedTrip};
pub use trip_session::{TripFinish, TripSession};
pub use validation::ValidationError;
