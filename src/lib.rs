//! # fuel-ledger
//!
//! Personal fuel-consumption ledger: records fuel fills and trips, derives
//! distance, economy and cost per distance from the ordered odometer
//! sequence, and serves records and summary statistics over REST.
//!
//! Raw fields are the only source of truth. Derived values are recomputed
//! on every create, edit or delete and written back next to the raw
//! columns so other readers of the tables see current figures.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── LedgerService (service/)
//!     ├── TripSession (domain/)
//!     │
//!     ├── Ledger / Resolver / Aggregation (domain/)
//!     │
//!     └── RecordStore: memory | JSON file | PostgreSQL (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
