//! Data Transfer Objects for REST request/response serialization.
//!
//! Undefined derived values serialize as `null`; means that had nothing to
//! average serialize with `"status": "insufficient_data"` and no value.

pub mod common_dto;
pub mod fill_dto;
pub mod report_dto;
pub mod trip_dto;

pub use common_dto::*;
pub use fill_dto::*;
pub use report_dto::*;
pub use trip_dto::*;
