//! REST endpoint handlers organized by resource.

pub mod fills;
pub mod report;
pub mod system;
pub mod trips;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(fills::routes())
        .merge(trips::routes())
        .merge(report::routes())
}
