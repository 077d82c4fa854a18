//! Ledger error types with HTTP status code mapping.
//!
//! [`LedgerError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! Ordering anomalies and thin history are reported as data (diagnostics,
//! `InsufficientData` means), never as errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{EntityKind, RecordId, ValidationError};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "validation failed on `fuel_amount`: must be greater than zero",
///     "details": "fuel_amount"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see [`LedgerError`] code ranges).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details (the failing field for validation errors).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category         | HTTP Status                  |
/// |-----------|------------------|------------------------------|
/// | 1000–1999 | Validation       | 400 Bad Request              |
/// | 2000–2999 | State/Not Found  | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server / Storage | 500 / 503                    |
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Submitted values break a business rule; nothing was persisted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Request could not be interpreted (unknown strategy, bad parameter).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No record of the given kind carries this id.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Which table was searched.
        kind: EntityKind,
        /// The missing identifier.
        id: RecordId,
    },

    /// The trip session is not in a state that allows the requested step.
    #[error("trip session conflict: {0}")]
    SessionConflict(String),

    /// The backing store could not be read or written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Shorthand for a missing fill event.
    #[must_use]
    pub const fn fill_not_found(id: RecordId) -> Self {
        Self::NotFound {
            kind: EntityKind::Fill,
            id,
        }
    }

    /// Shorthand for a missing trip.
    #[must_use]
    pub const fn trip_not_found(id: RecordId) -> Self {
        Self::NotFound {
            kind: EntityKind::Trip,
            id,
        }
    }

    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Validation(_) => 1001,
            Self::InvalidRequest(_) => 1002,
            Self::NotFound {
                kind: EntityKind::Fill,
                ..
            } => 2001,
            Self::NotFound {
                kind: EntityKind::Trip,
                ..
            } => 2002,
            Self::SessionConflict(_) => 2003,
            Self::Internal(_) => 3000,
            Self::StorageUnavailable(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::SessionConflict(_) => StatusCode::CONFLICT,
            Self::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::Validation(err) => Some(err.field.to_string()),
            _ => None,
        }
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
