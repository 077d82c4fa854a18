//! Shared DTO types used across multiple endpoints.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Diagnostic, Mean, Partitioned};

/// A non-fatal data warning attached to one record.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DiagnosticDto {
    /// Record the warning belongs to.
    pub record_id: Uuid,
    /// Machine-readable cause (e.g. `"odometer_decreased"`).
    pub kind: String,
    /// Human-readable explanation.
    pub message: String,
}

impl From<&Diagnostic> for DiagnosticDto {
    fn from(diagnostic: &Diagnostic) -> Self {
        Self {
            record_id: diagnostic.record_id.into(),
            kind: diagnostic.kind.code().to_string(),
            message: diagnostic.message(),
        }
    }
}

/// Converts a slice of diagnostics.
#[must_use]
pub fn diagnostics_to_dto<'a>(
    diagnostics: impl IntoIterator<Item = &'a Diagnostic>,
) -> Vec<DiagnosticDto> {
    diagnostics.into_iter().map(DiagnosticDto::from).collect()
}

/// A mean, or `"insufficient_data"` when there was nothing to average.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MeanDto {
    /// `"value"` or `"insufficient_data"`.
    pub status: String,
    /// The mean, absent when insufficient.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Samples behind the mean.
    pub samples: usize,
}

impl From<Mean> for MeanDto {
    fn from(mean: Mean) -> Self {
        let status = match mean {
            Mean::Value { .. } => "value",
            Mean::InsufficientData => "insufficient_data",
        };
        Self {
            status: status.to_string(),
            value: mean.value(),
            samples: mean.samples(),
        }
    }
}

/// Means split on a boolean attribute.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PartitionedDto {
    /// Records with the attribute set.
    pub when_true: MeanDto,
    /// Records with the attribute cleared.
    pub when_false: MeanDto,
}

impl From<Partitioned> for PartitionedDto {
    fn from(partitioned: Partitioned) -> Self {
        Self {
            when_true: partitioned.when_true.into(),
            when_false: partitioned.when_false.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::domain::{DiagnosticKind, RecordId};

    #[test]
    fn insufficient_mean_has_no_value() {
        let Ok(json) = serde_json::to_value(MeanDto::from(Mean::InsufficientData)) else {
            panic!("mean did not serialize");
        };
        assert_eq!(json["status"], "insufficient_data");
        assert!(json.get("value").is_none());
        assert_eq!(json["samples"], 0);
    }

    #[test]
    fn diagnostic_carries_kind_and_message() {
        let dto = DiagnosticDto::from(&Diagnostic {
            record_id: RecordId::new(),
            kind: DiagnosticKind::OdometerDecreased {
                previous: 2000,
                current: 1900,
            },
        });
        assert_eq!(dto.kind, "odometer_decreased");
        assert!(dto.message.contains("1900"));
    }
}
