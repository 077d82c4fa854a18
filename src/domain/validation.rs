//! Business-rule validation failures for user-submitted records.

/// A submitted value failed a business rule.
///
/// Carries the name of the offending input field so the caller can point
/// the user at it. Raised before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation failed on `{field}`: {reason}")]
pub struct ValidationError {
    /// Input field that failed (e.g. `"fuel_amount"`).
    pub field: &'static str,
    /// Human-readable rule that was broken.
    pub reason: String,
}

impl ValidationError {
    /// Creates a validation error for `field`.
    #[must_use]
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Requires a finite, strictly positive quantity.
pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::new(field, "must be a finite number"));
    }
    if value <= 0.0 {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn positive_values_pass() {
        assert_eq!(require_positive("fuel_amount", 10.5), Ok(10.5));
    }

    #[test]
    fn zero_and_negative_fail() {
        assert!(require_positive("fuel_amount", 0.0).is_err());
        assert!(require_positive("price_total", -1.0).is_err());
    }

    #[test]
    fn non_finite_fails() {
        let Err(err) = require_positive("fuel_amount", f64::NAN) else {
            panic!("NaN accepted");
        };
        assert_eq!(err.field, "fuel_amount");
        assert!(require_positive("fuel_amount", f64::INFINITY).is_err());
    }
}
