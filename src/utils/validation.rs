//! Validation utilities for csi-imf
//!
//! Precondition checks shared by the processing stages:
//! - numeric ranges for levels, trial counts and selection sizes
//! - length agreement between paired sequences
//! - finiteness of configuration values
//!
//! Failures convert into [`crate::error::CsiError::InvalidParameter`].

use std::fmt;

/// Validation result type
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Value out of valid range
    OutOfRange {
        field: String,
        value: String,
        min: String,
        max: String,
    },
    /// Two sequences that must agree in length do not
    LengthMismatch {
        field: String,
        actual: usize,
        expected: usize,
    },
    /// Value is NaN or infinite
    NotFinite {
        field: String,
        value: f64,
    },
    /// Custom validation failure
    Custom {
        field: String,
        message: String,
    },
}

impl ValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &str {
        match self {
            ValidationError::OutOfRange { field, .. }
            | ValidationError::LengthMismatch { field, .. }
            | ValidationError::NotFinite { field, .. }
            | ValidationError::Custom { field, .. } => field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::OutOfRange { field, value, min, max } => {
                write!(f, "Field '{}' value '{}' is out of range [{}, {}]", field, value, min, max)
            }
            ValidationError::LengthMismatch { field, actual, expected } => {
                write!(f, "Field '{}' length {} doesn't match expected {}", field, actual, expected)
            }
            ValidationError::NotFinite { field, value } => {
                write!(f, "Field '{}' must be finite, got {}", field, value)
            }
            ValidationError::Custom { field, message } => write!(f, "Field '{}': {}", field, message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check that `value` lies within `[min, max]`
pub fn validate_range<T>(field: &str, value: T, min: T, max: T) -> ValidationResult<T>
where
    T: PartialOrd + fmt::Display + Copy,
{
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        });
    }
    Ok(value)
}

/// Check that a count is at least one
pub fn validate_positive(field: &str, value: usize) -> ValidationResult<usize> {
    validate_range(field, value, 1, usize::MAX)
}

/// Check that two paired sequences have the same length
pub fn validate_equal_lengths(field: &str, actual: usize, expected: usize) -> ValidationResult<()> {
    if actual != expected {
        return Err(ValidationError::LengthMismatch {
            field: field.to_string(),
            actual,
            expected,
        });
    }
    Ok(())
}

/// Check that a float is neither NaN nor infinite
pub fn validate_finite(field: &str, value: f64) -> ValidationResult<f64> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
            value,
        });
    }
    Ok(value)
}

/// Check that a sequence is strictly increasing (spline knot positions)
pub fn validate_strictly_increasing(field: &str, values: &[f64]) -> ValidationResult<()> {
    if let Some(pos) = values.windows(2).position(|w| !(w[1] > w[0])) {
        return Err(ValidationError::Custom {
            field: field.to_string(),
            message: format!("must be strictly increasing (violated at index {})", pos + 1),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_range() {
        assert_eq!(validate_range("levels", 7, 1, 32), Ok(7));
        let err = validate_range("levels", 0, 1, 32).unwrap_err();
        assert_eq!(err.field(), "levels");
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive("trials", 1).is_ok());
        assert!(validate_positive("trials", 0).is_err());
    }

    #[test]
    fn test_validate_equal_lengths() {
        assert!(validate_equal_lengths("time_axis", 10, 10).is_ok());
        let err = validate_equal_lengths("time_axis", 9, 10).unwrap_err();
        assert_eq!(
            err,
            ValidationError::LengthMismatch { field: "time_axis".to_string(), actual: 9, expected: 10 }
        );
    }

    #[test]
    fn test_validate_finite() {
        assert!(validate_finite("noise_width", 0.05).is_ok());
        assert!(validate_finite("noise_width", f64::NAN).is_err());
        assert!(validate_finite("noise_width", f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_strictly_increasing() {
        assert!(validate_strictly_increasing("t", &[0.0, 1.0, 2.5]).is_ok());
        assert!(validate_strictly_increasing("t", &[0.0, 1.0, 1.0]).is_err());
        assert!(validate_strictly_increasing("t", &[]).is_ok());
    }
}
