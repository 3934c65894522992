//! Common utility functions for csi-imf
//!
//! Validation helpers shared by the processing stages. Limits they are checked
//! against live in [`crate::config::constants`].

pub mod validation;

pub use validation::{
    validate_equal_lengths,
    validate_finite,
    validate_positive,
    validate_range,
    validate_strictly_increasing,
    ValidationError,
    ValidationResult,
};
