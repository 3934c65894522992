// src/config/schema_validator.rs
//! Configuration schema validation

use std::collections::HashMap;

use crate::config::constants::*;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub value: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Validation error for '{}': {} (value: {})", self.field, self.message, self.value)
    }
}

impl std::error::Error for ValidationError {}

/// Schema validator for configuration
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    constraints: HashMap<String, FieldConstraint>,
}

/// Field validation constraints
#[derive(Debug, Clone)]
pub enum FieldConstraint {
    Range { min: f64, max: f64 },
    IntRange { min: i64, max: i64 },
    OneOf(Vec<String>),
    MinLength(usize),
}

impl SchemaValidator {
    /// Create new schema validator with default constraints
    pub fn new() -> Self {
        let mut constraints = HashMap::new();

        // Capture constraints
        constraints.insert("capture.sampling_rate_hz".to_string(),
                           FieldConstraint::Range {
                               min: capture::MIN_SAMPLING_RATE_HZ,
                               max: capture::MAX_SAMPLING_RATE_HZ,
                           });

        constraints.insert("capture.truncate_samples".to_string(),
                           FieldConstraint::IntRange {
                               min: capture::MIN_TRUNCATE_SAMPLES as i64,
                               max: capture::MAX_TRUNCATE_SAMPLES as i64,
                           });

        constraints.insert("capture.timestamp_columns".to_string(),
                           FieldConstraint::IntRange { min: 0, max: capture::MAX_TIMESTAMP_COLUMNS as i64 });

        constraints.insert("capture.delimiter".to_string(), FieldConstraint::MinLength(1));

        // Decomposition constraints
        constraints.insert("decomposition.imf_levels".to_string(),
                           FieldConstraint::IntRange {
                               min: decomposition::MIN_IMF_LEVELS as i64,
                               max: decomposition::MAX_IMF_LEVELS as i64,
                           });

        constraints.insert("decomposition.ensemble_trials".to_string(),
                           FieldConstraint::IntRange {
                               min: decomposition::MIN_ENSEMBLE_TRIALS as i64,
                               max: decomposition::MAX_ENSEMBLE_TRIALS as i64,
                           });

        constraints.insert("decomposition.noise_seed".to_string(),
                           FieldConstraint::IntRange { min: 0, max: i64::MAX });

        constraints.insert("decomposition.noise_width".to_string(),
                           FieldConstraint::Range {
                               min: decomposition::MIN_NOISE_WIDTH,
                               max: decomposition::MAX_NOISE_WIDTH,
                           });

        constraints.insert("decomposition.max_sift_iterations".to_string(),
                           FieldConstraint::IntRange {
                               min: decomposition::MIN_SIFT_ITERATIONS as i64,
                               max: decomposition::MAX_SIFT_ITERATIONS as i64,
                           });

        constraints.insert("decomposition.sift_threshold".to_string(),
                           FieldConstraint::Range {
                               min: decomposition::MIN_SIFT_THRESHOLD,
                               max: decomposition::MAX_SIFT_THRESHOLD,
                           });

        constraints.insert("decomposition.seed_policy".to_string(),
                           FieldConstraint::OneOf(vec![
                               "fixed".to_string(),
                               "per_subcarrier".to_string(),
                           ]));

        // Selection constraints
        constraints.insert("selection.k".to_string(),
                           FieldConstraint::IntRange { min: 1, max: capture::SUBCARRIER_SLOTS as i64 });

        // Batch constraints
        constraints.insert("batch.worker_threads".to_string(),
                           FieldConstraint::IntRange { min: 0, max: runtime::MAX_WORKER_THREADS as i64 });

        Self { constraints }
    }

    /// Validate configuration value against schema
    pub fn validate_field(&self, field_path: &str, value: &toml::Value) -> Result<(), ValidationError> {
        if let Some(constraint) = self.constraints.get(field_path) {
            self.check_constraint(field_path, value, constraint)
        } else {
            Ok(()) // Unknown fields are allowed for extensibility
        }
    }

    /// Validate entire configuration
    pub fn validate_config(&self, config: &toml::Value) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        self.validate_recursive("", config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Check cross-field dependencies
    pub fn validate_dependencies(&self, config: &toml::Value) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let (Some(floor), Some(ceil)) = (
            self.get_nested_value(config, "selection.normalize_floor").and_then(as_number),
            self.get_nested_value(config, "selection.normalize_ceil").and_then(as_number),
        ) {
            if floor >= ceil {
                errors.push(ValidationError {
                    field: "selection".to_string(),
                    message: "Normalization floor must be less than ceiling".to_string(),
                    value: format!("floor: {}, ceil: {}", floor, ceil),
                });
            }
        }

        if let Some(nulls) = self.get_nested_value(config, "capture.null_subcarriers").and_then(|v| v.as_array()) {
            for null in nulls {
                match null.as_integer() {
                    Some(sc) if (0..capture::SUBCARRIER_SLOTS as i64).contains(&sc) => {}
                    _ => errors.push(ValidationError {
                        field: "capture.null_subcarriers".to_string(),
                        message: format!("Null subcarriers must be slot indices below {}", capture::SUBCARRIER_SLOTS),
                        value: null.to_string(),
                    }),
                }
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn validate_recursive(&self, prefix: &str, value: &toml::Value, errors: &mut Vec<ValidationError>) {
        match value {
            toml::Value::Table(table) => {
                for (key, val) in table {
                    let path = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", prefix, key)
                    };

                    self.validate_recursive(&path, val, errors);
                }
            }
            _ => {
                if let Err(err) = self.validate_field(prefix, value) {
                    errors.push(err);
                }
            }
        }
    }

    fn check_constraint(&self, field: &str, value: &toml::Value, constraint: &FieldConstraint) -> Result<(), ValidationError> {
        match constraint {
            FieldConstraint::Range { min, max } => {
                if let Some(val) = as_number(value) {
                    if !val.is_finite() || val < *min || val > *max {
                        return Err(ValidationError {
                            field: field.to_string(),
                            message: format!("Value must be between {} and {}", min, max),
                            value: val.to_string(),
                        });
                    }
                }
            }
            FieldConstraint::IntRange { min, max } => {
                if let Some(val) = value.as_integer() {
                    if val < *min || val > *max {
                        return Err(ValidationError {
                            field: field.to_string(),
                            message: format!("Value must be between {} and {}", min, max),
                            value: val.to_string(),
                        });
                    }
                }
            }
            FieldConstraint::OneOf(options) => {
                if let Some(val) = value.as_str() {
                    let val_lower = val.to_lowercase();
                    if !options.iter().any(|opt| opt.to_lowercase() == val_lower) {
                        return Err(ValidationError {
                            field: field.to_string(),
                            message: format!("Value must be one of: {}", options.join(", ")),
                            value: val.to_string(),
                        });
                    }
                }
            }
            FieldConstraint::MinLength(min_len) => {
                if let Some(val) = value.as_str() {
                    if val.chars().count() < *min_len {
                        return Err(ValidationError {
                            field: field.to_string(),
                            message: format!("Minimum length is {}", min_len),
                            value: val.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn get_nested_value<'a>(&self, config: &'a toml::Value, path: &str) -> Option<&'a toml::Value> {
        let mut current = config;

        for part in path.split('.') {
            current = current.as_table()?.get(part)?;
        }

        Some(current)
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

// Environment overrides arrive as integers even for float fields
fn as_number(value: &toml::Value) -> Option<f64> {
    value.as_float().or_else(|| value.as_integer().map(|v| v as f64))
}
