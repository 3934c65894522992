// src/config/mod.rs
//! Pipeline configuration management

pub mod constants;
pub mod loader;
pub mod processing_config;
pub mod schema_validator;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};
pub use processing_config::*;
pub use schema_validator::{SchemaValidator, ValidationError};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete pipeline configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub capture: CaptureSettings,
    #[serde(default)]
    pub decomposition: DecompositionSettings,
    #[serde(default)]
    pub selection: SelectionSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub batch: BatchSettings,
}

/// Artifact locations
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StorageSettings {
    #[serde(default = "defaults::raw_root")]
    pub raw_root: PathBuf,

    #[serde(default = "defaults::imf_root")]
    pub imf_root: PathBuf,

    #[serde(default = "defaults::synthetic_root")]
    pub synthetic_root: PathBuf,

    /// Reload every written tensor and compare shapes
    #[serde(default = "defaults::verify_writes")]
    pub verify_writes: bool,
}

/// Batch run scope and resources
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BatchSettings {
    #[serde(default = "defaults::worker_threads")]
    pub worker_threads: usize,

    /// Activities to process; empty means every activity directory found
    #[serde(default)]
    pub activities: Vec<String>,

    /// Subjects to process; empty means every subject directory found
    #[serde(default)]
    pub subjects: Vec<String>,

    /// JSON run report destination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
}

/// Default value providers using constants
mod defaults {
    use crate::config::constants::*;
    use std::path::PathBuf;

    pub fn raw_root() -> PathBuf { PathBuf::from(paths::DEFAULT_RAW_ROOT) }
    pub fn imf_root() -> PathBuf { PathBuf::from(paths::DEFAULT_IMF_ROOT) }
    pub fn synthetic_root() -> PathBuf { PathBuf::from(paths::DEFAULT_SYNTHETIC_ROOT) }
    pub fn verify_writes() -> bool { true }

    pub fn worker_threads() -> usize { runtime::DEFAULT_WORKER_THREADS }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            raw_root: defaults::raw_root(),
            imf_root: defaults::imf_root(),
            synthetic_root: defaults::synthetic_root(),
            verify_writes: defaults::verify_writes(),
        }
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            worker_threads: defaults::worker_threads(),
            activities: Vec::new(),
            subjects: Vec::new(),
            report_path: None,
        }
    }
}

/// Configuration utility functions
impl PipelineConfig {
    /// Validate cross-field consistency
    pub fn validate_consistency(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.selection.normalize_floor >= self.selection.normalize_ceil {
            errors.push(format!(
                "Normalization floor ({}) must be below ceiling ({})",
                self.selection.normalize_floor, self.selection.normalize_ceil
            ));
        }

        if self.selection.enabled {
            let usable = self.usable_subcarriers();
            if self.selection.k == 0 || self.selection.k > usable {
                errors.push(format!(
                    "Selection size k={} must be within 1..={} usable subcarriers",
                    self.selection.k, usable
                ));
            }
        }

        // Sifting needs room for at least two maxima and two minima per level
        let min_samples = 4 * decomposition::MIN_EXTREMA_PER_ENVELOPE;
        if self.capture.truncate_samples < min_samples {
            errors.push(format!(
                "Truncation length {} is too short to sift (need at least {})",
                self.capture.truncate_samples, min_samples
            ));
        }

        if self.capture.delimiter.is_ascii_digit() || !self.capture.delimiter.is_ascii() {
            errors.push(format!("Delimiter {:?} must be a non-digit ASCII character", self.capture.delimiter));
        }

        if self.storage.imf_root == self.storage.synthetic_root {
            errors.push("IMF root and synthetic root must differ".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Subcarriers left after the configured null slots are removed
    pub fn usable_subcarriers(&self) -> usize {
        let mut nulls: Vec<usize> = self
            .capture
            .null_subcarriers
            .iter()
            .copied()
            .filter(|&sc| sc < capture::SUBCARRIER_SLOTS)
            .collect();
        nulls.sort_unstable();
        nulls.dedup();
        capture::SUBCARRIER_SLOTS - nulls.len()
    }

    /// Subcarriers that end up in every capture tensor
    pub fn tensor_subcarriers(&self) -> usize {
        if self.selection.enabled {
            self.selection.k
        } else {
            self.usable_subcarriers()
        }
    }

    /// Get configuration summary
    pub fn get_summary(&self) -> ConfigSummary {
        ConfigSummary {
            sampling_rate_hz: self.capture.sampling_rate_hz,
            truncate_samples: self.capture.truncate_samples,
            subcarriers: self.tensor_subcarriers(),
            imf_levels: self.decomposition.imf_levels,
            ensemble_trials: self.decomposition.ensemble_trials,
            seed_policy: self.decomposition.seed_policy,
            tensor_shape: [
                self.tensor_subcarriers(),
                self.decomposition.imf_levels + 1,
                self.capture.truncate_samples,
            ],
        }
    }
}

/// Configuration summary for display/logging
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub sampling_rate_hz: f64,
    pub truncate_samples: usize,
    pub subcarriers: usize,
    pub imf_levels: usize,
    pub ensemble_trials: usize,
    pub seed_policy: SeedPolicy,
    pub tensor_shape: [usize; 3],
}
