// src/config/processing_config.rs
//! Signal processing configuration structures

use serde::{Deserialize, Serialize};

use crate::config::constants::{capture, decomposition, selection};
use crate::processing::eemd::EemdConfig;

/// Raw capture parsing and shaping
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CaptureSettings {
    #[serde(default = "defaults::sampling_rate_hz")]
    pub sampling_rate_hz: f64,

    #[serde(default = "defaults::truncate_samples")]
    pub truncate_samples: usize,

    #[serde(default = "defaults::null_subcarriers")]
    pub null_subcarriers: Vec<usize>,

    #[serde(default = "defaults::delimiter")]
    pub delimiter: char,

    #[serde(default = "defaults::timestamp_columns")]
    pub timestamp_columns: usize,
}

/// Ensemble decomposition parameters
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DecompositionSettings {
    #[serde(default = "defaults::imf_levels")]
    pub imf_levels: usize,

    #[serde(default = "defaults::ensemble_trials")]
    pub ensemble_trials: usize,

    #[serde(default = "defaults::noise_seed")]
    pub noise_seed: u64,

    #[serde(default = "defaults::seed_policy")]
    pub seed_policy: SeedPolicy,

    #[serde(default = "defaults::noise_width")]
    pub noise_width: f64,

    #[serde(default = "defaults::max_sift_iterations")]
    pub max_sift_iterations: usize,

    #[serde(default = "defaults::sift_threshold")]
    pub sift_threshold: f64,
}

/// Optional variance-based subcarrier reduction
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SelectionSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "defaults::top_k")]
    pub k: usize,

    #[serde(default = "defaults::normalize_floor")]
    pub normalize_floor: f64,

    #[serde(default = "defaults::normalize_ceil")]
    pub normalize_ceil: f64,
}

/// How the per-subcarrier noise seed is derived.
///
/// Both policies depend only on the capture identity and subcarrier index, never on
/// the order in which workers pick up subcarriers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedPolicy {
    /// Every subcarrier of every capture uses `noise_seed` unchanged
    Fixed,
    /// Seed mixed from `noise_seed`, the capture key and the subcarrier index
    PerSubcarrier,
}

mod defaults {
    use super::*;

    pub fn sampling_rate_hz() -> f64 { capture::DEFAULT_SAMPLING_RATE_HZ }
    pub fn truncate_samples() -> usize { capture::DEFAULT_TRUNCATE_SAMPLES }
    pub fn null_subcarriers() -> Vec<usize> { capture::DEFAULT_NULL_SUBCARRIERS.to_vec() }
    pub fn delimiter() -> char { capture::DEFAULT_DELIMITER }
    pub fn timestamp_columns() -> usize { capture::DEFAULT_TIMESTAMP_COLUMNS }

    pub fn imf_levels() -> usize { decomposition::DEFAULT_IMF_LEVELS }
    pub fn ensemble_trials() -> usize { decomposition::DEFAULT_ENSEMBLE_TRIALS }
    pub fn noise_seed() -> u64 { decomposition::DEFAULT_NOISE_SEED }
    pub fn seed_policy() -> SeedPolicy { SeedPolicy::PerSubcarrier }
    pub fn noise_width() -> f64 { decomposition::DEFAULT_NOISE_WIDTH }
    pub fn max_sift_iterations() -> usize { decomposition::DEFAULT_MAX_SIFT_ITERATIONS }
    pub fn sift_threshold() -> f64 { decomposition::DEFAULT_SIFT_THRESHOLD }

    pub fn top_k() -> usize { selection::DEFAULT_TOP_K }
    pub fn normalize_floor() -> f64 { selection::DEFAULT_NORMALIZE_FLOOR }
    pub fn normalize_ceil() -> f64 { selection::DEFAULT_NORMALIZE_CEIL }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            sampling_rate_hz: defaults::sampling_rate_hz(),
            truncate_samples: defaults::truncate_samples(),
            null_subcarriers: defaults::null_subcarriers(),
            delimiter: defaults::delimiter(),
            timestamp_columns: defaults::timestamp_columns(),
        }
    }
}

impl Default for DecompositionSettings {
    fn default() -> Self {
        Self {
            imf_levels: defaults::imf_levels(),
            ensemble_trials: defaults::ensemble_trials(),
            noise_seed: defaults::noise_seed(),
            seed_policy: defaults::seed_policy(),
            noise_width: defaults::noise_width(),
            max_sift_iterations: defaults::max_sift_iterations(),
            sift_threshold: defaults::sift_threshold(),
        }
    }
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            k: defaults::top_k(),
            normalize_floor: defaults::normalize_floor(),
            normalize_ceil: defaults::normalize_ceil(),
        }
    }
}

impl DecompositionSettings {
    /// Engine configuration for these settings
    pub fn eemd_config(&self) -> EemdConfig {
        EemdConfig {
            noise_width: self.noise_width,
            max_sift_iterations: self.max_sift_iterations,
            sift_threshold: self.sift_threshold,
        }
    }
}
