//! csi-imf: CSI amplitude decomposition and IMF-based sample synthesis
//!
//! This library turns raw WiFi Channel State Information captures into intrinsic mode
//! function (IMF) tensors for activity-recognition training, and augments the real
//! captures with synthetic ones recombined from their IMFs. It provides:
//!
//! - Capture parsing and per-subcarrier amplitude extraction
//! - Optional variance-ranked subcarrier selection
//! - Ensemble empirical mode decomposition with reproducible noise seeding
//! - Parallel per-capture tensor assembly and `.npy` persistence
//! - Pairwise IMF recombination within subject/activity groups
//! - Layered TOML configuration and a batch driver with JSON run reports
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use csi_imf::capture::{CaptureKey, CaptureReader};
//! use csi_imf::config::PipelineConfig;
//! use csi_imf::processing::CaptureAssembler;
//! use csi_imf::storage::TensorStore;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::default();
//!     let raw = CaptureReader::from_settings(&config.capture).read_path("Datasets/RAW/WA/S01/0.csv")?;
//!
//!     let key = CaptureKey::new("S01", "WA", 0);
//!     let tensor = CaptureAssembler::from_config(&config).process_capture(&raw, &key)?;
//!     println!("tensor shape: {:?}", tensor.data.dim());
//!
//!     TensorStore::from_settings(&config.storage).save_capture(&tensor)?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod processing;
pub mod storage;
pub mod utils;

// Re-export commonly used types for convenience
pub use capture::{CaptureKey, CaptureReader, RawCapture, SyntheticKey};
pub use config::{ConfigLoader, PipelineConfig, SeedPolicy};
pub use error::{CsiError, CsiResult};
pub use pipeline::{BatchDriver, BatchReport};
pub use processing::{
    decompose, extract_amplitudes, recombine, select_top_k, CaptureAssembler, CaptureImfTensor, EemdConfig,
    SyntheticImfTensor,
};
pub use storage::TensorStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "CSI amplitude decomposition and IMF-based sample synthesis".to_string(),
        features: vec![
            "Amplitude extraction".to_string(),
            "Ensemble empirical mode decomposition".to_string(),
            "Synthetic sample recombination".to_string(),
            "Layered configuration management".to_string(),
        ],
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// List of features
    pub features: Vec<String>,
}
