// src/processing/mod.rs
//! Amplitude extraction, subcarrier selection, decomposition and recombination

pub mod amplitude;
pub mod assembler;
pub mod eemd;
pub mod emd;
pub mod recombiner;
pub mod selection;

pub use amplitude::{exclude_subcarriers, extract_amplitudes, truncate, AmplitudeMatrix};
pub use assembler::{derive_seed, time_axis, CaptureAssembler, CaptureImfTensor};
pub use eemd::{decompose, EemdConfig, ImfStack};
pub use emd::Emd;
pub use recombiner::{recombine, recombine_group, SyntheticImfTensor};
pub use selection::{normalize_columns, select_top_k, SelectedSubcarrierSet};
