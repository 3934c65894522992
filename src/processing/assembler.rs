// src/processing/assembler.rs
//! Per-capture IMF tensor assembly

use ndarray::{Array1, Array2, Array3, ArrayView2, Axis};
use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::capture::{CaptureKey, RawCapture};
use crate::config::{PipelineConfig, SeedPolicy, SelectionSettings};
use crate::error::{CsiErrorBuilder, CsiResult};
use crate::processing::amplitude::{exclude_subcarriers, extract_amplitudes, truncate};
use crate::processing::eemd::{self, EemdConfig, ImfStack};
use crate::processing::selection::select_top_k;

/// Decomposed capture, shape `(subcarriers, levels + 1, samples)`
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureImfTensor {
    pub key: CaptureKey,
    pub data: Array3<f64>,
}

impl CaptureImfTensor {
    pub fn new(key: CaptureKey, data: Array3<f64>) -> Self {
        Self { key, data }
    }

    pub fn subcarriers(&self) -> usize {
        self.data.dim().0
    }

    /// Mode levels excluding the residual
    pub fn levels(&self) -> usize {
        self.data.dim().1.saturating_sub(1)
    }

    pub fn samples(&self) -> usize {
        self.data.dim().2
    }

    /// Sum over the mode-level axis, giving `(subcarriers, samples)`
    pub fn reconstruct(&self) -> Array2<f64> {
        self.data.sum_axis(Axis(1))
    }
}

/// Evenly spaced time axis of `samples` points from 0 to `samples` inclusive
pub fn time_axis(samples: usize) -> Array1<f64> {
    Array1::linspace(0.0, samples as f64, samples)
}

/// Noise seed for one subcarrier of one capture; never depends on scheduling order
pub fn derive_seed(policy: SeedPolicy, base_seed: u64, key: &CaptureKey, subcarrier: usize) -> u64 {
    match policy {
        SeedPolicy::Fixed => base_seed,
        SeedPolicy::PerSubcarrier => {
            let capture_hash = crc32fast::hash(key.identity().as_bytes()) as u64;
            let salt = splitmix64((capture_hash << 32) ^ subcarrier as u64);
            splitmix64(base_seed.wrapping_add(salt))
        }
    }
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Turns raw captures into IMF tensors
#[derive(Debug, Clone)]
pub struct CaptureAssembler {
    pub levels: usize,
    pub ensemble_trials: usize,
    pub base_seed: u64,
    pub seed_policy: SeedPolicy,
    pub truncate_samples: usize,
    pub null_subcarriers: Vec<usize>,
    pub selection: Option<SelectionSettings>,
    pub eemd: EemdConfig,
}

impl CaptureAssembler {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            levels: config.decomposition.imf_levels,
            ensemble_trials: config.decomposition.ensemble_trials,
            base_seed: config.decomposition.noise_seed,
            seed_policy: config.decomposition.seed_policy,
            truncate_samples: config.capture.truncate_samples,
            null_subcarriers: config.capture.null_subcarriers.clone(),
            selection: config.selection.enabled.then(|| config.selection.clone()),
            eemd: config.decomposition.eemd_config(),
        }
    }

    /// Amplitudes, null exclusion, truncation, optional selection, then decomposition.
    ///
    /// Selection ranks only the truncated window that gets decomposed.
    #[instrument(skip(self, raw, key), fields(capture = %key))]
    pub fn process_capture(&self, raw: &RawCapture, key: &CaptureKey) -> CsiResult<CaptureImfTensor> {
        let amplitudes = extract_amplitudes(raw)?;
        let usable = exclude_subcarriers(amplitudes.view(), &self.null_subcarriers);
        let usable = truncate(usable.view(), self.truncate_samples, &raw.origin)?;

        let matrix = match &self.selection {
            Some(selection) => {
                let set = select_top_k(usable.view(), selection.k, selection.normalize_floor, selection.normalize_ceil)?;
                debug!(indices = ?set.indices, "decomposing selected subcarriers");
                set.matrix
            }
            None => usable,
        };

        self.assemble(matrix.view(), key, &raw.origin)
    }

    /// Decompose every column of `matrix`, subcarriers in parallel. Rows past the
    /// truncation length are dropped; an already-truncated matrix passes through.
    pub fn assemble(&self, matrix: ArrayView2<f64>, key: &CaptureKey, origin: &str) -> CsiResult<CaptureImfTensor> {
        let truncated = truncate(matrix, self.truncate_samples, origin)?;
        let time = time_axis(self.truncate_samples);

        let stacks = (0..truncated.ncols())
            .into_par_iter()
            .map(|sc| self.decompose_column(&truncated, &time, key, sc))
            .collect::<CsiResult<Vec<_>>>()?;

        self.stack(key, stacks)
    }

    /// Same result as [`assemble`](Self::assemble) on the calling thread only
    pub fn assemble_sequential(&self, matrix: ArrayView2<f64>, key: &CaptureKey, origin: &str) -> CsiResult<CaptureImfTensor> {
        let truncated = truncate(matrix, self.truncate_samples, origin)?;
        let time = time_axis(self.truncate_samples);

        let stacks = (0..truncated.ncols())
            .map(|sc| self.decompose_column(&truncated, &time, key, sc))
            .collect::<CsiResult<Vec<_>>>()?;

        self.stack(key, stacks)
    }

    fn decompose_column(&self, matrix: &Array2<f64>, time: &Array1<f64>, key: &CaptureKey, sc: usize) -> CsiResult<ImfStack> {
        let seed = derive_seed(self.seed_policy, self.base_seed, key, sc);
        eemd::decompose(
            matrix.column(sc),
            time.view(),
            self.levels,
            self.ensemble_trials,
            seed,
            &self.eemd,
        )
    }

    fn stack(&self, key: &CaptureKey, stacks: Vec<ImfStack>) -> CsiResult<CaptureImfTensor> {
        let mut data = Array3::zeros((stacks.len(), self.levels + 1, self.truncate_samples));
        for (sc, imfs) in stacks.iter().enumerate() {
            if imfs.dim() != (self.levels + 1, self.truncate_samples) {
                return Err(CsiErrorBuilder::new("assembler", "stack").shape_mismatch(
                    &[self.levels + 1, self.truncate_samples],
                    &[imfs.nrows(), imfs.ncols()],
                    self.levels,
                ));
            }
            data.index_axis_mut(Axis(0), sc).assign(imfs);
        }

        debug!(capture = %key, shape = ?data.dim(), "assembled capture tensor");
        Ok(CaptureImfTensor::new(key.clone(), data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn small_assembler() -> CaptureAssembler {
        let mut config = PipelineConfig::default();
        config.capture.truncate_samples = 64;
        config.decomposition.imf_levels = 3;
        config.decomposition.ensemble_trials = 3;
        CaptureAssembler::from_config(&config)
    }

    fn wavy(rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(t, sc)| ((t as f64) * 0.3 * (sc + 1) as f64).sin() + sc as f64)
    }

    #[test]
    fn test_time_axis_endpoints() {
        let t = time_axis(850);
        assert_eq!(t.len(), 850);
        assert_eq!(t[0], 0.0);
        assert!((t[849] - 850.0).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_policy_ignores_capture_and_subcarrier() {
        let key = CaptureKey::new("S01", "WA", 0);
        assert_eq!(derive_seed(SeedPolicy::Fixed, 5, &key, 0), 5);
        assert_eq!(derive_seed(SeedPolicy::Fixed, 5, &key, 40), 5);
    }

    #[test]
    fn test_per_subcarrier_seeds_differ_and_repeat() {
        let a = CaptureKey::new("S01", "WA", 0);
        let b = CaptureKey::new("S01", "WA", 1);
        let s0 = derive_seed(SeedPolicy::PerSubcarrier, 5, &a, 0);
        assert_eq!(s0, derive_seed(SeedPolicy::PerSubcarrier, 5, &a, 0));
        assert_ne!(s0, derive_seed(SeedPolicy::PerSubcarrier, 5, &a, 1));
        assert_ne!(s0, derive_seed(SeedPolicy::PerSubcarrier, 5, &b, 0));
        assert_ne!(s0, derive_seed(SeedPolicy::PerSubcarrier, 6, &a, 0));
    }

    #[test]
    fn test_assemble_shape_and_truncation() {
        let assembler = small_assembler();
        let key = CaptureKey::new("S01", "WA", 0);
        let tensor = assembler.assemble(wavy(100, 4).view(), &key, "mem").unwrap();
        assert_eq!(tensor.data.dim(), (4, 4, 64));
        assert_eq!(tensor.levels(), 3);
        assert_eq!(tensor.reconstruct().dim(), (4, 64));
    }

    #[test]
    fn test_short_capture_rejected() {
        let assembler = small_assembler();
        let key = CaptureKey::new("S01", "WA", 0);
        let err = assembler.assemble(wavy(10, 2).view(), &key, "mem").unwrap_err();
        assert_eq!(err.category(), "insufficient_samples");
    }

    #[test]
    fn test_process_capture_excludes_nulls() {
        let assembler = small_assembler();
        let raw = RawCapture::new(wavy(70, 128), 50.0, "mem");
        let key = CaptureKey::new("S02", "FA", 1);
        let tensor = assembler.process_capture(&raw, &key).unwrap();
        assert_eq!(tensor.subcarriers(), 52);
        assert_eq!(tensor.samples(), 64);
    }

    #[test]
    fn test_process_capture_with_selection() {
        let mut assembler = small_assembler();
        assembler.selection = Some(SelectionSettings {
            enabled: true,
            k: 5,
            ..SelectionSettings::default()
        });
        let raw = RawCapture::new(wavy(70, 128), 50.0, "mem");
        let tensor = assembler.process_capture(&raw, &CaptureKey::new("S02", "FA", 1)).unwrap();
        assert_eq!(tensor.subcarriers(), 5);
    }

    #[test]
    fn test_selection_ranks_only_the_truncated_window() {
        let mut assembler = small_assembler();
        assembler.null_subcarriers = Vec::new();
        assembler.selection = Some(SelectionSettings {
            enabled: true,
            k: 1,
            ..SelectionSettings::default()
        });

        // sc0 is flat inside the first 64 samples and swings hard afterwards;
        // sc1 oscillates gently throughout. Columns are (im, re) per subcarrier.
        let samples = Array2::from_shape_fn((200, 4), |(t, c)| match c {
            1 if t < 64 => 100.0,
            1 if t % 2 == 0 => 40.0,
            1 => 160.0,
            3 => 10.0 + (t as f64 * 0.4).sin(),
            _ => 0.0,
        });
        let raw = RawCapture::new(samples.clone(), 50.0, "mem");

        let tensor = assembler.process_capture(&raw, &CaptureKey::new("S01", "WA", 0)).unwrap();
        assert_eq!(tensor.data.dim(), (1, 4, 64));

        let rebuilt = tensor.reconstruct();
        for t in 0..64 {
            assert!((rebuilt[[0, t]] - samples[[t, 3]]).abs() < 1e-8);
        }
    }
}
