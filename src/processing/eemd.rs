// src/processing/eemd.rs
//! Ensemble (noise-assisted) empirical mode decomposition

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::constants::decomposition;
use crate::error::CsiResult;
use crate::processing::emd::{check_inputs, Emd};
use crate::utils::validation::{validate_finite, validate_positive};

/// `levels + 1` rows of trace length: modes from highest frequency down, then the residual
pub type ImfStack = Array2<f64>;

/// Engine parameters that do not change between subcarriers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EemdConfig {
    /// Noise standard deviation as a fraction of the trace standard deviation
    pub noise_width: f64,
    pub max_sift_iterations: usize,
    pub sift_threshold: f64,
}

impl Default for EemdConfig {
    fn default() -> Self {
        Self {
            noise_width: decomposition::DEFAULT_NOISE_WIDTH,
            max_sift_iterations: decomposition::DEFAULT_MAX_SIFT_ITERATIONS,
            sift_threshold: decomposition::DEFAULT_SIFT_THRESHOLD,
        }
    }
}

/// Decompose `trace` into `levels` averaged modes plus residual.
///
/// Each of the `ensemble_trials` trials sifts the trace plus an independent Gaussian
/// noise realization; all noise is drawn in trial order from one generator seeded with
/// `noise_seed`, so equal inputs give bit-identical stacks. The residual is the trace
/// minus the averaged modes, which makes the stack sum back to the input. Levels that
/// no trial reached stay zero.
pub fn decompose(
    trace: ArrayView1<f64>,
    time_axis: ArrayView1<f64>,
    levels: usize,
    ensemble_trials: usize,
    noise_seed: u64,
    config: &EemdConfig,
) -> CsiResult<ImfStack> {
    let signal = trace.to_vec();
    let time = time_axis.to_vec();
    check_inputs(signal.len(), &time, levels)?;
    validate_positive("ensemble_trials", ensemble_trials)?;
    validate_finite("noise_width", config.noise_width)?;

    let n = signal.len();
    let emd = Emd::new(config.max_sift_iterations, config.sift_threshold);
    let noise_std = config.noise_width * std_dev(&signal);

    let mut rng = StdRng::seed_from_u64(noise_seed);
    let mut mode_sums = Array2::<f64>::zeros((levels, n));
    let mut noisy = vec![0.0; n];

    for _ in 0..ensemble_trials {
        for (out, &x) in noisy.iter_mut().zip(&signal) {
            *out = if noise_std > 0.0 {
                x + noise_std * box_muller(&mut rng)
            } else {
                x
            };
        }

        for (level, mode) in emd.extract_modes(&noisy, &time, levels).into_iter().enumerate() {
            for (acc, v) in mode_sums.row_mut(level).iter_mut().zip(&mode) {
                *acc += v;
            }
        }
    }

    let scale = 1.0 / ensemble_trials as f64;
    let mut stack = Array2::zeros((levels + 1, n));
    let mut residual = signal;
    for level in 0..levels {
        let mut row = stack.row_mut(level);
        for ((out, &sum), r) in row.iter_mut().zip(mode_sums.row(level)).zip(residual.iter_mut()) {
            *out = sum * scale;
            *r -= *out;
        }
    }
    for (out, r) in stack.row_mut(levels).iter_mut().zip(&residual) {
        *out = *r;
    }

    Ok(stack)
}

/// Standard normal variate from two uniforms
fn box_muller(rng: &mut StdRng) -> f64 {
    // gen::<f64>() is in [0, 1); shift to (0, 1] so ln never sees zero
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}
