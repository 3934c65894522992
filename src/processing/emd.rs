// src/processing/emd.rs
//! Empirical mode decomposition by cubic-spline envelope sifting
//!
//! Modes come out highest frequency first. Envelopes are natural cubic splines
//! through the local extrema, extended past both ends of the time axis by mirroring
//! the outermost extremum so the splines cover every sample.

use ndarray::{Array1, Array2, ArrayView1};

use crate::config::constants::decomposition::{MIN_EXTREMA_PER_ENVELOPE, RESIDUAL_ENERGY_EPSILON};
use crate::error::CsiResult;
use crate::utils::validation::{validate_equal_lengths, validate_positive, validate_strictly_increasing};

/// Single, noise-free decomposition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emd {
    pub max_sift_iterations: usize,
    pub sift_threshold: f64,
}

impl Emd {
    pub fn new(max_sift_iterations: usize, sift_threshold: f64) -> Self {
        Self {
            max_sift_iterations,
            sift_threshold,
        }
    }

    /// Decompose into exactly `levels + 1` rows: `levels` modes (zero rows where the
    /// trace ran out of oscillation) followed by the residual.
    pub fn decompose(&self, trace: ArrayView1<f64>, time_axis: ArrayView1<f64>, levels: usize) -> CsiResult<Array2<f64>> {
        let trace = trace.to_vec();
        let time = time_axis.to_vec();
        check_inputs(trace.len(), &time, levels)?;

        let mut stack = Array2::zeros((levels + 1, trace.len()));
        let mut mode_sum = vec![0.0; trace.len()];
        for (level, mode) in self.extract_modes(&trace, &time, levels).into_iter().enumerate() {
            for (acc, v) in mode_sum.iter_mut().zip(&mode) {
                *acc += v;
            }
            stack.row_mut(level).assign(&Array1::from(mode));
        }

        let residual: Vec<f64> = trace.iter().zip(&mode_sum).map(|(x, m)| x - m).collect();
        stack.row_mut(levels).assign(&Array1::from(residual));
        Ok(stack)
    }

    /// Up to `levels` modes; fewer when the remainder is exhausted or monotonic
    pub(crate) fn extract_modes(&self, trace: &[f64], time: &[f64], levels: usize) -> Vec<Vec<f64>> {
        let n = trace.len();
        let mut modes = Vec::with_capacity(levels);
        let mut remainder = trace.to_vec();

        for _ in 0..levels {
            let energy: f64 = remainder.iter().map(|x| x * x).sum::<f64>() / n.max(1) as f64;
            if energy < RESIDUAL_ENERGY_EPSILON {
                break;
            }

            let (maxima, minima) = find_extrema(&remainder);
            if maxima.len() < MIN_EXTREMA_PER_ENVELOPE || minima.len() < MIN_EXTREMA_PER_ENVELOPE {
                break;
            }

            let mode = self.sift(&remainder, time);
            for (r, m) in remainder.iter_mut().zip(&mode) {
                *r -= m;
            }
            modes.push(mode);
        }

        modes
    }

    fn sift(&self, signal: &[f64], time: &[f64]) -> Vec<f64> {
        let mut h = signal.to_vec();

        for _ in 0..self.max_sift_iterations {
            let Some(mean) = mean_envelope(&h, time) else {
                break;
            };

            let prev = h.clone();
            for (v, m) in h.iter_mut().zip(&mean) {
                *v -= m;
            }

            if normalized_sd(&prev, &h) < self.sift_threshold {
                break;
            }
        }
        h
    }
}

pub(crate) fn check_inputs(trace_len: usize, time_axis: &[f64], levels: usize) -> CsiResult<()> {
    validate_equal_lengths("time_axis", time_axis.len(), trace_len)?;
    validate_positive("trace_len", trace_len)?;
    validate_positive("levels", levels)?;
    validate_strictly_increasing("time_axis", time_axis)?;
    Ok(())
}

/// Interior local maxima and minima indices. Plateaus count once, at their first sample.
pub(crate) fn find_extrema(signal: &[f64]) -> (Vec<usize>, Vec<usize>) {
    let mut maxima = Vec::new();
    let mut minima = Vec::new();
    if signal.len() < 3 {
        return (maxima, minima);
    }

    for i in 1..signal.len() - 1 {
        let (prev, cur, next) = (signal[i - 1], signal[i], signal[i + 1]);
        if cur > prev && cur >= next {
            maxima.push(i);
        } else if cur < prev && cur <= next {
            minima.push(i);
        }
    }
    (maxima, minima)
}

/// Average of the upper and lower envelopes, or `None` when either lacks extrema
fn mean_envelope(signal: &[f64], time: &[f64]) -> Option<Vec<f64>> {
    let (maxima, minima) = find_extrema(signal);
    if maxima.len() < MIN_EXTREMA_PER_ENVELOPE || minima.len() < MIN_EXTREMA_PER_ENVELOPE {
        return None;
    }

    let upper = envelope(signal, time, &maxima);
    let lower = envelope(signal, time, &minima);
    Some(upper.iter().zip(&lower).map(|(u, l)| 0.5 * (u + l)).collect())
}

fn envelope(signal: &[f64], time: &[f64], extrema: &[usize]) -> Vec<f64> {
    let start = time[0];
    let end = time[time.len() - 1];
    let first = extrema[0];
    let last = extrema[extrema.len() - 1];

    let mut xs = Vec::with_capacity(extrema.len() + 2);
    let mut ys = Vec::with_capacity(extrema.len() + 2);

    xs.push(2.0 * start - time[first]);
    ys.push(signal[first]);
    for &i in extrema {
        xs.push(time[i]);
        ys.push(signal[i]);
    }
    xs.push(2.0 * end - time[last]);
    ys.push(signal[last]);

    natural_cubic_spline(&xs, &ys, time)
}

/// Normalized squared difference between successive sifting iterates
fn normalized_sd(prev: &[f64], curr: &[f64]) -> f64 {
    let num: f64 = prev.iter().zip(curr).map(|(p, c)| (p - c).powi(2)).sum();
    let den: f64 = prev.iter().map(|p| p * p).sum();
    if den < 1e-30 {
        0.0
    } else {
        num / den
    }
}

/// Natural cubic spline through `(xs, ys)` evaluated at `at`.
///
/// `xs` must be strictly increasing and `at` sorted; points outside the knot range
/// take the value of the nearest end knot.
pub(crate) fn natural_cubic_spline(xs: &[f64], ys: &[f64], at: &[f64]) -> Vec<f64> {
    let m = xs.len();
    match m {
        0 => return vec![0.0; at.len()],
        1 => return vec![ys[0]; at.len()],
        _ => {}
    }

    let k = m - 1;
    let h: Vec<f64> = xs.windows(2).map(|w| (w[1] - w[0]).max(1e-10)).collect();

    // Tridiagonal solve for the second-derivative coefficients
    let mut l = vec![1.0; m];
    let mut mu = vec![0.0; m];
    let mut z = vec![0.0; m];
    for i in 1..k {
        let alpha = 3.0 / h[i] * (ys[i + 1] - ys[i]) - 3.0 / h[i - 1] * (ys[i] - ys[i - 1]);
        l[i] = 2.0 * (xs[i + 1] - xs[i - 1]) - h[i - 1] * mu[i - 1];
        if l[i].abs() < 1e-30 {
            l[i] = 1e-30;
        }
        mu[i] = h[i] / l[i];
        z[i] = (alpha - h[i - 1] * z[i - 1]) / l[i];
    }

    let mut c = vec![0.0; m];
    let mut b = vec![0.0; k];
    let mut d = vec![0.0; k];
    for j in (0..k).rev() {
        c[j] = z[j] - mu[j] * c[j + 1];
        b[j] = (ys[j + 1] - ys[j]) / h[j] - h[j] * (c[j + 1] + 2.0 * c[j]) / 3.0;
        d[j] = (c[j + 1] - c[j]) / (3.0 * h[j]);
    }

    let mut out = Vec::with_capacity(at.len());
    let mut seg = 0;
    for &x in at {
        if x <= xs[0] {
            out.push(ys[0]);
            continue;
        }
        if x >= xs[k] {
            out.push(ys[k]);
            continue;
        }
        while seg < k - 1 && x > xs[seg + 1] {
            seg += 1;
        }
        let dx = x - xs[seg];
        out.push(ys[seg] + b[seg] * dx + c[seg] * dx * dx + d[seg] * dx * dx * dx);
    }
    out
}
