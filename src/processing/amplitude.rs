// src/processing/amplitude.rs
//! Amplitude extraction from interleaved imaginary/real CSI components

use ndarray::{s, Array2, ArrayView2, Axis};
use tracing::trace;

use crate::capture::RawCapture;
use crate::error::{CsiErrorBuilder, CsiResult};

/// Per-subcarrier amplitude, shape `(sample_count, S)`
pub type AmplitudeMatrix = Array2<f64>;

/// Deinterleave components and take `sqrt(im² + re²)` per subcarrier.
///
/// Column `2·sc` holds the imaginary part and column `2·sc + 1` the real part. NaN
/// amplitudes are replaced with 0.0.
pub fn extract_amplitudes(raw: &RawCapture) -> CsiResult<AmplitudeMatrix> {
    let components = raw.component_count();
    if components % 2 != 0 {
        return Err(CsiErrorBuilder::new("amplitude", "extract_amplitudes").malformed_capture(
            &raw.origin,
            &format!("odd component count ({})", components),
        ));
    }

    let imaginary = raw.samples.slice(s![.., 0..;2]);
    let real = raw.samples.slice(s![.., 1..;2]);

    let mut amplitudes = ndarray::Zip::from(imaginary)
        .and(real)
        .map_collect(|&im, &re| (im * im + re * re).sqrt());
    amplitudes.mapv_inplace(|a| if a.is_nan() { 0.0 } else { a });

    trace!(origin = %raw.origin, shape = ?amplitudes.dim(), "extracted amplitudes");
    Ok(amplitudes)
}

/// Drop known-null subcarrier columns. Out-of-range and duplicate indices are ignored.
pub fn exclude_subcarriers(matrix: ArrayView2<f64>, nulls: &[usize]) -> AmplitudeMatrix {
    let keep: Vec<usize> = (0..matrix.ncols()).filter(|sc| !nulls.contains(sc)).collect();
    matrix.select(Axis(1), &keep)
}

/// Keep the first `samples` rows
pub fn truncate(matrix: ArrayView2<f64>, samples: usize, origin: &str) -> CsiResult<AmplitudeMatrix> {
    if matrix.nrows() < samples {
        return Err(CsiErrorBuilder::new("amplitude", "truncate").insufficient_samples(
            origin,
            samples,
            matrix.nrows(),
        ));
    }
    Ok(matrix.slice(s![..samples, ..]).to_owned())
}
