// src/processing/recombiner.rs
//! Synthetic captures from alternating IMF levels of two real captures

use ndarray::{Array3, ArrayView3, Axis};
use tracing::{debug, warn};

use crate::capture::SyntheticKey;
use crate::error::{CsiErrorBuilder, CsiResult};
use crate::processing::assembler::CaptureImfTensor;

/// Recombined capture; carries the activity of its parents
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticImfTensor {
    pub key: SyntheticKey,
    pub data: Array3<f64>,
}

/// Take even mode levels from `source` and odd ones from `dest`.
///
/// Both tensors must have the same shape with `levels + 1` entries on the level axis.
pub fn recombine(source: ArrayView3<f64>, dest: ArrayView3<f64>, levels: usize) -> CsiResult<Array3<f64>> {
    if source.dim() != dest.dim() || source.len_of(Axis(1)) != levels + 1 {
        return Err(CsiErrorBuilder::new("recombiner", "recombine").shape_mismatch(
            source.shape(),
            dest.shape(),
            levels,
        ));
    }

    let mut out = source.to_owned();
    for level in (1..=levels).step_by(2) {
        out.index_axis_mut(Axis(1), level).assign(&dest.index_axis(Axis(1), level));
    }
    Ok(out)
}

/// Recombine every pair `(i, j)` with `i < j` of one subject/activity group.
///
/// `group` must be ordered by capture index. A failing pair yields an error for that
/// pair alone.
pub fn recombine_group(group: &[CaptureImfTensor], levels: usize) -> Vec<(SyntheticKey, CsiResult<SyntheticImfTensor>)> {
    let mut results = Vec::with_capacity(group.len() * group.len().saturating_sub(1) / 2);

    for (i, source) in group.iter().enumerate() {
        for dest in &group[i + 1..] {
            let key = SyntheticKey::for_pair(&source.key, &dest.key);
            let result = recombine(source.data.view(), dest.data.view(), levels).map(|data| SyntheticImfTensor {
                key: key.clone(),
                data,
            });
            if let Err(err) = &result {
                warn!(pair = %key, error = %err, "skipping synthetic pair");
            }
            results.push((key, result));
        }
    }

    debug!(captures = group.len(), pairs = results.len(), "recombined group");
    results
}
