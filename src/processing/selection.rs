// src/processing/selection.rs
//! Variance-ranked subcarrier selection

use ndarray::{Array2, ArrayView2, Axis};
use tracing::debug;

use crate::error::{CsiErrorBuilder, CsiResult};

/// Top-K subcarriers, most variant first
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedSubcarrierSet {
    /// Column indices into the input matrix
    pub indices: Vec<usize>,
    /// The original (unnormalized) columns at `indices`, shape `(sample_count, K)`
    pub matrix: Array2<f64>,
}

/// Min-max normalize each column into `[floor, ceil]`; constant columns map to `floor`
pub fn normalize_columns(matrix: ArrayView2<f64>, floor: f64, ceil: f64) -> Array2<f64> {
    let mut normalized = matrix.to_owned();
    for mut column in normalized.axis_iter_mut(Axis(1)) {
        let min = column.iter().copied().fold(f64::INFINITY, f64::min);
        let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = max - min;
        if span > 0.0 && span.is_finite() {
            column.mapv_inplace(|v| floor + (v - min) / span * (ceil - floor));
        } else {
            column.fill(floor);
        }
    }
    normalized
}

/// Rank columns by population variance of their `[floor, ceil]`-normalized copy and
/// keep the first `k`. Ties keep the lower index first.
pub fn select_top_k(matrix: ArrayView2<f64>, k: usize, floor: f64, ceil: f64) -> CsiResult<SelectedSubcarrierSet> {
    if k == 0 || k > matrix.ncols() {
        return Err(CsiErrorBuilder::new("selection", "select_top_k").invalid_parameter(
            "k",
            &format!("must be within 1..={} columns, got {}", matrix.ncols(), k),
        ));
    }
    if matrix.nrows() == 0 {
        return Err(CsiErrorBuilder::new("selection", "select_top_k")
            .invalid_parameter("matrix", "no samples to rank"));
    }

    let normalized = normalize_columns(matrix, floor, ceil);
    let variances = normalized.var_axis(Axis(0), 0.0);

    let mut order: Vec<usize> = (0..matrix.ncols()).collect();
    // sort_by is stable
    order.sort_by(|&a, &b| variances[b].total_cmp(&variances[a]));
    order.truncate(k);

    debug!(k, top = ?order.first(), "selected subcarriers by variance");
    Ok(SelectedSubcarrierSet {
        matrix: matrix.select(Axis(1), &order),
        indices: order,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CsiError;
    use ndarray::{array, Array2};

    #[test]
    fn test_constant_column_normalizes_to_floor() {
        let m = array![[2.0, 0.0], [2.0, 5.0], [2.0, 10.0]];
        let n = normalize_columns(m.view(), 0.0, 1.0);
        assert!(n.iter().all(|v| v.is_finite()));
        assert_eq!(n.column(0).to_vec(), vec![0.0, 0.0, 0.0]);
        assert_eq!(n.column(1).to_vec(), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_custom_range() {
        let m = array![[0.0], [10.0]];
        let n = normalize_columns(m.view(), -1.0, 1.0);
        assert_eq!(n.column(0).to_vec(), vec![-1.0, 1.0]);
    }

    #[test]
    fn test_variant_column_wins_either_order() {
        let varying = array![0.0, 10.0, 0.0, 10.0];
        let constant = array![3.0, 3.0, 3.0, 3.0];

        let mut m = Array2::zeros((4, 2));
        m.column_mut(0).assign(&constant);
        m.column_mut(1).assign(&varying);
        assert_eq!(select_top_k(m.view(), 1, 0.0, 1.0).unwrap().indices, vec![1]);

        m.column_mut(0).assign(&varying);
        m.column_mut(1).assign(&constant);
        let set = select_top_k(m.view(), 1, 0.0, 1.0).unwrap();
        assert_eq!(set.indices, vec![0]);
        assert_eq!(set.matrix.column(0).to_vec(), varying.to_vec());
    }

    #[test]
    fn test_ties_keep_index_order() {
        let m = array![[0.0, 0.0, 1.0], [1.0, 1.0, 1.0]];
        let set = select_top_k(m.view(), 3, 0.0, 1.0).unwrap();
        assert_eq!(set.indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_invalid_k() {
        let m = Array2::<f64>::zeros((3, 2));
        assert!(matches!(select_top_k(m.view(), 0, 0.0, 1.0), Err(CsiError::InvalidParameter { .. })));
        assert!(matches!(select_top_k(m.view(), 3, 0.0, 1.0), Err(CsiError::InvalidParameter { .. })));
    }
}
