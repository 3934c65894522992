// tests/amplitude_selection_tests.rs
//! Amplitude extraction and subcarrier selection through the public API
use csi_imf::capture::{CaptureReader, RawCapture};
use csi_imf::config::constants::capture::{DEFAULT_NULL_SUBCARRIERS, SUBCARRIER_SLOTS, USABLE_SUBCARRIERS};
use csi_imf::error::CsiError;
use csi_imf::processing::{exclude_subcarriers, extract_amplitudes, normalize_columns, select_top_k};
use ndarray::{Array2, Axis};

fn full_width_capture(rows: usize) -> RawCapture {
    // Subcarrier sc has amplitude sc + 1 at every sample: im = 0, re = sc + 1
    let samples = Array2::from_shape_fn((rows, 2 * SUBCARRIER_SLOTS), |(_, c)| {
        if c % 2 == 0 {
            0.0
        } else {
            (c / 2 + 1) as f64
        }
    });
    RawCapture::new(samples, 50.0, "synthetic")
}

#[test]
fn test_reader_to_amplitudes() {
    let text = "17.2,3,4,0,2\n17.4,6,8,1,0\n";
    let raw = CaptureReader::default().read_from(text.as_bytes(), "inline").unwrap();
    let amp = extract_amplitudes(&raw).unwrap();

    assert_eq!(amp.dim(), (2, 2));
    assert!((amp[[0, 0]] - 5.0).abs() < 1e-12);
    assert!((amp[[1, 0]] - 10.0).abs() < 1e-12);
    assert!((amp[[0, 1]] - 2.0).abs() < 1e-12);
    assert!((amp[[1, 1]] - 1.0).abs() < 1e-12);
}

#[test]
fn test_all_zero_row_yields_zeros() {
    let raw = RawCapture::new(Array2::zeros((3, 8)), 50.0, "zeros");
    let amp = extract_amplitudes(&raw).unwrap();
    assert!(amp.iter().all(|&v| v == 0.0));
}

#[test]
fn test_nan_components_become_zero() {
    let mut samples = Array2::ones((2, 4));
    samples[[1, 2]] = f64::NAN;
    let amp = extract_amplitudes(&RawCapture::new(samples, 50.0, "nan")).unwrap();
    assert_eq!(amp[[1, 1]], 0.0);
    assert!(amp.iter().all(|v| !v.is_nan()));
}

#[test]
fn test_null_exclusion_leaves_usable_subcarriers() {
    let amp = extract_amplitudes(&full_width_capture(5)).unwrap();
    let usable = exclude_subcarriers(amp.view(), DEFAULT_NULL_SUBCARRIERS);
    assert_eq!(usable.ncols(), USABLE_SUBCARRIERS);

    // Slot 1 survives as column 0; slot 38 follows slot 26 directly
    assert!((usable[[0, 0]] - 2.0).abs() < 1e-12);
    assert!((usable[[0, 25]] - 27.0).abs() < 1e-12);
    assert!((usable[[0, 26]] - 39.0).abs() < 1e-12);
}

#[test]
fn test_selection_returns_unique_indices_most_variant_first() {
    let matrix = Array2::from_shape_fn((40, 6), |(t, c)| ((t * (c + 1)) % 7) as f64 * c as f64);
    let set = select_top_k(matrix.view(), 4, 0.0, 1.0).unwrap();

    assert_eq!(set.indices.len(), 4);
    let mut unique = set.indices.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), 4);

    let variances = normalize_columns(matrix.view(), 0.0, 1.0).var_axis(Axis(0), 0.0);
    for pair in set.indices.windows(2) {
        assert!(variances[pair[0]] >= variances[pair[1]]);
    }
    for (out_col, &src_col) in set.indices.iter().enumerate() {
        assert_eq!(set.matrix.column(out_col), matrix.column(src_col));
    }
}

#[test]
fn test_selection_rejects_k_above_columns() {
    let matrix = Array2::<f64>::ones((4, 3));
    match select_top_k(matrix.view(), 4, 0.0, 1.0) {
        Err(CsiError::InvalidParameter { parameter, .. }) => assert_eq!(parameter, "k"),
        other => panic!("Expected invalid parameter, got {:?}", other),
    }
}
