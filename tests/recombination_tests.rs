// tests/recombination_tests.rs
//! Synthetic recombination and its persistence

use std::collections::HashSet;

use csi_imf::capture::{CaptureKey, SyntheticKey};
use csi_imf::error::CsiError;
use csi_imf::processing::{recombine, recombine_group, CaptureImfTensor};
use csi_imf::storage::TensorStore;
use ndarray::{Array3, Axis};
use tempfile::TempDir;

/// Tensor whose every value encodes (capture, level)
fn tagged(capture: usize, subcarriers: usize, levels: usize, samples: usize) -> Array3<f64> {
    Array3::from_shape_fn((subcarriers, levels + 1, samples), |(_, level, _)| (capture * 10 + level) as f64)
}

#[test]
fn test_interleave_for_three_levels() {
    let source = tagged(1, 2, 3, 6);
    let dest = tagged(2, 2, 3, 6);
    let out = recombine(source.view(), dest.view(), 3).unwrap();

    assert_eq!(out.dim(), (2, 4, 6));
    let expected = [10.0, 21.0, 12.0, 23.0];
    for (level, value) in expected.iter().enumerate() {
        assert!(out.index_axis(Axis(1), level).iter().all(|v| v == value));
    }
}

#[test]
fn test_mismatched_shapes_rejected() {
    let source = tagged(1, 2, 3, 6);
    let dest = tagged(2, 3, 3, 6);
    match recombine(source.view(), dest.view(), 3) {
        Err(CsiError::ShapeMismatch { source_shape, dest_shape, expected_levels, .. }) => {
            assert_eq!(source_shape, vec![2, 4, 6]);
            assert_eq!(dest_shape, vec![3, 4, 6]);
            assert_eq!(expected_levels, 3);
        }
        other => panic!("Expected shape mismatch, got {:?}", other),
    }
}

#[test]
fn test_four_captures_give_six_unique_pairs() {
    let group: Vec<CaptureImfTensor> = (0..4)
        .map(|i| CaptureImfTensor::new(CaptureKey::new("S07", "PI", i), tagged(i, 2, 3, 5)))
        .collect();

    let results = recombine_group(&group, 3);
    assert_eq!(results.len(), 6);

    let keys: HashSet<SyntheticKey> = results.iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(keys.len(), 6);
    assert!(results.iter().all(|(k, _)| k.source_index < k.dest_index && k.activity == "PI"));

    let tensors: Vec<_> = results.into_iter().map(|(_, r)| r.unwrap()).collect();
    for (a, b) in tensors.iter().zip(tensors.iter().skip(1)) {
        assert_ne!(a.data, b.data);
    }
}

#[test]
fn test_group_is_reproducible() {
    let group: Vec<CaptureImfTensor> = (0..3)
        .map(|i| CaptureImfTensor::new(CaptureKey::new("S01", "WA", i), tagged(i, 1, 2, 4)))
        .collect();
    let first: Vec<_> = recombine_group(&group, 2).into_iter().map(|(k, r)| (k, r.unwrap().data)).collect();
    let second: Vec<_> = recombine_group(&group, 2).into_iter().map(|(k, r)| (k, r.unwrap().data)).collect();
    assert_eq!(first, second);
}

#[test]
fn test_synthetic_tensors_persist_under_activity() {
    let dir = TempDir::new().unwrap();
    let store = TensorStore::new(dir.path().join("imfs"), dir.path().join("synthetic"));
    let group: Vec<CaptureImfTensor> = (0..3)
        .map(|i| CaptureImfTensor::new(CaptureKey::new("S01", "WA", i), tagged(i, 2, 3, 5)))
        .collect();

    for (key, result) in recombine_group(&group, 3) {
        let tensor = result.unwrap();
        let path = store.save_synthetic(&tensor).unwrap();
        assert_eq!(path, dir.path().join("synthetic").join("WA").join(format!(
            "S01_{}-{}.npy",
            key.source_index, key.dest_index
        )));
        assert_eq!(store.load_synthetic(&key).unwrap(), tensor);
    }
}
