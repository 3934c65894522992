// tests/error_propagation_tests.rs
//! Error handling across component boundaries
//!
//! Covers:
//! - which variant each stage reports for bad input
//! - context (component, operation) carried by errors
//! - validation errors converting into invalid-parameter errors
//! - configuration errors aborting instead of being skipped

use std::io::Write;

use csi_imf::capture::{CaptureKey, CaptureReader, RawCapture};
use csi_imf::config::{ConfigError, ConfigLoader, PipelineConfig};
use csi_imf::error::{CsiError, CsiErrorBuilder, CsiResult, IntoCsiError};
use csi_imf::processing::{decompose, time_axis, CaptureAssembler, EemdConfig};
use csi_imf::utils::validation::validate_positive;
use ndarray::{Array1, Array2};
use serial_test::serial;
use tempfile::NamedTempFile;

#[test]
fn test_odd_component_capture_reports_origin() {
    let raw = RawCapture::new(Array2::zeros((900, 127)), 50.0, "WA/S01/odd.csv");
    let assembler = CaptureAssembler::from_config(&PipelineConfig::default());
    match assembler.process_capture(&raw, &CaptureKey::new("S01", "WA", 0)) {
        Err(CsiError::MalformedCapture { origin, context, .. }) => {
            assert_eq!(origin, "WA/S01/odd.csv");
            assert_eq!(context.component, "amplitude");
        }
        other => panic!("Expected malformed capture, got {:?}", other),
    }
}

#[test]
fn test_short_capture_reports_counts() {
    let raw = RawCapture::new(Array2::ones((849, 128)), 50.0, "short.csv");
    let assembler = CaptureAssembler::from_config(&PipelineConfig::default());
    match assembler.process_capture(&raw, &CaptureKey::new("S01", "WA", 0)) {
        Err(err @ CsiError::InsufficientSamples { .. }) => {
            assert!(err.is_unit_scoped());
            let text = err.to_string();
            assert!(text.contains("850"));
            assert!(text.contains("849"));
        }
        other => panic!("Expected insufficient samples, got {:?}", other),
    }
}

#[test]
fn test_reader_errors_name_the_row() {
    let err = CaptureReader::default()
        .read_from("0,1,2\n1,1,2\n2,abc,3\n".as_bytes(), "inline")
        .unwrap_err();
    assert_eq!(err.category(), "malformed_capture");
    assert!(err.to_string().contains("row 3"));
}

#[test]
fn test_length_mismatch_is_invalid_parameter() {
    let trace = Array1::zeros(20);
    match decompose(trace.view(), time_axis(19).view(), 3, 2, 5, &EemdConfig::default()) {
        Err(CsiError::InvalidParameter { parameter, .. }) => assert_eq!(parameter, "time_axis"),
        other => panic!("Expected invalid parameter, got {:?}", other),
    }
}

#[test]
fn test_validation_error_conversion() {
    fn check(levels: usize) -> CsiResult<usize> {
        Ok(validate_positive("levels", levels)?)
    }
    match check(0) {
        Err(CsiError::InvalidParameter { parameter, context, .. }) => {
            assert_eq!(parameter, "levels");
            assert_eq!(context.component, "validation");
            assert!(context.line.is_some());
        }
        other => panic!("Expected invalid parameter, got {:?}", other),
    }
}

#[test]
fn test_foreign_errors_gain_context() {
    let parse: Result<u32, std::num::ParseIntError> = "x".parse();
    let err = parse.csi_err("cli", "parse_workers").unwrap_err();
    assert_eq!(err.category(), "system");
    assert_eq!(err.context().operation, "parse_workers");
}

#[test]
#[serial]
fn test_invalid_config_file_aborts() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[selection]\nnormalize_floor = 2.0\nnormalize_ceil = 1.0").unwrap();

    let err = ConfigLoader::with_paths(vec![file.path().to_path_buf()]).load().unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));

    let csi: CsiError = err.into();
    assert_eq!(csi.category(), "configuration");
    assert!(!csi.is_unit_scoped());
}

#[test]
#[serial]
fn test_malformed_toml_is_parse_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[decomposition\nimf_levels = ").unwrap();
    let err = ConfigLoader::with_paths(vec![file.path().to_path_buf()]).load().unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn test_builder_errors_display_component_tags() {
    let cases = vec![
        (CsiErrorBuilder::new("store", "write").persistence("a.npy", "disk full"), "[STORE]"),
        (CsiErrorBuilder::new("corpus", "read_dir").io("raw", "denied"), "[IO]"),
        (CsiErrorBuilder::new("selection", "select_top_k").invalid_parameter("k", "zero"), "[PARAM]"),
    ];
    for (err, tag) in cases {
        assert!(err.to_string().starts_with(tag), "{} lacks {}", err, tag);
    }
}
