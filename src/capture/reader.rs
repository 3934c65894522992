// src/capture/reader.rs
//! Delimited-text capture reader

use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use ndarray::Array2;
use tracing::debug;

use crate::capture::RawCapture;
use crate::config::CaptureSettings;
use crate::error::{CsiErrorBuilder, CsiResult};

/// Parses raw captures: no header, `timestamp_columns` leading columns dropped, the rest
/// alternating imaginary/real components
#[derive(Debug, Clone)]
pub struct CaptureReader {
    delimiter: u8,
    timestamp_columns: usize,
    sampling_rate_hz: f64,
}

impl CaptureReader {
    pub fn new(delimiter: u8, timestamp_columns: usize, sampling_rate_hz: f64) -> Self {
        Self {
            delimiter,
            timestamp_columns,
            sampling_rate_hz,
        }
    }

    pub fn from_settings(settings: &CaptureSettings) -> Self {
        // Non-ASCII delimiters are rejected by config validation
        let delimiter = u8::try_from(settings.delimiter).unwrap_or(b',');
        Self::new(delimiter, settings.timestamp_columns, settings.sampling_rate_hz)
    }

    /// Read a capture file
    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> CsiResult<RawCapture> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let file = std::fs::File::open(path)
            .map_err(|e| CsiErrorBuilder::new("capture_reader", "open").io(&origin, &e.to_string()))?;
        self.read_from(file, &origin)
    }

    /// Read a capture from any byte source; `origin` names it in errors
    pub fn read_from<R: Read>(&self, source: R, origin: &str) -> CsiResult<RawCapture> {
        let malformed = |reason: String| {
            CsiErrorBuilder::new("capture_reader", "parse").malformed_capture(origin, &reason)
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(source);

        let mut values: Vec<f64> = Vec::new();
        let mut width: Option<usize> = None;
        let mut rows = 0usize;

        for (row_idx, result) in reader.records().enumerate() {
            let row = row_idx + 1;
            let record = result.map_err(|e| malformed(format!("row {}: {}", row, e)))?;

            // Tolerate a trailing blank line
            if record.len() == 1 && record[0].is_empty() {
                continue;
            }

            if record.len() <= self.timestamp_columns {
                return Err(malformed(format!(
                    "row {} has {} columns, no components after {} timestamp column(s)",
                    row,
                    record.len(),
                    self.timestamp_columns
                )));
            }

            let components = record.len() - self.timestamp_columns;
            match width {
                None => {
                    if components % 2 != 0 {
                        return Err(malformed(format!(
                            "row {} has an odd component count ({})",
                            row, components
                        )));
                    }
                    width = Some(components);
                }
                Some(expected) if expected != components => {
                    return Err(malformed(format!(
                        "row {} has {} components, expected {}",
                        row, components, expected
                    )));
                }
                Some(_) => {}
            }

            for (col, field) in record.iter().enumerate().skip(self.timestamp_columns) {
                let value = parse_component(field)
                    .ok_or_else(|| malformed(format!("row {}, column {}: invalid number {:?}", row, col + 1, field)))?;
                values.push(value);
            }
            rows += 1;
        }

        let width = width.ok_or_else(|| malformed("capture contains no samples".to_string()))?;
        let samples = Array2::from_shape_vec((rows, width), values)
            .map_err(|e| malformed(e.to_string()))?;

        debug!(origin, rows, components = width, "read capture");
        Ok(RawCapture::new(samples, self.sampling_rate_hz, origin))
    }
}

impl Default for CaptureReader {
    fn default() -> Self {
        Self::from_settings(&CaptureSettings::default())
    }
}

// Empty cells and "nan" are kept as NaN; the amplitude extractor zeroes them
fn parse_component(field: &str) -> Option<f64> {
    if field.is_empty() {
        return Some(f64::NAN);
    }
    field.parse::<f64>().ok()
}
