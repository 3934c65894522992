// src/pipeline/report.rs
//! Batch run report

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CsiError, CsiErrorBuilder, CsiResult};

/// A unit that failed and was skipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitFailure {
    /// Capture key, synthetic key or path
    pub unit: String,
    pub category: String,
    pub message: String,
}

/// Outcome counts and failures for one batch run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub captures_processed: usize,
    pub captures_failed: usize,
    pub synthetic_written: usize,
    pub synthetic_failed: usize,
    /// Persisted capture tensors that could not be loaded for synthesis
    #[serde(default)]
    pub tensors_unloadable: usize,
    pub elapsed_secs: f64,
    pub failures: Vec<UnitFailure>,
}

impl BatchReport {
    pub fn record_capture(&mut self, unit: &str, result: &CsiResult<()>) {
        match result {
            Ok(()) => self.captures_processed += 1,
            Err(err) => {
                self.captures_failed += 1;
                self.push_failure(unit, err);
            }
        }
    }

    pub fn record_synthetic(&mut self, unit: &str, result: &CsiResult<()>) {
        match result {
            Ok(()) => self.synthetic_written += 1,
            Err(err) => {
                self.synthetic_failed += 1;
                self.push_failure(unit, err);
            }
        }
    }

    /// A capture tensor that failed to load, leaving its pairs out of synthesis
    pub fn record_unloadable(&mut self, unit: &str, err: &CsiError) {
        self.tensors_unloadable += 1;
        self.push_failure(unit, err);
    }

    fn push_failure(&mut self, unit: &str, err: &CsiError) {
        self.failures.push(UnitFailure {
            unit: unit.to_string(),
            category: err.category().to_string(),
            message: err.to_string(),
        });
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.captures_processed += other.captures_processed;
        self.captures_failed += other.captures_failed;
        self.synthetic_written += other.synthetic_written;
        self.synthetic_failed += other.synthetic_failed;
        self.tensors_unloadable += other.tensors_unloadable;
        self.elapsed_secs += other.elapsed_secs;
        self.failures.extend(other.failures);
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn to_json(&self) -> CsiResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CsiErrorBuilder::new("report", "serialize").persistence("<report>", &e.to_string()))
    }

    pub fn write_json(&self, path: &Path) -> CsiResult<()> {
        let json = self.to_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| CsiErrorBuilder::new("report", "create_dir").io(&parent.display().to_string(), &e.to_string()))?;
        }
        std::fs::write(path, json)
            .map_err(|e| CsiErrorBuilder::new("report", "write").io(&path.display().to_string(), &e.to_string()))
    }
}
