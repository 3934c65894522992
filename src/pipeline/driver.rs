// src/pipeline/driver.rs
//! Batch driver: decompose a raw corpus, then synthesize recombined captures

use std::time::Instant;

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{error, info, warn};

use crate::capture::{CaptureKey, CaptureReader};
use crate::config::PipelineConfig;
use crate::error::{CsiResult, IntoCsiError};
use crate::pipeline::corpus::{self, CorpusEntry};
use crate::pipeline::report::BatchReport;
use crate::processing::{recombine_group, CaptureAssembler, CaptureImfTensor};
use crate::storage::TensorStore;

/// Runs the pipeline over a whole corpus on a dedicated worker pool
pub struct BatchDriver {
    config: PipelineConfig,
    reader: CaptureReader,
    assembler: CaptureAssembler,
    store: TensorStore,
    pool: ThreadPool,
}

impl BatchDriver {
    pub fn new(config: PipelineConfig) -> CsiResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.batch.worker_threads)
            .thread_name(|i| format!("csi-imf-worker-{}", i))
            .build()
            .csi_err("thread_pool", "build")?;

        Ok(Self {
            reader: CaptureReader::from_settings(&config.capture),
            assembler: CaptureAssembler::from_config(&config),
            store: TensorStore::from_settings(&config.storage),
            pool,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &TensorStore {
        &self.store
    }

    /// Decompose every capture under the raw root and persist its tensor
    pub fn decompose(&self) -> CsiResult<BatchReport> {
        let started = Instant::now();
        let index = corpus::discover(
            &self.config.storage.raw_root,
            &self.config.batch.activities,
            &self.config.batch.subjects,
        )?;
        let entries = corpus::entries_of(&index);
        info!(captures = entries.len(), root = %self.config.storage.raw_root.display(), "starting decomposition");

        let results: Vec<(CaptureKey, CsiResult<()>)> = self.pool.install(|| {
            entries
                .par_iter()
                .map(|entry| (entry.key.clone(), self.decompose_entry(entry)))
                .collect()
        });

        let mut report = BatchReport::default();
        for (key, result) in &results {
            if let Err(err) = result {
                if !err.is_unit_scoped() {
                    return Err(err.clone());
                }
            }
            report.record_capture(&key.identity(), result);
        }

        report.elapsed_secs = started.elapsed().as_secs_f64();
        info!(
            processed = report.captures_processed,
            failed = report.captures_failed,
            elapsed_secs = report.elapsed_secs,
            "decomposition finished"
        );
        Ok(report)
    }

    /// Recombine every persisted subject/activity group
    pub fn synthesize(&self) -> CsiResult<BatchReport> {
        let started = Instant::now();
        let groups = self.store.list_capture_groups()?;
        let levels = self.config.decomposition.imf_levels;
        info!(groups = groups.len(), "starting synthesis");

        let reports: Vec<BatchReport> = self.pool.install(|| {
            groups
                .par_iter()
                .filter(|((subject, activity), _)| self.in_scope(subject, activity))
                .map(|(_, keys)| self.synthesize_group(keys, levels))
                .collect()
        });

        let mut report = BatchReport::default();
        for group_report in reports {
            report.merge(group_report);
        }

        report.elapsed_secs = started.elapsed().as_secs_f64();
        info!(
            written = report.synthetic_written,
            failed = report.synthetic_failed,
            unloadable = report.tensors_unloadable,
            elapsed_secs = report.elapsed_secs,
            "synthesis finished"
        );
        Ok(report)
    }

    /// Decompose, then synthesize; writes the report when a path is configured
    pub fn run(&self) -> CsiResult<BatchReport> {
        let mut report = self.decompose()?;
        report.merge(self.synthesize()?);
        self.write_report(&report)?;
        Ok(report)
    }

    pub fn write_report(&self, report: &BatchReport) -> CsiResult<()> {
        if let Some(path) = &self.config.batch.report_path {
            report.write_json(path)?;
            info!(path = %path.display(), "wrote run report");
        }
        Ok(())
    }

    fn decompose_entry(&self, entry: &CorpusEntry) -> CsiResult<()> {
        let result = self
            .reader
            .read_path(&entry.path)
            .and_then(|raw| self.assembler.process_capture(&raw, &entry.key))
            .and_then(|tensor| self.store.save_capture(&tensor));

        match result {
            Ok(path) => {
                info!(capture = %entry.key, path = %path.display(), "capture decomposed");
                Ok(())
            }
            Err(err) => {
                error!(capture = %entry.key, source = %entry.path.display(), error = %err, "capture failed");
                Err(err)
            }
        }
    }

    fn synthesize_group(&self, keys: &[CaptureKey], levels: usize) -> BatchReport {
        let mut report = BatchReport::default();

        let mut group: Vec<CaptureImfTensor> = Vec::with_capacity(keys.len());
        for key in keys {
            match self.store.load_capture(key) {
                Ok(tensor) => group.push(tensor),
                Err(err) => {
                    warn!(capture = %key, error = %err, "tensor skipped");
                    report.record_unloadable(&key.identity(), &err);
                }
            }
        }

        for (key, result) in recombine_group(&group, levels) {
            let saved: CsiResult<()> = result.and_then(|tensor| self.store.save_synthetic(&tensor).map(|_| ()));
            report.record_synthetic(&key.to_string(), &saved);
        }
        report
    }

    fn in_scope(&self, subject: &str, activity: &str) -> bool {
        let batch = &self.config.batch;
        (batch.subjects.is_empty() || batch.subjects.iter().any(|s| s == subject))
            && (batch.activities.is_empty() || batch.activities.iter().any(|a| a == activity))
    }
}

impl std::fmt::Debug for BatchDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchDriver")
            .field("store", &self.store)
            .field("workers", &self.pool.current_num_threads())
            .finish()
    }
}

/// Convenience for callers that only hold a configuration
pub fn run_batch(config: PipelineConfig) -> CsiResult<BatchReport> {
    BatchDriver::new(config)?.run()
}
