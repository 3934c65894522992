// src/cli.rs
//! Argument parsing for running from the command line

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::{ConfigLoader, PipelineConfig};
use crate::error::{CsiErrorBuilder, CsiResult};
use crate::pipeline::{BatchDriver, BatchReport};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,
    /// Configuration file; replaces the standard search path
    #[clap(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Root of the raw corpus, laid out as activity/subject/file
    #[clap(long, global = true)]
    pub raw_root: Option<PathBuf>,
    /// Where capture tensors are written
    #[clap(long, global = true)]
    pub imf_root: Option<PathBuf>,
    /// Where synthetic tensors are written
    #[clap(long, global = true)]
    pub synthetic_root: Option<PathBuf>,
    /// Write a JSON run report here
    #[clap(long, global = true)]
    pub report: Option<PathBuf>,
    /// Worker threads (0 uses one per CPU)
    #[clap(short, long, global = true)]
    pub workers: Option<usize>,
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Decompose every raw capture into an IMF tensor
    Decompose,
    /// Recombine persisted capture tensors into synthetic captures
    Synthesize,
    /// Decompose, then synthesize
    Run,
    /// Print the effective configuration
    Config,
}

impl Args {
    /// Load configuration from files and environment, then apply flag overrides
    pub fn load_config(&self) -> CsiResult<PipelineConfig> {
        let mut loader = match &self.config {
            Some(path) => ConfigLoader::with_paths(vec![path.clone()]),
            None => ConfigLoader::new(),
        };
        let mut config = loader.load()?;
        self.apply_overrides(&mut config);

        config.validate_consistency().map_err(|errors| {
            CsiErrorBuilder::new("cli", "apply_overrides").configuration(&errors.join("; "))
        })?;
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut PipelineConfig) {
        if let Some(path) = &self.raw_root {
            config.storage.raw_root = path.clone();
        }
        if let Some(path) = &self.imf_root {
            config.storage.imf_root = path.clone();
        }
        if let Some(path) = &self.synthetic_root {
            config.storage.synthetic_root = path.clone();
        }
        if let Some(path) = &self.report {
            config.batch.report_path = Some(path.clone());
        }
        if let Some(workers) = self.workers {
            config.batch.worker_threads = workers;
        }
    }
}

/// Execute one subcommand. `Config` prints and returns an empty report.
pub fn execute(command: Command, config: PipelineConfig) -> CsiResult<BatchReport> {
    if command == Command::Config {
        let rendered = toml::to_string_pretty(&config)
            .map_err(|e| CsiErrorBuilder::new("cli", "print_config").configuration(&e.to_string()))?;
        println!("{}", rendered);
        return Ok(BatchReport::default());
    }

    let summary = config.get_summary();
    info!(
        tensor_shape = ?summary.tensor_shape,
        trials = summary.ensemble_trials,
        seed_policy = ?summary.seed_policy,
        "pipeline configured"
    );

    let driver = BatchDriver::new(config)?;
    match command {
        Command::Decompose => {
            let report = driver.decompose()?;
            driver.write_report(&report)?;
            Ok(report)
        }
        Command::Synthesize => {
            let report = driver.synthesize()?;
            driver.write_report(&report)?;
            Ok(report)
        }
        Command::Run | Command::Config => driver.run(),
    }
}

/// Match verbosity filter with tracing subscriber log levels
pub fn convert_filter(filter: log::LevelFilter) -> tracing_subscriber::filter::LevelFilter {
    match filter {
        log::LevelFilter::Off => tracing_subscriber::filter::LevelFilter::OFF,
        log::LevelFilter::Error => tracing_subscriber::filter::LevelFilter::ERROR,
        log::LevelFilter::Warn => tracing_subscriber::filter::LevelFilter::WARN,
        log::LevelFilter::Info => tracing_subscriber::filter::LevelFilter::INFO,
        log::LevelFilter::Debug => tracing_subscriber::filter::LevelFilter::DEBUG,
        log::LevelFilter::Trace => tracing_subscriber::filter::LevelFilter::TRACE,
    }
}
