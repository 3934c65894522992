use std::process::ExitCode;

use clap::Parser;
use csi_imf::cli::{convert_filter, execute, Args};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(convert_filter(args.verbose.log_level_filter()))
        .with_thread_names(true)
        .init();

    info!("{} v{}", csi_imf::NAME, csi_imf::VERSION);

    let config = match args.load_config() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "could not load configuration");
            return ExitCode::FAILURE;
        }
    };

    match execute(args.command, config) {
        Ok(report) => {
            if report.has_failures() {
                warn!(failures = report.failures.len(), "finished with skipped units");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, category = err.category(), "run aborted");
            ExitCode::FAILURE
        }
    }
}
