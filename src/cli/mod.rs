//! Command line interface for the pack pipeline.
//!
//! Parses arguments, loads `bundle.toml`, runs the pipeline and maps the
//! outcome to an exit code.

mod args;
mod output;

pub use args::{Args, RuntimeConfig};
pub use output::OutputManager;

use crate::config::PipelineConfig;
use crate::error::{BundlerError, Result};
use crate::pipeline::{BuildOptions, Pipeline};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    run_with_args(Args::parse_args()).await
}

/// Run the pipeline for already-parsed arguments.
///
/// Returns `0` on success and `1` on any fatal condition.
pub async fn run_with_args(args: Args) -> Result<i32> {
    let runtime_config = RuntimeConfig::from(&args);
    let output = runtime_config.output();

    if let Err(reason) = args.validate() {
        output.error(&reason);
        return Ok(1);
    }

    let config = match PipelineConfig::load(&args.workspace, args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            report_failure(&runtime_config, &e);
            return Ok(1);
        }
    };
    let options = BuildOptions::new(&args, &config);
    log::debug!("Build options: {:?}", options);

    let pipeline = Pipeline::new(config, options);
    match pipeline.run(&runtime_config).await {
        Ok(summary) => {
            summary.print(output);
            Ok(0)
        }
        Err(e) => {
            report_failure(&runtime_config, &BundlerError::from(e));
            Ok(1)
        }
    }
}

fn report_failure(runtime_config: &RuntimeConfig, error: &BundlerError) {
    let output = runtime_config.output();
    output.error(&error.to_string());
    for suggestion in error.recovery_suggestions() {
        output.indent(&suggestion);
    }
}
