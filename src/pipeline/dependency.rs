//! Dependency library build.

use super::{BuildOptions, Error, Result, fs};
use crate::cli::OutputManager;
use crate::config::DependencyConfig;
use crate::process::{OutputMode, ToolRunner, WorkingDir};

const PHASE: &str = "dependency build";

/// Run code generation then the bundler build inside the dependency root and
/// verify the entry file.
///
/// Returns `false` when the build was skipped.
pub async fn build(
    config: &DependencyConfig,
    options: BuildOptions,
    runner: &ToolRunner<'_>,
    output: &OutputManager,
) -> Result<bool> {
    let entry = config.entry_path();

    if options.skip_dependency_build {
        output.indent("Skipped (--skip-dependency-build)");
        if !fs::is_file(&entry).await {
            output.warn(&format!(
                "No previous dependency build at {}; the package build may fail",
                entry.display()
            ));
        }
        return Ok(false);
    }

    {
        let _cwd = WorkingDir::enter(&config.root)?;
        let mode = OutputMode::Filter {
            exclude_warnings: false,
        };

        output.progress(&format!("Generating code: {}", config.codegen));
        runner.run_checked(&config.codegen, mode).await?;

        output.progress(&format!("Building: {}", config.build));
        runner.run_checked(&config.build, mode).await?;
    }

    if !fs::is_file(&entry).await {
        return Err(Error::MissingArtifact {
            phase: PHASE,
            path: entry,
        });
    }

    output.success(&format!("Dependency built: {}", entry.display()));
    Ok(true)
}
