//! Package build.

use super::{Error, Result, fs};
use crate::cli::OutputManager;
use crate::config::PackageConfig;
use crate::process::{OutputMode, ToolRunner, WorkingDir};
use std::path::PathBuf;

const PHASE: &str = "package build";

/// Rebuild the package from a clean output directory and verify the binary
/// entry point. Returns the entry point path.
pub async fn build(
    config: &PackageConfig,
    runner: &ToolRunner<'_>,
    output: &OutputManager,
) -> Result<PathBuf> {
    {
        let _cwd = WorkingDir::enter(&config.root)?;

        let out_dir = config.output_dir_path();
        if fs::remove_dir_all(&out_dir).await? {
            output.indent(&format!("Removed {}", out_dir.display()));
        }

        output.progress(&format!("Cleaning: {}", config.cleanup));
        runner.run_checked(&config.cleanup, OutputMode::Discard).await?;

        output.progress(&format!("Building: {}", config.build));
        runner
            .run_checked(
                &config.build,
                OutputMode::Filter {
                    exclude_warnings: true,
                },
            )
            .await?;

        output.progress(&format!("Copying files: {}", config.copy_files));
        runner.run_checked(&config.copy_files, OutputMode::Discard).await?;
    }

    let entry = config.binary_entry_path();
    if !fs::is_file(&entry).await {
        return Err(Error::MissingArtifact {
            phase: PHASE,
            path: entry,
        });
    }

    output.success(&format!("Package built: {}", entry.display()));
    Ok(entry)
}
