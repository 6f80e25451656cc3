//! Removal of previous build outputs.

use super::{error::Result, fs};
use crate::cli::OutputManager;
use crate::config::PipelineConfig;
use std::path::PathBuf;

/// Delete both output directories and every archive matching the archive
/// pattern in either package root.
///
/// Absent paths are skipped silently, so cleaning an already clean tree is a
/// no-op. Returns the paths that were actually removed.
pub async fn clean(config: &PipelineConfig, output: &OutputManager) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();

    for dir in [
        config.dependency.output_dir_path(),
        config.package.output_dir_path(),
    ] {
        if fs::remove_dir_all(&dir).await? {
            output.indent(&format!("Removed {}", dir.display()));
            removed.push(dir);
        }
    }

    for root in [&config.dependency.root, &config.package.root] {
        for (archive, _) in fs::matching_files(root, &config.archive.pattern).await? {
            if fs::remove_file(&archive).await? {
                output.indent(&format!("Removed {}", archive.display()));
                removed.push(archive);
            }
        }
    }

    if removed.is_empty() {
        output.indent("Nothing to clean");
    }
    log::info!("Cleaner removed {} path(s)", removed.len());
    Ok(removed)
}
