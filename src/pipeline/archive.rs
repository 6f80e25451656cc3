//! Archive creation, discovery and smoke testing.

use super::{Error, Result, fs};
use crate::cli::OutputManager;
use crate::config::PipelineConfig;
use crate::process::{OutputMode, ToolRunner, WorkingDir};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// The archive found after packing.
#[derive(Debug, Clone)]
pub struct ArchiveInfo {
    /// Absolute path in the package root
    pub path: PathBuf,
    /// File name
    pub file_name: String,
    /// Size in bytes
    pub size: u64,
    /// Modification time
    pub modified: DateTime<Local>,
    /// Name the pack tool reported, if any output was produced
    pub reported_name: Option<String>,
}

/// Outcome of running the packed binary with a version flag.
#[derive(Debug, Clone, Default)]
pub struct SmokeTest {
    /// Tool ran and exited 0
    pub passed: bool,
    /// Captured output, or the error that prevented running it
    pub output: Vec<String>,
}

/// Pick the archive name out of pack tool output.
///
/// Uses the last line ending in `extension` (its last word, so
/// `npm notice filename: cli-1.0.0.tgz` yields `cli-1.0.0.tgz`), falling back
/// to the first non-empty line.
pub fn parse_archive_name(lines: &[String], extension: &str) -> Option<String> {
    let extension = extension.to_ascii_lowercase();
    lines
        .iter()
        .rev()
        .map(|line| line.trim())
        .find(|line| !extension.is_empty() && line.to_ascii_lowercase().ends_with(&extension))
        .and_then(|line| line.split_whitespace().last())
        .or_else(|| lines.iter().map(|l| l.trim()).find(|l| !l.is_empty()))
        .map(String::from)
}

/// Most recently modified file in `dir` matching `pattern`.
///
/// Equal timestamps fall back to the greater file name.
pub async fn find_newest_archive(dir: &Path, pattern: &str) -> Result<Option<ArchiveInfo>> {
    let mut newest = None;
    for (path, metadata) in fs::matching_files(dir, pattern).await? {
        let modified = metadata.modified().map(DateTime::<Local>::from).map_err(|e| {
            Error::Fs {
                context: "reading modification time of",
                path: path.clone(),
                error: e,
            }
        })?;
        let is_newer = match &newest {
            Some(ArchiveInfo {
                modified: best,
                path: best_path,
                ..
            }) => (modified, &path) > (*best, best_path),
            None => true,
        };
        if is_newer {
            newest = Some(ArchiveInfo {
                file_name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                path,
                size: metadata.len(),
                modified,
                reported_name: None,
            });
        }
    }
    Ok(newest)
}

/// Run the pack tool inside the package output directory, placing the
/// archive in the package root, then locate the archive on disk.
pub async fn pack(
    config: &PipelineConfig,
    runner: &ToolRunner<'_>,
    output: &OutputManager,
) -> Result<ArchiveInfo> {
    let archive = &config.archive;
    let destination = if archive.destination_flag.is_empty() {
        vec!["..".to_string()]
    } else {
        vec![archive.destination_flag.clone(), "..".to_string()]
    };
    let command = archive.pack.with_args(destination);

    let reported_name = {
        let _cwd = WorkingDir::enter(&config.package.output_dir_path())?;
        output.progress(&format!("Packing: {}", command));
        let result = runner.run_checked(&command, OutputMode::Capture).await?;
        for line in &result.lines {
            output.verbose(line);
        }
        parse_archive_name(&result.lines, &archive.extension)
    };
    match &reported_name {
        Some(name) => output.indent(&format!("Pack tool reported: {}", name)),
        None => output.warn("Pack tool produced no output"),
    }

    let root = &config.package.root;
    let mut found = find_newest_archive(root, &archive.pattern)
        .await?
        .ok_or_else(|| Error::MissingArchive {
            dir: root.clone(),
            pattern: archive.pattern.clone(),
        })?;

    if reported_name.as_deref().is_some_and(|name| name != found.file_name) {
        log::debug!(
            "Pack output named {:?} but newest archive on disk is {}",
            reported_name,
            found.file_name
        );
    }
    found.reported_name = reported_name;

    output.success(&format!("Archive created: {}", found.path.display()));
    Ok(found)
}

/// Execute the packed binary's version query inside the package root.
///
/// Never fails the pipeline: spawn errors and non-zero exits are reported
/// and recorded in the result.
pub async fn smoke_test(
    config: &PipelineConfig,
    runner: &ToolRunner<'_>,
    output: &OutputManager,
) -> SmokeTest {
    let command = config.smoke_test_command();
    output.progress(&format!("Running: {}", command));

    let outcome = match WorkingDir::enter(&config.package.root) {
        Ok(_cwd) => runner.run(&command, OutputMode::Capture).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => {
            for line in &result.lines {
                output.indent(line);
            }
            if result.success() {
                output.success("Binary responds to version query");
            } else {
                output.warn(&format!(
                    "Version query exited with {}",
                    super::error::exit_code_display(result.code())
                ));
            }
            SmokeTest {
                passed: result.success(),
                output: result.lines,
            }
        }
        Err(e) => {
            output.warn(&format!("Version query failed: {}", e));
            SmokeTest {
                passed: false,
                output: vec![e.to_string()],
            }
        }
    }
}
