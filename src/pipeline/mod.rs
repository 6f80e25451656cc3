//! Pipeline orchestration.
//!
//! This module provides the [`Pipeline`] orchestrator that runs the build
//! phases strictly in order:
//!
//! ```text
//! Start → [Clean] → DependencyBuild → PackageBuild → ManifestPrepare → Archive → Verify → Done
//! ```
//!
//! Any fatal condition moves straight to `Failed` and aborts every later
//! phase. There is no retry or resume; rerun (optionally with `--clean`).
//!
//! # Module Organization
//!
//! - [`cleaner`] - removal of previous outputs
//! - [`dependency`] - dependency library build
//! - [`package`] - package build and entry point check
//! - [`manifest`] - build-time field stripping
//! - [`archive`] - packing, archive discovery and smoke test

pub mod archive;
pub mod cleaner;
pub mod dependency;
pub mod error;
mod fs;
pub mod manifest;
pub mod package;

pub use error::{Error, ErrorExt, Result};

use crate::cli::{Args, OutputManager, RuntimeConfig};
use crate::config::PipelineConfig;
use crate::process::ToolRunner;
use archive::{ArchiveInfo, SmokeTest};
use manifest::ManifestChanges;
use std::fmt;
use std::path::PathBuf;

/// Number of numbered steps shown to the operator.
pub const TOTAL_STEPS: usize = 5;

/// Flags fixed at invocation and passed to every phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Reuse the previous dependency build
    pub skip_dependency_build: bool,
    /// Wipe previous outputs first
    pub clean: bool,
    /// Treat non-zero tool exits as fatal
    pub strict: bool,
}

impl BuildOptions {
    /// Combine command line flags with config-file settings.
    pub fn new(args: &Args, config: &PipelineConfig) -> Self {
        Self {
            skip_dependency_build: args.skip_dependency_build,
            clean: args.clean,
            strict: args.strict || config.strict,
        }
    }
}

/// Pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing has run yet
    Start,
    /// Removing previous outputs
    Clean,
    /// Building (or skipping) the dependency library
    DependencyBuild,
    /// Building the package
    PackageBuild,
    /// Stripping the manifest
    ManifestPrepare,
    /// Packing and locating the archive
    Archive,
    /// Smoke-testing the binary
    Verify,
    /// Finished successfully
    Done,
}

impl Phase {
    /// Operator step number, if the phase is a numbered step.
    pub fn step(self) -> Option<usize> {
        match self {
            Phase::DependencyBuild => Some(1),
            Phase::PackageBuild => Some(2),
            Phase::ManifestPrepare => Some(3),
            Phase::Archive => Some(4),
            Phase::Verify => Some(5),
            Phase::Start | Phase::Clean | Phase::Done => None,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Phase::Start => "Starting",
            Phase::Clean => "Cleaning previous outputs",
            Phase::DependencyBuild => "Building dependency library",
            Phase::PackageBuild => "Building package",
            Phase::ManifestPrepare => "Preparing package manifest",
            Phase::Archive => "Creating archive",
            Phase::Verify => "Verifying packed binary",
            Phase::Done => "Done",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    /// Paths removed by the cleaner
    pub cleaned: Vec<PathBuf>,
    /// Whether the dependency was rebuilt in this run
    pub dependency_built: bool,
    /// Package binary entry point
    pub binary_entry: PathBuf,
    /// Package output directory
    pub output_dir: PathBuf,
    /// Manifest edits
    pub manifest_changes: ManifestChanges,
    /// Discovered archive
    pub archive: ArchiveInfo,
    /// Version query outcome
    pub smoke_test: SmokeTest,
    /// Copy-paste install command
    pub install_hint: String,
}

impl PipelineSummary {
    /// Print the final summary. Shown even in quiet mode.
    pub fn print(&self, output: &OutputManager) {
        output.result("");
        output.result("Build complete");
        output.result(&format!("  Output directory: {}", self.output_dir.display()));
        for line in self.details() {
            output.info(&line);
        }
        output.result(&format!("  Archive: {}", self.archive.path.display()));
        output.result(&format!(
            "  Archive file: {} ({} bytes, modified {})",
            self.archive.file_name,
            self.archive.size,
            self.archive.modified.format("%Y-%m-%d %H:%M:%S")
        ));
        if !self.smoke_test.passed {
            output.warn("Version query did not succeed; check the output above");
        }
        output.result("");
        output.result("Install with:");
        output.result(&format!("  {}", self.install_hint));
    }

    /// Per-phase detail lines, hidden in quiet mode.
    pub fn details(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if !self.cleaned.is_empty() {
            lines.push(format!("  Cleaned: {} path(s)", self.cleaned.len()));
        }
        lines.push(if self.dependency_built {
            "  Dependency: rebuilt".to_string()
        } else {
            "  Dependency: reused previous build".to_string()
        });
        lines.push(format!("  Binary entry: {}", self.binary_entry.display()));

        let changes = &self.manifest_changes;
        let mut manifest = format!("  Manifest: cleared {} script(s)", changes.scripts_cleared);
        if changes.dev_dependencies_removed {
            manifest.push_str(", removed devDependencies");
        }
        lines.push(manifest);
        lines
    }
}

/// Main pipeline orchestrator.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    options: BuildOptions,
}

impl Pipeline {
    /// Create a pipeline from resolved configuration and invocation flags.
    pub fn new(config: PipelineConfig, options: BuildOptions) -> Self {
        Self { config, options }
    }

    /// Run every phase in order, stopping at the first fatal condition.
    pub async fn run(&self, runtime_config: &RuntimeConfig) -> Result<PipelineSummary> {
        let mut phase = Phase::Start;
        let result = self.run_phases(runtime_config, &mut phase).await;
        match &result {
            Ok(_) => log::info!("Pipeline finished"),
            Err(e) => log::error!("Pipeline failed during '{}': {}", phase, e),
        }
        result
    }

    async fn run_phases(
        &self,
        runtime_config: &RuntimeConfig,
        phase: &mut Phase,
    ) -> Result<PipelineSummary> {
        let output = runtime_config.output();
        let runner = ToolRunner::new(output, self.options.strict);
        let config = &self.config;

        let cleaned = if self.options.clean {
            self.enter(phase, Phase::Clean, output);
            cleaner::clean(config, output).await?
        } else {
            Vec::new()
        };

        self.enter(phase, Phase::DependencyBuild, output);
        let dependency_built =
            dependency::build(&config.dependency, self.options, &runner, output).await?;

        self.enter(phase, Phase::PackageBuild, output);
        let binary_entry = package::build(&config.package, &runner, output).await?;

        self.enter(phase, Phase::ManifestPrepare, output);
        let manifest_changes = manifest::prepare(&config.package.manifest_path(), output).await?;

        self.enter(phase, Phase::Archive, output);
        let archive = archive::pack(config, &runner, output).await?;

        self.enter(phase, Phase::Verify, output);
        let smoke_test = archive::smoke_test(config, &runner, output).await;

        *phase = Phase::Done;
        Ok(PipelineSummary {
            cleaned,
            dependency_built,
            binary_entry,
            output_dir: config.package.output_dir_path(),
            manifest_changes,
            install_hint: config.archive.install_hint_for(&archive.path),
            archive,
            smoke_test,
        })
    }

    fn enter(&self, phase: &mut Phase, next: Phase, output: &OutputManager) {
        log::info!("Phase: {:?} -> {:?}", phase, next);
        *phase = next;
        match next.step() {
            Some(step) => output.step(step, TOTAL_STEPS, next.title()),
            None => output.section(next.title()),
        }
    }
}
