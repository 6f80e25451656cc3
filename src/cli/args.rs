//! Command line argument parsing and validation.
//!
//! This module provides CLI argument parsing using clap and the runtime
//! configuration derived from it.

use clap::Parser;
use std::path::PathBuf;

/// Build-and-pack pipeline for npm package archives
#[derive(Parser, Debug, Clone)]
#[command(
    name = "kodegen_bundler_pack",
    version,
    about = "Build a dependency library and CLI package, then pack a distributable archive",
    long_about = "Builds the dependency library, rebuilds the CLI package, strips build-time fields
from the generated package.json, packs the archive and smoke-tests the packed binary.

Layout and tool commands come from bundle.toml in the workspace (all fields optional).

Usage:
  kodegen_bundler_pack
  kodegen_bundler_pack --clean
  kodegen_bundler_pack --skip-dependency-build --workspace ../my-cli

Exit code 0 = archive exists in the package root."
)]
pub struct Args {
    /// Reuse the previous dependency build instead of rebuilding it
    #[arg(long)]
    pub skip_dependency_build: bool,

    /// Remove previous output directories and archives before building
    #[arg(long)]
    pub clean: bool,

    /// Abort when any build tool exits non-zero
    ///
    /// Without this flag a failing tool is reported and the artifact check
    /// that follows decides whether the pipeline continues.
    #[arg(long)]
    pub strict: bool,

    /// Workspace directory containing bundle.toml and the package roots
    #[arg(short = 'w', long, value_name = "DIR", default_value = ".")]
    pub workspace: PathBuf,

    /// Config file (default: <workspace>/bundle.toml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show extra detail
    #[arg(short, long)]
    pub verbose: bool,

    /// Only show errors, highlighted tool output and the final result
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if !self.workspace.is_dir() {
            return Err(format!(
                "Workspace is not a directory: {}",
                self.workspace.display()
            ));
        }
        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        let output = super::OutputManager::new(args.verbose, args.quiet);
        Self { output }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }
}
