//! Build-and-pack pipeline for distributable npm package archives
//!
//! The pipeline runs five ordered phases:
//! - Cleaner (optional) removes previous outputs and stale archives
//! - Dependency builder runs code generation and the bundler build of a library package
//! - Package builder rebuilds the CLI package and verifies its binary entry point
//! - Manifest preparer strips build-time fields from the generated manifest
//! - Archiver packs the archive, locates it on disk and smoke-tests the binary
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod process;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{BundlerError, CliError, Result};
pub use pipeline::{BuildOptions, Pipeline, PipelineSummary};
