//! Top-level error types for bundler operations.
//!
//! Pipeline phases report through [`crate::pipeline::Error`]; this module wraps
//! those together with CLI and configuration failures.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for bundler operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for all bundler operations
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed bundle.toml
    #[error("Invalid configuration in {}: {source}", path.display())]
    Config {
        /// Config file that failed to parse
        path: PathBuf,
        /// Parser error
        #[source]
        source: toml::de::Error,
    },

    /// Pipeline phase errors
    #[error("{0}")]
    Pipeline(#[from] crate::pipeline::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl BundlerError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            BundlerError::Pipeline(crate::pipeline::Error::MissingArtifact { .. }) => vec![
                "Check the highlighted tool output above for build errors".to_string(),
                "Re-run with --clean to rebuild from scratch".to_string(),
            ],
            BundlerError::Pipeline(crate::pipeline::Error::MissingArchive { .. }) => {
                vec!["Check the pack tool output above; the archive was not written".to_string()]
            }
            BundlerError::Pipeline(crate::pipeline::Error::Manifest { .. }) => vec![
                "Ensure the package build copies a valid package.json into the output directory"
                    .to_string(),
            ],
            BundlerError::Config { .. } => {
                vec!["Fix bundle.toml or remove it to use the default layout".to_string()]
            }
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
