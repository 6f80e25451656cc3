//! Error types raised by pipeline phases.

use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Result type alias for pipeline phases
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that halt the pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// An expected output file is absent after a build step.
    #[error("{phase}: expected file not found: {}", path.display())]
    MissingArtifact {
        /// Phase that should have produced the file
        phase: &'static str,
        /// Missing file
        path: PathBuf,
    },

    /// No archive matched the naming pattern after packing.
    #[error("no archive matching '{pattern}' found in {}", dir.display())]
    MissingArchive {
        /// Directory that was searched
        dir: PathBuf,
        /// Glob pattern used
        pattern: String,
    },

    /// The package manifest is missing, unreadable or malformed.
    #[error("cannot prepare manifest {}: {reason}", path.display())]
    Manifest {
        /// Manifest path
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// A tool could not be spawned or waited on.
    #[error("failed to run `{command}`: {error}")]
    CommandFailed {
        /// Command line
        command: String,
        /// Underlying IO error
        #[source]
        error: io::Error,
    },

    /// A tool exited non-zero while strict mode is on.
    #[error("`{command}` exited with {}", exit_code_display(*code))]
    ToolFailed {
        /// Command line
        command: String,
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
    },

    /// A tool exceeded its configured timeout and was killed.
    #[error("`{command}` timed out after {secs}s")]
    Timeout {
        /// Command line
        command: String,
        /// Configured timeout
        secs: u64,
    },

    /// Filesystem operation failed.
    #[error("{context} {}: {error}", path.display())]
    Fs {
        /// Operation being performed
        context: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying IO error
        #[source]
        error: io::Error,
    },

    /// Invalid glob pattern.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

pub(crate) fn exit_code_display(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// Attaches an operation and path to IO errors.
pub trait ErrorExt<T> {
    /// Wrap the error as [`Error::Fs`].
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}
