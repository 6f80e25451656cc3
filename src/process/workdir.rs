//! Scoped working-directory change.

use crate::pipeline::{ErrorExt, Result};
use std::path::{Path, PathBuf};

/// RAII guard that enters a directory and restores the previous one on drop.
///
/// Restoration runs on every exit path: normal return, `?` propagation and
/// panic unwinding. The working directory is process-wide, so guards must be
/// dropped in reverse order of creation.
#[derive(Debug)]
#[must_use = "the previous directory is restored as soon as the guard is dropped"]
pub struct WorkingDir {
    previous: PathBuf,
    current: PathBuf,
}

impl WorkingDir {
    /// Change into `path`, remembering the current directory.
    pub fn enter(path: &Path) -> Result<Self> {
        let previous = std::env::current_dir().fs_context("reading current directory", ".")?;
        std::env::set_current_dir(path).fs_context("entering directory", path)?;
        log::debug!("Entered {} (from {})", path.display(), previous.display());
        Ok(Self {
            previous,
            current: path.to_path_buf(),
        })
    }

    /// Directory the guard changed into.
    pub fn path(&self) -> &Path {
        &self.current
    }
}

impl Drop for WorkingDir {
    fn drop(&mut self) {
        match std::env::set_current_dir(&self.previous) {
            Ok(()) => log::debug!("Restored working directory {}", self.previous.display()),
            Err(e) => log::warn!(
                "Failed to restore working directory {}: {}",
                self.previous.display(),
                e
            ),
        }
    }
}
