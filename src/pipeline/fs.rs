//! File system helpers shared by the phases.
//!
//! Removal is idempotent: a path that does not exist counts as removed.

use super::error::{ErrorExt, Result};
use std::{
    fs::Metadata,
    io,
    path::{Path, PathBuf},
};
use tokio::fs;

/// Removes a directory tree. Returns `true` if something was deleted.
pub async fn remove_dir_all(path: &Path) -> Result<bool> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).fs_context("removing directory", path),
    }
}

/// Removes a single file. Returns `true` if something was deleted.
pub async fn remove_file(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).fs_context("removing file", path),
    }
}

/// Whether `path` exists and is a regular file.
pub async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

/// Regular files directly inside `dir` whose name matches `pattern`.
///
/// A missing directory yields no matches.
pub async fn matching_files(dir: &Path, pattern: &str) -> Result<Vec<(PathBuf, Metadata)>> {
    let pattern = glob::Pattern::new(pattern)?;

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).fs_context("reading directory", dir),
    };

    let mut matches = Vec::new();
    while let Some(entry) = entries.next_entry().await.fs_context("reading directory", dir)? {
        let path = entry.path();
        let name_matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| pattern.matches(name));
        if !name_matches {
            continue;
        }

        let metadata = fs::metadata(&path).await.fs_context("reading metadata", &path)?;
        if metadata.is_file() {
            matches.push((path, metadata));
        }
    }

    matches.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(matches)
}
