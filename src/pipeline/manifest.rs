//! Package manifest preparation.
//!
//! The generated `package.json` carries build-time fields that must not ship
//! in the archive: `scripts` is emptied and `devDependencies` is dropped.
//! Every other field passes through unchanged and in its original order.

use super::{Error, ErrorExt, Result};
use crate::cli::OutputManager;
use serde_json::{Map, Value};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// What [`strip_build_fields`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManifestChanges {
    /// Number of scripts that were present before clearing
    pub scripts_cleared: usize,
    /// Whether a `devDependencies` field was removed
    pub dev_dependencies_removed: bool,
}

/// Set `scripts` to an empty object and remove `devDependencies`.
pub fn strip_build_fields(manifest: &mut Map<String, Value>) -> ManifestChanges {
    let scripts_cleared = manifest
        .get("scripts")
        .and_then(Value::as_object)
        .map_or(0, Map::len);
    manifest.insert("scripts".to_string(), Value::Object(Map::new()));

    let dev_dependencies_removed = manifest.shift_remove("devDependencies").is_some();

    ManifestChanges {
        scripts_cleared,
        dev_dependencies_removed,
    }
}

/// Load, strip and rewrite the manifest at `path`.
///
/// The new content is written to a sibling temporary file and renamed over
/// the original, so readers never observe a partial manifest.
pub async fn prepare(path: &Path, output: &OutputManager) -> Result<ManifestChanges> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| manifest_error(path, read_reason(&e)))?;

    let mut value: Value = serde_json::from_str(&text)
        .map_err(|e| manifest_error(path, format!("invalid JSON: {}", e)))?;
    let manifest = value
        .as_object_mut()
        .ok_or_else(|| manifest_error(path, "top level is not a JSON object".to_string()))?;

    let changes = strip_build_fields(manifest);

    let mut serialized = serde_json::to_string_pretty(&value)
        .map_err(|e| manifest_error(path, format!("cannot serialize: {}", e)))?;
    serialized.push('\n');
    write_replacing(path, serialized.as_bytes()).await?;

    output.indent(&format!("Cleared scripts ({} removed)", changes.scripts_cleared));
    if changes.dev_dependencies_removed {
        output.indent("Removed devDependencies");
    } else {
        output.verbose("No devDependencies present");
    }
    output.success(&format!("Manifest prepared: {}", path.display()));
    Ok(changes)
}

fn manifest_error(path: &Path, reason: String) -> Error {
    Error::Manifest {
        path: path.to_path_buf(),
        reason,
    }
}

fn read_reason(error: &io::Error) -> String {
    match error.kind() {
        io::ErrorKind::NotFound => "file not found".to_string(),
        _ => format!("cannot read: {}", error),
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

async fn write_replacing(path: &Path, contents: &[u8]) -> Result<()> {
    let temp = temp_sibling(path);
    let replaced = match tokio::fs::write(&temp, contents).await {
        Ok(()) => tokio::fs::rename(&temp, path)
            .await
            .fs_context("replacing manifest", path),
        Err(e) => Err(e).fs_context("writing manifest", &temp),
    };

    // A failed write or rename may leave a partial temp file behind.
    if replaced.is_err()
        && let Err(e) = tokio::fs::remove_file(&temp).await
        && e.kind() != io::ErrorKind::NotFound
    {
        log::warn!("Failed to remove {}: {}", temp.display(), e);
    }
    replaced
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn strips_scripts_and_dev_dependencies_only() {
        let mut manifest = object(json!({
            "name": "cli",
            "scripts": { "build": "tsc -p ." },
            "devDependencies": { "x": "1.0" },
            "dependencies": { "y": "2.0" },
            "bin": { "cli": "bin/cli.js" }
        }));

        let changes = strip_build_fields(&mut manifest);

        assert_eq!(
            changes,
            ManifestChanges {
                scripts_cleared: 1,
                dev_dependencies_removed: true
            }
        );
        assert_eq!(manifest["scripts"], json!({}));
        assert!(!manifest.contains_key("devDependencies"));
        assert_eq!(manifest["dependencies"], json!({ "y": "2.0" }));
        let keys: Vec<_> = manifest.keys().map(String::as_str).collect();
        assert_eq!(keys, ["name", "scripts", "dependencies", "bin"]);
    }

    #[test]
    fn adds_empty_scripts_when_absent() {
        let mut manifest = object(json!({ "name": "cli" }));
        let changes = strip_build_fields(&mut manifest);
        assert_eq!(changes, ManifestChanges::default());
        assert_eq!(manifest["scripts"], json!({}));
    }

    #[tokio::test]
    async fn prepare_rewrites_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(
            &path,
            r#"{"name":"cli","version":"1.2.3","scripts":{"build":"x"},"devDependencies":{"x":"1.0"},"dependencies":{"y":"2.0"},"publishConfig":{"access":{"level":"public"}}}"#,
        )
        .unwrap();

        prepare(&path, &OutputManager::new(false, true)).await.unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            written,
            json!({
                "name": "cli",
                "version": "1.2.3",
                "scripts": {},
                "dependencies": { "y": "2.0" },
                "publishConfig": { "access": { "level": "public" } }
            })
        );
        assert!(!temp_sibling(&path).exists());
    }

    #[tokio::test]
    async fn failed_replace_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // a non-empty directory cannot be replaced by a file
        let path = dir.path().join("package.json");
        std::fs::create_dir_all(path.join("blocker")).unwrap();

        let err = write_replacing(&path, b"{}\n").await.unwrap_err();

        assert!(err.to_string().starts_with("replacing manifest"));
        assert!(!temp_sibling(&path).exists());
        assert!(path.join("blocker").is_dir());
    }

    #[tokio::test]
    async fn missing_and_malformed_manifests_are_diagnosed() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputManager::new(false, true);
        let path = dir.path().join("package.json");

        let missing = prepare(&path, &output).await.unwrap_err();
        assert!(matches!(missing, Error::Manifest { ref reason, .. } if reason == "file not found"));

        std::fs::write(&path, "{ not json").unwrap();
        let malformed = prepare(&path, &output).await.unwrap_err();
        assert!(malformed.to_string().contains("invalid JSON"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");

        std::fs::write(&path, "[1, 2]").unwrap();
        let not_object = prepare(&path, &output).await.unwrap_err();
        assert!(not_object.to_string().contains("not a JSON object"));
    }
}
