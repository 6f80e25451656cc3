//! End-to-end tests: run the binary against a scratch workspace whose build
//! tools are small `sh` scripts declared in bundle.toml.
#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

const MANIFEST: &str = r#"{
  "name": "cli",
  "version": "1.4.0",
  "bin": { "cli": "bin/cli.js" },
  "scripts": { "build": "tsc -p .", "test": "vitest" },
  "devDependencies": { "typescript": "5.4.0" },
  "dependencies": { "core": "file:../core" }
}
"#;

/// Shell snippets standing in for npm scripts.
struct Tools {
    codegen: String,
    dependency_build: String,
    cleanup: String,
    package_build: String,
    copy_files: String,
    pack: String,
    smoke_test: String,
}

impl Default for Tools {
    fn default() -> Self {
        Self {
            codegen: "mkdir -p src && echo generated > src/gen.ts".into(),
            dependency_build: "mkdir -p dist && echo module.exports = 1 > dist/index.js".into(),
            cleanup: "echo cleaning; echo error: hidden because discarded".into(),
            package_build: "test -f ../core/dist/index.js || { echo error: core not built >&2; exit 1; }; \
                 mkdir -p dist/bin && echo echo 1.4.0 > dist/bin/cli.js; \
                 echo warning: error budget exceeded"
                .into(),
            copy_files: "cp package.json dist/package.json".into(),
            pack: "echo packed > \"$2/cli-1.4.0.tgz\" && echo npm notice filename: cli-1.4.0.tgz"
                .into(),
            smoke_test: "sh dist/bin/cli.js --version".into(),
        }
    }
}

fn sh(script: &str) -> String {
    format!("{{ program = \"sh\", args = [\"-c\", {}] }}", toml_string(script))
}

fn toml_string(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

impl Tools {
    fn render(&self) -> String {
        format!(
            r#"
[dependency]
root = "core"
codegen = {codegen}
build = {dependency_build}

[package]
root = "cli"
cleanup = {cleanup}
build = {package_build}
copy_files = {copy_files}

[archive]
pack = {{ program = "sh", args = ["-c", {pack}, "pack"] }}
smoke_test = {smoke_test}
"#,
            codegen = sh(&self.codegen),
            dependency_build = sh(&self.dependency_build),
            cleanup = sh(&self.cleanup),
            package_build = sh(&self.package_build),
            copy_files = sh(&self.copy_files),
            pack = toml_string(&self.pack),
            smoke_test = sh(&self.smoke_test),
        )
    }
}

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(tools: &Tools) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("core")).unwrap();
        fs::create_dir_all(dir.path().join("cli")).unwrap();
        fs::write(dir.path().join("cli/package.json"), MANIFEST).unwrap();
        fs::write(dir.path().join("bundle.toml"), tools.render()).unwrap();
        Self { dir }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("kodegen_bundler_pack").unwrap();
        cmd.arg("--workspace").arg(self.dir.path()).env("NO_COLOR", "1");
        cmd
    }

    fn manifest(&self) -> Value {
        serde_json::from_str(&fs::read_to_string(self.path("cli/dist/package.json")).unwrap())
            .unwrap()
    }
}

fn stale_archive(path: &Path, age: Duration) {
    let file = File::create(path).unwrap();
    file.set_modified(SystemTime::now() - age).unwrap();
}

#[test]
fn happy_path_builds_packs_and_verifies() {
    let ws = Workspace::new(&Tools::default());
    let archive = ws.path("cli/cli-1.4.0.tgz");

    ws.cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("[1/5] Building dependency library"))
        .stdout(predicate::str::contains("[5/5] Verifying packed binary"))
        .stdout(predicate::str::contains("1.4.0"))
        .stdout(predicate::str::contains("Build complete"))
        .stdout(predicate::str::contains("Dependency: rebuilt"))
        .stdout(predicate::str::contains(
            "Manifest: cleared 2 script(s), removed devDependencies",
        ))
        .stdout(predicate::str::contains(format!("Archive: {}", archive.display())))
        .stdout(predicate::str::contains(format!("npm install -g {}", archive.display())))
        // discarded and warning lines are not surfaced
        .stdout(predicate::str::contains("hidden because discarded").not())
        .stdout(predicate::str::contains("error budget").not());

    assert!(ws.path("core/src/gen.ts").is_file());
    assert!(archive.is_file());

    let manifest = ws.manifest();
    assert_eq!(manifest["scripts"], json!({}));
    assert!(manifest.get("devDependencies").is_none());
    assert_eq!(manifest["dependencies"], json!({ "core": "file:../core" }));
    assert_eq!(manifest["version"], json!("1.4.0"));
}

#[test]
fn missing_binary_entry_is_fatal() {
    let ws = Workspace::new(&Tools {
        package_build: "mkdir -p dist && echo built without entry".into(),
        ..Tools::default()
    });

    ws.cmd()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("expected file not found"))
        .stderr(predicate::str::contains("dist/bin/cli.js"))
        .stdout(predicate::str::contains("[3/5]").not());

    assert!(!ws.path("cli/cli-1.4.0.tgz").exists());
}

#[test]
fn missing_dependency_entry_is_fatal() {
    let ws = Workspace::new(&Tools {
        dependency_build: "echo error TS2307: cannot find module".into(),
        ..Tools::default()
    });

    ws.cmd()
        .assert()
        .code(1)
        .stdout(predicate::str::contains("error TS2307"))
        .stderr(predicate::str::contains("dist/index.js"))
        .stdout(predicate::str::contains("[2/5]").not());
}

#[test]
fn skip_without_prior_build_fails_downstream() {
    let ws = Workspace::new(&Tools::default());

    ws.cmd()
        .arg("--skip-dependency-build")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Skipped (--skip-dependency-build)"))
        .stdout(predicate::str::contains("error: core not built"))
        .stderr(predicate::str::contains("No previous dependency build"))
        .stderr(predicate::str::contains("dist/bin/cli.js"));

    assert!(!ws.path("core/src/gen.ts").exists());
}

#[test]
fn skip_reuses_previous_dependency_build() {
    let ws = Workspace::new(&Tools::default());
    ws.cmd().assert().success();

    fs::remove_file(ws.path("core/src/gen.ts")).unwrap();
    ws.cmd()
        .arg("--skip-dependency-build")
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped"))
        .stdout(predicate::str::contains("Dependency: reused previous build"));

    assert!(!ws.path("core/src/gen.ts").exists());
}

#[test]
fn clean_removes_stale_outputs_and_is_repeatable() {
    let ws = Workspace::new(&Tools::default());
    fs::create_dir_all(ws.path("core/dist")).unwrap();
    fs::write(ws.path("core/dist/stale.js"), "old").unwrap();
    stale_archive(&ws.path("cli/cli-0.9.0.tgz"), Duration::from_secs(600));

    ws.cmd()
        .arg("--clean")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaning previous outputs"))
        .stdout(predicate::str::contains("cli-0.9.0.tgz"));

    assert!(!ws.path("cli/cli-0.9.0.tgz").exists());
    assert!(!ws.path("core/dist/stale.js").exists());

    ws.cmd().arg("--clean").assert().success();
    assert!(ws.path("cli/cli-1.4.0.tgz").is_file());
}

#[test]
fn newest_archive_is_reported_not_alphabetical_first() {
    let ws = Workspace::new(&Tools::default());
    stale_archive(&ws.path("cli/cli-0.1.0.tgz"), Duration::from_secs(7200));
    stale_archive(&ws.path("cli/cli-9.0.0.tgz"), Duration::from_secs(3600));

    ws.cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Archive: {}",
            ws.path("cli/cli-1.4.0.tgz").display()
        )));
}

#[test]
fn failing_tool_only_aborts_in_strict_mode() {
    let tools = Tools {
        codegen: "echo codegen crashed >&2; exit 7".into(),
        ..Tools::default()
    };

    Workspace::new(&tools)
        .cmd()
        .assert()
        .success()
        .stderr(predicate::str::contains("exited with exit code 7"));

    Workspace::new(&tools)
        .cmd()
        .arg("--strict")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("exited with exit code 7"))
        .stdout(predicate::str::contains("[2/5]").not());
}

#[test]
fn malformed_manifest_is_reported() {
    let ws = Workspace::new(&Tools {
        copy_files: "echo { broken > dist/package.json".into(),
        ..Tools::default()
    });

    ws.cmd()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot prepare manifest"))
        .stderr(predicate::str::contains("invalid JSON"));
}

#[test]
fn missing_archive_is_fatal() {
    let ws = Workspace::new(&Tools {
        pack: "echo nothing written".into(),
        ..Tools::default()
    });

    ws.cmd()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no archive matching '*.tgz'"));
}

#[test]
fn failing_smoke_test_does_not_fail_the_build() {
    let ws = Workspace::new(&Tools {
        smoke_test: "echo boom; exit 2".into(),
        ..Tools::default()
    });

    ws.cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("boom"))
        .stderr(predicate::str::contains("Version query exited with exit code 2"));
}

#[test]
fn missing_workspace_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("kodegen_bundler_pack")
        .unwrap()
        .arg("--workspace")
        .arg(dir.path().join("nope"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Workspace is not a directory"));
}

#[test]
fn malformed_config_exits_with_one() {
    let ws = Workspace::new(&Tools::default());
    fs::write(ws.path("bundle.toml"), "[package\nroot = 1").unwrap();

    ws.cmd()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid configuration"));
}
