//! Pipeline layout and tool commands from `bundle.toml`.
//!
//! Every field has a default, so a workspace following the conventional
//! `packages/core` + `packages/cli` layout needs no config file at all:
//!
//! ```toml
//! strict = false
//!
//! [dependency]
//! root = "packages/core"
//! entry_file = "dist/index.js"
//! codegen = "npm run generate"
//! build = { program = "npm", args = ["run", "build"], timeout_secs = 600 }
//!
//! [package]
//! root = "packages/cli"
//! binary_entry = "dist/bin/cli.js"
//!
//! [archive]
//! pattern = "*.tgz"
//! install_hint = "npm install -g {archive}"
//! ```
//!
//! Relative paths in `root` fields resolve against the workspace directory;
//! all other paths resolve against their package root.

use crate::error::{BundlerError, CliError, Result};
use path_absolutize::Absolutize;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the workspace directory.
pub const CONFIG_FILE_NAME: &str = "bundle.toml";

/// An external tool invocation.
///
/// Deserializes either from a command line string (`"npm run build"`, split on
/// whitespace) or from a table with `program`, `args` and `timeout_secs`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ToolCommandRepr")]
pub struct ToolCommand {
    /// Executable name or path
    pub program: String,
    /// Arguments passed verbatim
    pub args: Vec<String>,
    /// Kill the tool and fail the phase after this many seconds
    pub timeout_secs: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ToolCommandRepr {
    Line(String),
    Full {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
}

impl TryFrom<ToolCommandRepr> for ToolCommand {
    type Error = String;

    fn try_from(repr: ToolCommandRepr) -> std::result::Result<Self, Self::Error> {
        let command = match repr {
            ToolCommandRepr::Line(line) => {
                let mut parts = line.split_whitespace().map(String::from);
                let program = parts.next().unwrap_or_default();
                ToolCommand {
                    program,
                    args: parts.collect(),
                    timeout_secs: None,
                }
            }
            ToolCommandRepr::Full {
                program,
                args,
                timeout_secs,
            } => ToolCommand {
                program,
                args,
                timeout_secs,
            },
        };

        if command.program.trim().is_empty() {
            return Err("tool command must name a program".to_string());
        }
        Ok(command)
    }
}

impl ToolCommand {
    /// Creates a command without a timeout.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout_secs: None,
        }
    }

    /// Returns a copy with extra trailing arguments.
    pub fn with_args<I, S>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut command = self.clone();
        command.args.extend(extra.into_iter().map(Into::into));
        command
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Prerequisite library package.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DependencyConfig {
    /// Package root
    pub root: PathBuf,
    /// Output directory, relative to `root`
    pub output_dir: PathBuf,
    /// File whose presence proves the build succeeded, relative to `root`
    pub entry_file: PathBuf,
    /// Code generation step
    pub codegen: ToolCommand,
    /// Bundler build step
    pub build: ToolCommand,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("packages/core"),
            output_dir: PathBuf::from("dist"),
            entry_file: PathBuf::from("dist/index.js"),
            codegen: ToolCommand::new("npm", ["run", "generate"]),
            build: ToolCommand::new("npm", ["run", "build"]),
        }
    }
}

impl DependencyConfig {
    /// Absolute output directory.
    pub fn output_dir_path(&self) -> PathBuf {
        self.root.join(&self.output_dir)
    }

    /// Absolute entry file.
    pub fn entry_path(&self) -> PathBuf {
        self.root.join(&self.entry_file)
    }
}

/// The package being archived.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageConfig {
    /// Package root; archives are deposited here
    pub root: PathBuf,
    /// Output directory, relative to `root`
    pub output_dir: PathBuf,
    /// Executable entry point, relative to `root`
    pub binary_entry: PathBuf,
    /// Generated manifest, relative to `root`
    pub manifest: PathBuf,
    /// Cleanup script, output discarded
    pub cleanup: ToolCommand,
    /// Bundler build step
    pub build: ToolCommand,
    /// File-copy script, output discarded
    pub copy_files: ToolCommand,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("packages/cli"),
            output_dir: PathBuf::from("dist"),
            binary_entry: PathBuf::from("dist/bin/cli.js"),
            manifest: PathBuf::from("dist/package.json"),
            cleanup: ToolCommand::new("npm", ["run", "clean"]),
            build: ToolCommand::new("npm", ["run", "build"]),
            copy_files: ToolCommand::new("npm", ["run", "copy-files"]),
        }
    }
}

impl PackageConfig {
    /// Absolute output directory.
    pub fn output_dir_path(&self) -> PathBuf {
        self.root.join(&self.output_dir)
    }

    /// Absolute binary entry point.
    pub fn binary_entry_path(&self) -> PathBuf {
        self.root.join(&self.binary_entry)
    }

    /// Absolute manifest path.
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(&self.manifest)
    }
}

/// Packing, discovery and smoke testing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Pack tool, run inside the package output directory
    pub pack: ToolCommand,
    /// Flag preceding the destination directory argument
    pub destination_flag: String,
    /// Extension that identifies the archive line in pack output
    pub extension: String,
    /// Glob matched against file names in the package root
    pub pattern: String,
    /// Version query against the built binary, run inside the package root.
    /// Defaults to `node <binary_entry> --version`.
    pub smoke_test: Option<ToolCommand>,
    /// Install instructions; `{archive}` is replaced by the archive path
    pub install_hint: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            pack: ToolCommand::new("npm", ["pack"]),
            destination_flag: "--pack-destination".to_string(),
            extension: ".tgz".to_string(),
            pattern: "*.tgz".to_string(),
            smoke_test: None,
            install_hint: "npm install -g {archive}".to_string(),
        }
    }
}

impl ArchiveConfig {
    /// Install hint for a concrete archive.
    pub fn install_hint_for(&self, archive: &Path) -> String {
        self.install_hint
            .replace("{archive}", &archive.display().to_string())
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Abort on any non-zero tool exit instead of relying on artifact checks
    pub strict: bool,
    /// Prerequisite library
    pub dependency: DependencyConfig,
    /// Package being archived
    pub package: PackageConfig,
    /// Packing and verification
    pub archive: ArchiveConfig,
}

impl PipelineConfig {
    /// Load configuration for a workspace.
    ///
    /// Reads `config_path` when given (it must exist), otherwise
    /// `<workspace>/bundle.toml` if present, otherwise the defaults.
    /// Package roots are resolved to absolute paths.
    pub fn load(workspace: &Path, config_path: Option<&Path>) -> Result<Self> {
        let workspace = absolutize(workspace)?;

        let config = match config_path {
            Some(path) => {
                let path = absolutize(path)?;
                if !path.is_file() {
                    return Err(BundlerError::Cli(CliError::InvalidArguments {
                        reason: format!("Config file not found: {}", path.display()),
                    }));
                }
                Self::read(&path)?
            }
            None => {
                let path = workspace.join(CONFIG_FILE_NAME);
                if path.is_file() {
                    Self::read(&path)?
                } else {
                    log::debug!(
                        "No {} in {}, using default layout",
                        CONFIG_FILE_NAME,
                        workspace.display()
                    );
                    Self::default()
                }
            }
        };

        config.resolve(&workspace)
    }

    /// Parse configuration text without resolving paths.
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        toml::from_str(text).map_err(|source| BundlerError::Config {
            path: origin.to_path_buf(),
            source,
        })
    }

    fn read(path: &Path) -> Result<Self> {
        log::info!("Loading pipeline config from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|e| {
            BundlerError::Cli(CliError::ExecutionFailed {
                command: "read_bundle_toml".to_string(),
                reason: format!("Failed to read {}: {}", path.display(), e),
            })
        })?;
        Self::parse(&text, path)
    }

    /// Version query command; follows `package.binary_entry` unless overridden.
    pub fn smoke_test_command(&self) -> ToolCommand {
        match &self.archive.smoke_test {
            Some(command) => command.clone(),
            None => ToolCommand::new(
                "node",
                [
                    self.package.binary_entry.display().to_string(),
                    "--version".to_string(),
                ],
            ),
        }
    }

    /// Make both package roots absolute relative to `workspace`.
    pub fn resolve(mut self, workspace: &Path) -> Result<Self> {
        self.dependency.root = absolutize(&workspace.join(&self.dependency.root))?;
        self.package.root = absolutize(&workspace.join(&self.package.root))?;
        Ok(self)
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    Ok(path.absolutize()?.into_owned())
}
