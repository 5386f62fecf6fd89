//! Configuration loaded from `pawn-parser.yaml`.
//!
//! ```yaml
//! compiler:
//!   path: /opt/pawn/bin
//!   options: ["-d3", "-O1"]
//! workspace-support: true
//! workspaces:
//!   - root: /home/me/gamemode
//!     main-file: gamemode.pwn
//! ```
//!
//! Every field is optional. A missing file yields [`ParserConfig::default`].

use crate::context::ContextSettings;
use crate::error::{Error, Result};
use crate::oracle::{
    DEFAULT_COMPILER_OPTIONS, INSTALL_HINT, OracleError, PawnccOracle, default_executable,
};
use crate::workspace::WorkspaceDescriptor;
use pawn_records::DEFAULT_OUTPUT_LIMIT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "pawn-parser.yaml";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ParserConfig {
    /// Compiler location and options.
    #[serde(default)]
    pub compiler: CompilerSettings,

    /// Route files through workspace contexts. When off, every file is its
    /// own context.
    #[serde(default = "default_true")]
    pub workspace_support: bool,

    /// Cap on report output buffered per invocation, in bytes.
    #[serde(default = "default_output_limit")]
    pub max_output_bytes: usize,

    /// Workspaces to register at startup.
    #[serde(default)]
    pub workspaces: Vec<WorkspaceDescriptor>,
}

/// Compiler section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct CompilerSettings {
    /// Directory containing the compiler. Empty means "search `PATH`".
    #[serde(default)]
    pub path: PathBuf,

    /// Executable name inside `path`.
    #[serde(default = "default_executable_name")]
    pub executable: String,

    /// Options passed before the report flag. Empty means
    /// [`DEFAULT_COMPILER_OPTIONS`].
    #[serde(default)]
    pub options: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn default_output_limit() -> usize {
    DEFAULT_OUTPUT_LIMIT
}

fn default_executable_name() -> String {
    default_executable().to_string()
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            executable: default_executable_name(),
            options: Vec::new(),
        }
    }
}

impl CompilerSettings {
    /// Options actually passed to the compiler.
    #[must_use]
    pub fn effective_options(&self) -> Vec<String> {
        if self.options.is_empty() {
            DEFAULT_COMPILER_OPTIONS.iter().map(ToString::to_string).collect()
        } else {
            self.options.clone()
        }
    }

    /// Full path of the compiler executable.
    #[must_use]
    pub fn executable_path(&self) -> PathBuf {
        self.path.join(&self.executable)
    }

    /// Oracle that runs this compiler.
    #[must_use]
    pub fn oracle(&self) -> PawnccOracle {
        PawnccOracle::new(&self.path, &self.executable)
    }

    /// Checks that the configured compiler path points at an executable.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if `path` cannot be inspected,
    /// [`Error::Config`] if it is not a directory, or
    /// [`OracleError::NotFound`] if the executable is missing.
    pub async fn validate(&self) -> Result<PathBuf> {
        if !self.path.as_os_str().is_empty() && !fs::metadata(&self.path).await?.is_dir() {
            return Err(Error::Config(format!(
                "compiler path '{}' is not a directory",
                self.path.display()
            )));
        }

        let executable = self.executable_path();
        match fs::metadata(&executable).await {
            Ok(meta) if meta.is_file() => Ok(executable),
            _ => {
                let command = executable.display().to_string();
                Err(OracleError::not_found(&command, INSTALL_HINT).into())
            }
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            compiler: CompilerSettings::default(),
            workspace_support: true,
            max_output_bytes: DEFAULT_OUTPUT_LIMIT,
            workspaces: Vec::new(),
        }
    }
}

impl ParserConfig {
    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or
    /// [`Error::Config`] if it is not valid configuration YAML.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration from `path`, or defaults if the file does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), except for a missing file.
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path).await {
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No configuration file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Settings for contexts created with the global compiler options.
    #[must_use]
    pub fn context_settings(&self) -> ContextSettings {
        ContextSettings {
            options: self.compiler.effective_options(),
            output_limit: self.max_output_bytes,
        }
    }
}
