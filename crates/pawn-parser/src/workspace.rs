//! Workspace descriptors and main-file discovery.

use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Extensions tried, in order, when looking for a workspace's main file.
const MAIN_FILE_EXTENSIONS: [&str; 3] = ["pwn", "p", "inc"];

/// Base name tried after the workspace directory's own name.
const FALLBACK_MAIN_NAME: &str = "main";

/// A workspace folder registered with the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct WorkspaceDescriptor {
    /// Absolute path of the workspace folder; also its context key.
    pub root: PathBuf,

    /// Display name of the workspace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Main file name relative to `root`. Discovered when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_file: Option<String>,

    /// Compiler options for this workspace, replacing the global ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl WorkspaceDescriptor {
    /// Descriptor for `root` with everything else left to defaults.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            name: None,
            main_file: None,
            options: None,
        }
    }

    /// Sets an explicit main file.
    #[must_use]
    pub fn with_main_file(mut self, main_file: impl Into<String>) -> Self {
        self.main_file = Some(main_file.into());
        self
    }

    /// Sets workspace-specific compiler options.
    #[must_use]
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }

    /// Main file to use: the configured one, or whatever
    /// [`default_main_file`] finds. Empty when there is none.
    #[must_use]
    pub fn effective_main_file(&self) -> String {
        match &self.main_file {
            Some(main_file) if !main_file.is_empty() => main_file.clone(),
            _ => default_main_file(&self.root),
        }
    }
}

/// Finds the main file of the workspace at `root`.
///
/// Tries `<dir name>.pwn`, `<dir name>.p`, `<dir name>.inc`, then the same
/// extensions with `main`, and returns the first name that exists as a file
/// directly in `root`. Returns an empty string when nothing matches.
///
/// # Examples
///
/// ```
/// use pawn_parser::default_main_file;
/// use std::path::Path;
///
/// assert_eq!(default_main_file(Path::new("/nonexistent/gamemode")), "");
/// ```
#[must_use]
pub fn default_main_file(root: &Path) -> String {
    let dir_name = root.file_name().and_then(OsStr::to_str);

    dir_name
        .into_iter()
        .chain(std::iter::once(FALLBACK_MAIN_NAME))
        .flat_map(|name| {
            MAIN_FILE_EXTENSIONS
                .iter()
                .map(move |extension| format!("{name}.{extension}"))
        })
        .find(|candidate| root.join(candidate).is_file())
        .unwrap_or_default()
}
