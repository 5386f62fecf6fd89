//! Oracle backed by a real `pawncc` executable.

use super::error::{OracleError, Result};
use super::{CompilerOracle, Invocation, OracleProcess};
use futures::FutureExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

pub(crate) const INSTALL_HINT: &str = "Install the Pawn compiler and point compiler.path in pawn-parser.yaml at the directory containing it.";

/// Executable name used when none is configured.
#[must_use]
pub fn default_executable() -> &'static str {
    if cfg!(windows) { "pawncc.exe" } else { "pawncc" }
}

/// Runs the Pawn compiler as a child process.
///
/// The child is killed if its handle is dropped before it exits, so an
/// abandoned invocation never outlives the runtime.
#[derive(Debug, Clone)]
pub struct PawnccOracle {
    executable: PathBuf,
}

impl PawnccOracle {
    /// Oracle for `executable` inside `compiler_dir`.
    ///
    /// An empty `compiler_dir` leaves the executable to be found on `PATH`.
    #[must_use]
    pub fn new(compiler_dir: &Path, executable: &str) -> Self {
        Self {
            executable: compiler_dir.join(executable),
        }
    }

    /// Path of the executable this oracle starts.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

impl CompilerOracle for PawnccOracle {
    fn spawn(&self, invocation: &Invocation) -> Result<OracleProcess> {
        let command = self.executable.display().to_string();
        let args = invocation.args();

        debug!(
            command = %command,
            args = ?args,
            working_dir = %invocation.working_dir.display(),
            "Spawning compiler"
        );

        let mut child = Command::new(&self.executable)
            .args(&args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    OracleError::not_found(&command, INSTALL_HINT)
                } else {
                    OracleError::spawn_failed(&command, e)
                }
            })?;

        let output = child
            .stdout
            .take()
            .ok_or(OracleError::MissingStream { stream: "stdout" })?;
        let diagnostics = child
            .stderr
            .take()
            .ok_or(OracleError::MissingStream { stream: "stderr" })?;

        let exit = async move {
            match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    warn!(error = %e, "Failed to wait for compiler process");
                    None
                }
            }
        }
        .boxed();

        Ok(OracleProcess {
            diagnostics: Box::new(diagnostics),
            output: Box::new(output),
            exit,
        })
    }

    fn describe(&self) -> String {
        self.executable.display().to_string()
    }
}
