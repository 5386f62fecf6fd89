//! Compiler oracle abstraction.
//!
//! A parser context never talks to `pawncc` directly. It asks a
//! [`CompilerOracle`] to start an [`Invocation`] and gets back an
//! [`OracleProcess`]: two byte streams and a future that resolves when the
//! process exits. [`PawnccOracle`] runs the real compiler; [`ReplayOracle`]
//! replays recorded report output.

pub mod error;
mod pawncc;
mod replay;

pub use error::{OracleError, Result};
pub(crate) use pawncc::INSTALL_HINT;
pub use pawncc::{PawnccOracle, default_executable};
pub use replay::{ReplayGate, ReplayOracle};

use futures::future::BoxFuture;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncRead;

/// Flag that switches the compiler into report mode.
pub const REPORT_FLAG: &str = "-R";

/// Options passed to the compiler when none are configured.
pub const DEFAULT_COMPILER_OPTIONS: [&str; 2] = ["-d0", "-O3"];

/// A byte stream produced by a running invocation.
pub type OracleStream = Box<dyn AsyncRead + Send + Unpin>;

/// One compiler run: which file, from where, with which flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// File handed to the compiler.
    pub target: PathBuf,
    /// Working directory of the process.
    pub working_dir: PathBuf,
    /// Flags passed after the target, report flag last.
    pub flags: Vec<String>,
}

impl Invocation {
    /// Builds an invocation for `target` that runs from the target's parent
    /// directory, with `options` followed by [`REPORT_FLAG`].
    #[must_use]
    pub fn new(target: PathBuf, options: &[String]) -> Self {
        let working_dir = target
            .parent()
            .map_or_else(|| target.clone(), Path::to_path_buf);
        let flags = options
            .iter()
            .cloned()
            .chain(std::iter::once(REPORT_FLAG.to_string()))
            .collect();

        Self {
            target,
            working_dir,
            flags,
        }
    }

    /// Full argument list: the target followed by the flags.
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        std::iter::once(self.target.display().to_string())
            .chain(self.flags.iter().cloned())
            .collect()
    }
}

/// Handle to a started invocation.
pub struct OracleProcess {
    /// Human-readable diagnostics (stderr).
    pub diagnostics: OracleStream,
    /// Report records, one JSON object per line (stdout).
    pub output: OracleStream,
    /// Resolves with the exit code once the process is gone. `None` when
    /// the code is unknown (killed by a signal, wait failed).
    pub exit: BoxFuture<'static, Option<i32>>,
}

impl fmt::Debug for OracleProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleProcess").finish_non_exhaustive()
    }
}

/// Starts compiler invocations.
///
/// Implementations must not block: `spawn` hands back streams immediately
/// and the caller drives them.
///
/// # Example
///
/// ```rust
/// use pawn_parser::oracle::{CompilerOracle, Invocation, OracleError, OracleProcess};
///
/// struct Offline;
///
/// impl CompilerOracle for Offline {
///     fn spawn(&self, _invocation: &Invocation) -> Result<OracleProcess, OracleError> {
///         Err(OracleError::Unavailable("offline".to_string()))
///     }
///
///     fn describe(&self) -> String {
///         "offline".to_string()
///     }
/// }
/// ```
pub trait CompilerOracle: Send + Sync {
    /// Starts `invocation`.
    ///
    /// # Errors
    ///
    /// Returns an [`OracleError`] if the process could not be started.
    fn spawn(&self, invocation: &Invocation) -> Result<OracleProcess>;

    /// Short description used in logs.
    fn describe(&self) -> String;
}
