//! Oracle that replays recorded report output.
//!
//! Useful for inspecting a saved report without a compiler installed, and
//! for driving parser contexts deterministically.

use super::error::{OracleError, Result};
use super::{CompilerOracle, Invocation, OracleProcess};
use futures::FutureExt;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::trace;

#[derive(Debug, Clone, Default)]
struct Recording {
    output: String,
    diagnostics: String,
}

#[derive(Debug, Default)]
struct ReplayState {
    recordings: HashMap<PathBuf, Recording>,
    fallback: Option<Recording>,
    invocations: Vec<Invocation>,
    gate: Option<watch::Receiver<bool>>,
    refusal: Option<String>,
}

/// Replays recorded compiler output instead of running a compiler.
///
/// Each spawned invocation gets the recording registered for its target,
/// or the fallback recording, or empty output. Every invocation is
/// remembered and can be inspected with [`invocations`](Self::invocations).
///
/// Clones share state.
///
/// # Examples
///
/// ```
/// use pawn_parser::oracle::{CompilerOracle, Invocation, ReplayOracle};
/// use std::path::PathBuf;
///
/// let oracle = ReplayOracle::new();
/// oracle.record("/proj/main.pwn", "{\"kind\":\"tags\",\"payload\":[]}\n");
///
/// let invocation = Invocation::new(PathBuf::from("/proj/main.pwn"), &[]);
/// assert!(oracle.spawn(&invocation).is_ok());
/// assert_eq!(oracle.invocations(), vec![invocation]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReplayOracle {
    state: Arc<Mutex<ReplayState>>,
}

impl ReplayOracle {
    /// Creates an oracle with no recordings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an oracle that answers every invocation with the report
    /// stored in `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read.
    pub async fn from_report_file(path: &Path) -> std::io::Result<Self> {
        let output = tokio::fs::read_to_string(path).await?;
        let oracle = Self::new();
        oracle.set_fallback(output);
        Ok(oracle)
    }

    /// Registers the report output for invocations targeting `target`.
    pub fn record(&self, target: impl Into<PathBuf>, output: impl Into<String>) {
        self.record_with_diagnostics(target, output, String::new());
    }

    /// Registers both report output and diagnostic text for `target`.
    pub fn record_with_diagnostics(
        &self,
        target: impl Into<PathBuf>,
        output: impl Into<String>,
        diagnostics: impl Into<String>,
    ) {
        self.lock().recordings.insert(
            target.into(),
            Recording {
                output: output.into(),
                diagnostics: diagnostics.into(),
            },
        );
    }

    /// Report output for targets without their own recording.
    pub fn set_fallback(&self, output: impl Into<String>) {
        self.lock().fallback = Some(Recording {
            output: output.into(),
            diagnostics: String::new(),
        });
    }

    /// Makes every later spawn fail with [`OracleError::Unavailable`].
    pub fn refuse(&self, reason: impl Into<String>) {
        self.lock().refusal = Some(reason.into());
    }

    /// Undoes [`refuse`](Self::refuse).
    pub fn accept(&self) {
        self.lock().refusal = None;
    }

    /// Holds the exit of every invocation spawned from now on until the
    /// returned gate is opened or dropped.
    ///
    /// Output is still delivered immediately; only completion waits.
    #[must_use]
    pub fn hold(&self) -> ReplayGate {
        let (sender, receiver) = watch::channel(false);
        self.lock().gate = Some(receiver);
        ReplayGate { sender }
    }

    /// Invocations spawned so far, in order. Refused spawns are included.
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.lock().invocations.clone()
    }

    /// Number of invocations spawned so far.
    #[must_use]
    pub fn invocation_count(&self) -> usize {
        self.lock().invocations.len()
    }

    fn lock(&self) -> MutexGuard<'_, ReplayState> {
        self.state.lock().expect("replay oracle lock poisoned")
    }
}

impl CompilerOracle for ReplayOracle {
    fn spawn(&self, invocation: &Invocation) -> Result<OracleProcess> {
        let (recording, gate) = {
            let mut state = self.lock();
            state.invocations.push(invocation.clone());

            if let Some(reason) = &state.refusal {
                return Err(OracleError::Unavailable(reason.clone()));
            }

            let recording = state
                .recordings
                .get(&invocation.target)
                .or(state.fallback.as_ref())
                .cloned()
                .unwrap_or_default();
            (recording, state.gate.clone())
        };

        trace!(
            target_file = %invocation.target.display(),
            bytes = recording.output.len(),
            held = gate.is_some(),
            "Replaying recorded output"
        );

        let exit = async move {
            if let Some(mut gate) = gate {
                let opened = gate.wait_for(|open| *open).await.is_ok();
                trace!(opened, "Replay gate released");
            }
            Some(0)
        }
        .boxed();

        Ok(OracleProcess {
            diagnostics: Box::new(Cursor::new(recording.diagnostics.into_bytes())),
            output: Box::new(Cursor::new(recording.output.into_bytes())),
            exit,
        })
    }

    fn describe(&self) -> String {
        "replay".to_string()
    }
}

/// Releases invocations held by [`ReplayOracle::hold`].
///
/// Dropping the gate releases them as well.
#[derive(Debug)]
pub struct ReplayGate {
    sender: watch::Sender<bool>,
}

impl ReplayGate {
    /// Lets every held invocation complete.
    pub fn open(self) {
        // No receivers left means nothing was held.
        let _ = self.sender.send(true);
    }
}
