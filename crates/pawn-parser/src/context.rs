//! Parser contexts.
//!
//! A [`ParserContext`] owns the latest compiler answers for one root path:
//! a workspace folder or a single standalone file. It runs at most one
//! compiler invocation at a time and publishes the results atomically.
//!
//! # Lifecycle
//!
//! ```text
//! Idle --run()--> InProgress --process exits--> Idle (results published,
//!                                                     waiters woken)
//! ```
//!
//! `run()` while in progress is dropped, not queued. Waiters registered
//! with [`ParserContext::wait_for_result`] are woken in registration order
//! once the invocation finishes, whether or not it succeeded.

use crate::demux::{Demultiplexed, demultiplex};
use crate::oracle::{
    CompilerOracle, DEFAULT_COMPILER_OPTIONS, Invocation, OracleProcess, OracleStream,
};
use crate::sink::{DiagnosticLog, SymbolTable};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pawn_records::{DEFAULT_OUTPUT_LIMIT, LineBuffer};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::io::AsyncReadExt;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

const DIAGNOSTIC_CHUNK_SIZE: usize = 4096;

/// Notified when a workspace context publishes new results.
#[async_trait]
pub trait CompletionListener: Send + Sync {
    /// Called after the workspace rooted at `root` finished an invocation
    /// and published its results.
    async fn workspace_parsed(&self, root: &Path);
}

/// How a context invokes the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSettings {
    /// Compiler options, placed before the report flag.
    pub options: Vec<String>,
    /// Cap on buffered report output per invocation.
    pub output_limit: usize,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            options: DEFAULT_COMPILER_OPTIONS.iter().map(ToString::to_string).collect(),
            output_limit: DEFAULT_OUTPUT_LIMIT,
        }
    }
}

/// Point-in-time view of a context, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextStatus {
    /// Context key.
    pub root_path: PathBuf,
    /// Whether this is a workspace context.
    pub workspace_scoped: bool,
    /// Main file relative to the root, for workspace contexts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_file: Option<String>,
    /// Whether an invocation is running.
    pub in_progress: bool,
    /// Invocations that finished and published results.
    pub completed_runs: u64,
    /// When results were last published.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_completed: Option<DateTime<Utc>>,
    /// Number of symbols currently published.
    pub symbols: usize,
    /// Number of diagnostics currently published.
    pub diagnostics: usize,
}

struct ContextState {
    /// Empty when no main file is known.
    main_file: String,
    /// Invocations currently running; never more than one.
    progress: usize,
    waiters: VecDeque<oneshot::Sender<()>>,
    symbols: Arc<SymbolTable>,
    diagnostics: Arc<DiagnosticLog>,
    completed_runs: u64,
    last_completed: Option<DateTime<Utc>>,
}

/// Compiler answers for one root path.
///
/// Contexts are shared behind `Arc`: the registry holds one, and each
/// running invocation holds another until it finishes.
pub struct ParserContext {
    root_path: PathBuf,
    workspace_scoped: bool,
    settings: ContextSettings,
    oracle: Arc<dyn CompilerOracle>,
    listener: Option<Arc<dyn CompletionListener>>,
    state: Mutex<ContextState>,
}

impl ParserContext {
    /// Context for a single file outside any workspace.
    #[must_use]
    pub fn standalone(
        file: PathBuf,
        oracle: Arc<dyn CompilerOracle>,
        settings: ContextSettings,
    ) -> Arc<Self> {
        Arc::new(Self::with_scope(file, false, oracle, settings, None))
    }

    /// Context for a workspace folder. It stays idle until a main file is
    /// set with [`set_main_file`](Self::set_main_file).
    ///
    /// `listener` is told whenever this context publishes results.
    #[must_use]
    pub fn workspace(
        root: PathBuf,
        oracle: Arc<dyn CompilerOracle>,
        settings: ContextSettings,
        listener: Option<Arc<dyn CompletionListener>>,
    ) -> Arc<Self> {
        Arc::new(Self::with_scope(root, true, oracle, settings, listener))
    }

    fn with_scope(
        root_path: PathBuf,
        workspace_scoped: bool,
        oracle: Arc<dyn CompilerOracle>,
        settings: ContextSettings,
        listener: Option<Arc<dyn CompletionListener>>,
    ) -> Self {
        Self {
            root_path,
            workspace_scoped,
            settings,
            oracle,
            listener,
            state: Mutex::new(ContextState {
                main_file: String::new(),
                progress: 0,
                waiters: VecDeque::new(),
                symbols: Arc::new(SymbolTable::default()),
                diagnostics: Arc::new(DiagnosticLog::default()),
                completed_runs: 0,
                last_completed: None,
            }),
        }
    }

    /// Context key: the workspace folder or the standalone file.
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Returns `true` for workspace contexts.
    #[must_use]
    pub fn is_workspace_scoped(&self) -> bool {
        self.workspace_scoped
    }

    /// Main file relative to the root, if one is set.
    #[must_use]
    pub fn main_file(&self) -> Option<String> {
        let state = self.lock_state();
        (!state.main_file.is_empty()).then(|| state.main_file.clone())
    }

    /// Returns `true` while an invocation is running.
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.lock_state().progress > 0
    }

    /// Latest published symbol table.
    #[must_use]
    pub fn symbols(&self) -> Arc<SymbolTable> {
        Arc::clone(&self.lock_state().symbols)
    }

    /// Latest published diagnostics.
    #[must_use]
    pub fn diagnostics(&self) -> Arc<DiagnosticLog> {
        Arc::clone(&self.lock_state().diagnostics)
    }

    /// Snapshot for reporting.
    #[must_use]
    pub fn status(&self) -> ContextStatus {
        let state = self.lock_state();
        ContextStatus {
            root_path: self.root_path.clone(),
            workspace_scoped: self.workspace_scoped,
            main_file: (!state.main_file.is_empty()).then(|| state.main_file.clone()),
            in_progress: state.progress > 0,
            completed_runs: state.completed_runs,
            last_completed: state.last_completed,
            symbols: state.symbols.len(),
            diagnostics: state.diagnostics.len(),
        }
    }

    /// File handed to the compiler, or `None` for a workspace without a
    /// main file.
    fn target_file(&self, state: &ContextState) -> Option<PathBuf> {
        if !self.workspace_scoped {
            return Some(self.root_path.clone());
        }
        (!state.main_file.is_empty()).then(|| self.root_path.join(&state.main_file))
    }

    /// Sets the main file of a workspace context. No effect on standalone
    /// contexts.
    ///
    /// With `reparse`, the symbol table is cleared right away and a new
    /// invocation is started.
    ///
    /// # Panics
    ///
    /// Panics if `reparse` is set and this is called outside a Tokio
    /// runtime.
    pub fn set_main_file(self: &Arc<Self>, main_file: impl Into<String>, reparse: bool) {
        if !self.workspace_scoped {
            return;
        }

        {
            let mut state = self.lock_state();
            state.main_file = main_file.into();
            if reparse {
                state.symbols = Arc::new(SymbolTable::default());
            }
            debug!(
                root = %self.root_path.display(),
                main_file = %state.main_file,
                reparse,
                "Main file set"
            );
        }

        if reparse {
            self.run();
        }
    }

    /// Starts a compiler invocation in the background.
    ///
    /// Does nothing if one is already running, or if this is a workspace
    /// context without a main file.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn run(self: &Arc<Self>) {
        let invocation = {
            let mut state = self.lock_state();
            if state.progress > 0 {
                debug!(root = %self.root_path.display(), "Invocation already running, request dropped");
                return;
            }
            let Some(target) = self.target_file(&state) else {
                debug!(root = %self.root_path.display(), "No main file, nothing to compile");
                return;
            };
            state.progress += 1;
            Invocation::new(target, &self.settings.options)
        };

        let context = Arc::clone(self);
        tokio::spawn(async move { context.execute(invocation).await });
    }

    /// Resolves once no invocation is running.
    ///
    /// Returns immediately when idle; never starts an invocation itself.
    pub async fn wait_for_result(&self) {
        let receiver = {
            let mut state = self.lock_state();
            if state.progress == 0 {
                return;
            }
            let (sender, receiver) = oneshot::channel();
            state.waiters.push_back(sender);
            receiver
        };

        // The sender is only dropped without sending if the context is gone.
        let _ = receiver.await;
    }

    async fn execute(self: Arc<Self>, invocation: Invocation) {
        debug!(
            root = %self.root_path.display(),
            oracle = %self.oracle.describe(),
            target_file = %invocation.target.display(),
            "Starting invocation"
        );

        let process = match self.oracle.spawn(&invocation) {
            Ok(process) => process,
            Err(e) => {
                warn!(root = %self.root_path.display(), error = %e, "Failed to start compiler");
                self.finish(None);
                return;
            }
        };

        let result = self.collect(process).await;
        self.finish(Some(result));

        if self.workspace_scoped
            && let Some(listener) = &self.listener
        {
            listener.workspace_parsed(&self.root_path).await;
        }
    }

    async fn collect(&self, process: OracleProcess) -> Demultiplexed {
        let OracleProcess {
            mut diagnostics,
            mut output,
            exit,
        } = process;
        let mut buffer = LineBuffer::with_limit(self.settings.output_limit);

        let ((), read) = tokio::join!(
            self.log_diagnostics(&mut diagnostics),
            buffer.fill_from(&mut output)
        );
        if let Err(e) = read {
            warn!(root = %self.root_path.display(), error = %e, "Failed to read compiler output");
        }

        let exit_code = exit.await;
        debug!(
            root = %self.root_path.display(),
            exit_code = ?exit_code,
            bytes = buffer.len(),
            truncated = buffer.is_truncated(),
            "Compiler exited"
        );

        demultiplex(&buffer.text())
    }

    async fn log_diagnostics(&self, stream: &mut OracleStream) {
        let mut chunk = vec![0u8; DIAGNOSTIC_CHUNK_SIZE];
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) => return,
                Ok(read) => {
                    let text = String::from_utf8_lossy(&chunk[..read]);
                    info!(root = %self.root_path.display(), "{}", text.trim_end());
                }
                Err(e) => {
                    warn!(root = %self.root_path.display(), error = %e, "Failed to read compiler diagnostics");
                    return;
                }
            }
        }
    }

    /// Publishes `result` when present, then wakes every waiter in
    /// registration order. Every invocation ends here exactly once.
    fn finish(&self, result: Option<Demultiplexed>) {
        let waiters = {
            let mut state = self.lock_state();
            if let Some(result) = result {
                for diagnostic in result.diagnostics.entries() {
                    debug!(
                        root = %self.root_path.display(),
                        file = ?diagnostic.file,
                        line = ?diagnostic.line,
                        severity = ?diagnostic.severity,
                        "{}",
                        diagnostic.message
                    );
                }
                state.symbols = Arc::new(result.symbols);
                state.diagnostics = Arc::new(result.diagnostics);
                state.completed_runs += 1;
                state.last_completed = Some(Utc::now());
            }
            state.progress = state.progress.saturating_sub(1);
            std::mem::take(&mut state.waiters)
        };

        for waiter in waiters {
            // A waiter that gave up has dropped its receiver.
            let _ = waiter.send(());
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ContextState> {
        self.state.lock().expect("parser context lock poisoned")
    }
}

impl fmt::Debug for ParserContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserContext")
            .field("root_path", &self.root_path)
            .field("workspace_scoped", &self.workspace_scoped)
            .field("oracle", &self.oracle.describe())
            .finish_non_exhaustive()
    }
}
