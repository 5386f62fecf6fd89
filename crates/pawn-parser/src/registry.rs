//! Registry of parser contexts.
//!
//! Every file maps to a *context key*. For a file that belongs to a
//! workspace (the workspace's main file, or a file the main file includes)
//! the key is the workspace root. For any other file the key is the file
//! itself. [`ParserRegistry::resolve`] computes the key;
//! [`ParserRegistry::get_or_create_context`] turns it into a context.
//!
//! # Locking
//!
//! The tables live behind one `tokio::sync::RwLock`. It is never held
//! across an await on a context: lookups copy what they need and release
//! the lock before waiting for a workspace to finish parsing.

use crate::config::ParserConfig;
use crate::context::{CompletionListener, ContextSettings, ParserContext};
use crate::oracle::CompilerOracle;
use crate::workspace::WorkspaceDescriptor;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Default)]
struct Tables {
    /// Every context by key, in registration order.
    contexts: IndexMap<PathBuf, Arc<ParserContext>>,
    /// Registered workspaces by root. Every key here is also in `contexts`.
    workspaces: IndexMap<PathBuf, WorkspaceDescriptor>,
    /// Set once the initial workspace contexts exist.
    workspace_initialized: bool,
}

struct Shared {
    oracle: Arc<dyn CompilerOracle>,
    settings: ContextSettings,
    workspace_support: bool,
    tables: RwLock<Tables>,
}

/// Maps files to parser contexts.
///
/// Cheap to clone; clones share the same tables.
#[derive(Clone)]
pub struct ParserRegistry {
    shared: Arc<Shared>,
}

/// Garbage-collects standalone contexts whenever a workspace finishes.
struct CollectOnCompletion {
    shared: Weak<Shared>,
}

#[async_trait]
impl CompletionListener for CollectOnCompletion {
    async fn workspace_parsed(&self, root: &Path) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        debug!(workspace = %root.display(), "Workspace parsed, collecting standalone contexts");
        ParserRegistry { shared }.garbage_collect().await;
    }
}

impl ParserRegistry {
    /// Creates an empty registry.
    ///
    /// Workspaces listed in `config` are not registered until
    /// [`init`](Self::init) is called.
    #[must_use]
    pub fn new(oracle: Arc<dyn CompilerOracle>, config: &ParserConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                oracle,
                settings: config.context_settings(),
                workspace_support: config.workspace_support,
                tables: RwLock::new(Tables::default()),
            }),
        }
    }

    /// Registers the initial workspaces and starts parsing them.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn init(&self, workspaces: &[WorkspaceDescriptor]) {
        info!(count = workspaces.len(), "Initializing parser registry");
        self.create_workspace_contexts(workspaces).await;
    }

    /// Drops every context and workspace. Running invocations finish on
    /// their own but their results are no longer reachable.
    pub async fn shutdown(&self) {
        let mut tables = self.shared.tables.write().await;
        debug!(contexts = tables.contexts.len(), "Shutting down parser registry");
        *tables = Tables::default();
    }

    /// Creates a context for each workspace, marks workspace initialization
    /// as done, then starts parsing every workspace.
    ///
    /// The flag is set before any invocation starts, so the collection pass
    /// that follows each workspace parse always runs.
    pub async fn create_workspace_contexts(&self, workspaces: &[WorkspaceDescriptor]) {
        let mut registered = Vec::with_capacity(workspaces.len());
        for descriptor in workspaces {
            registered.push(self.register_workspace(descriptor).await);
        }
        self.shared.tables.write().await.workspace_initialized = true;

        for (context, main_file) in registered {
            context.set_main_file(main_file, true);
        }
    }

    /// Applies a change in the set of open workspace folders.
    ///
    /// Removals happen before additions.
    pub async fn update_workspaces(
        &self,
        removed: &[PathBuf],
        added: &[WorkspaceDescriptor],
    ) {
        {
            let mut tables = self.shared.tables.write().await;
            for root in removed {
                tables.contexts.shift_remove(root);
                if tables.workspaces.shift_remove(root).is_some() {
                    debug!(workspace = %root.display(), "Workspace removed");
                }
            }
        }

        for descriptor in added {
            let (context, main_file) = self.register_workspace(descriptor).await;
            context.set_main_file(main_file, true);
        }
    }

    /// Inserts an idle context for `descriptor` and returns it with the main
    /// file it should parse.
    async fn register_workspace(
        &self,
        descriptor: &WorkspaceDescriptor,
    ) -> (Arc<ParserContext>, String) {
        let settings = ContextSettings {
            options: descriptor
                .options
                .clone()
                .unwrap_or_else(|| self.shared.settings.options.clone()),
            ..self.shared.settings.clone()
        };
        let listener: Arc<dyn CompletionListener> = Arc::new(CollectOnCompletion {
            shared: Arc::downgrade(&self.shared),
        });
        let context = ParserContext::workspace(
            descriptor.root.clone(),
            Arc::clone(&self.shared.oracle),
            settings,
            Some(listener),
        );

        {
            let mut tables = self.shared.tables.write().await;
            tables
                .contexts
                .insert(descriptor.root.clone(), Arc::clone(&context));
            tables
                .workspaces
                .insert(descriptor.root.clone(), descriptor.clone());
        }

        let main_file = descriptor.effective_main_file();
        info!(
            workspace = %descriptor.root.display(),
            main_file = %main_file,
            "Workspace registered"
        );
        (context, main_file)
    }

    /// Computes the context key for `path`.
    ///
    /// 1. If `path` is a workspace's main file (or the workspace root
    ///    itself), that workspace's root.
    /// 2. Otherwise, for each workspace whose root contains `path`, waits
    ///    for the workspace to finish parsing and returns its root if
    ///    `path` is among the included files. Workspaces are checked one at
    ///    a time in registration order; the first match wins.
    /// 3. Otherwise `path` itself.
    ///
    /// With workspace support disabled this always returns `path`.
    pub async fn resolve(&self, path: &Path) -> PathBuf {
        if !self.shared.workspace_support {
            return path.to_path_buf();
        }

        let workspaces = self.workspace_contexts().await;

        if let Some((root, _)) = workspaces
            .iter()
            .find(|(root, context)| is_entry_point(path, root, context))
        {
            return root.clone();
        }

        for (root, context) in &workspaces {
            if !path.starts_with(root) {
                continue;
            }
            context.wait_for_result().await;
            if context.symbols().includes(path) {
                return root.clone();
            }
        }

        path.to_path_buf()
    }

    /// Returns the context that owns `path`, creating a standalone one when
    /// none exists and `auto_create` is set.
    ///
    /// A new standalone context is not started; call
    /// [`ParserContext::run`] on it.
    pub async fn get_or_create_context(
        &self,
        path: &Path,
        auto_create: bool,
    ) -> Option<Arc<ParserContext>> {
        let key = self.resolve(path).await;
        let mut tables = self.shared.tables.write().await;

        if let Some(context) = tables.contexts.get(&key) {
            return Some(Arc::clone(context));
        }
        if !auto_create {
            return None;
        }

        debug!(file = %key.display(), "Creating standalone context");
        let context = ParserContext::standalone(
            key.clone(),
            Arc::clone(&self.shared.oracle),
            self.shared.settings.clone(),
        );
        tables.contexts.insert(key, Arc::clone(&context));
        Some(context)
    }

    /// Removes the context that owns `path`, if any.
    ///
    /// Removing a workspace's context also unregisters the workspace.
    pub async fn remove_context(&self, path: &Path) {
        let key = self.resolve(path).await;
        let mut tables = self.shared.tables.write().await;

        if tables.contexts.shift_remove(&key).is_some() {
            debug!(key = %key.display(), "Context removed");
        }
        tables.workspaces.shift_remove(&key);
    }

    /// Removes standalone contexts whose file now belongs to a workspace.
    ///
    /// Does nothing until workspace initialization has finished, or when
    /// workspace support is disabled.
    pub async fn garbage_collect(&self) {
        let standalone: Vec<PathBuf> = {
            let tables = self.shared.tables.read().await;
            if !self.shared.workspace_support || !tables.workspace_initialized {
                return;
            }
            tables
                .contexts
                .iter()
                .filter(|(_, context)| !context.is_workspace_scoped())
                .map(|(key, _)| key.clone())
                .collect()
        };

        for key in standalone {
            let owner = self.resolve(&key).await;
            if owner == key {
                continue;
            }

            let mut tables = self.shared.tables.write().await;
            let subsumed = tables
                .contexts
                .get(&owner)
                .is_some_and(|context| context.is_workspace_scoped());
            if subsumed && tables.contexts.shift_remove(&key).is_some() {
                debug!(
                    file = %key.display(),
                    workspace = %owner.display(),
                    "Collected standalone context"
                );
            }
        }
    }

    /// Context registered under exactly `key`, without resolving.
    pub async fn context(&self, key: &Path) -> Option<Arc<ParserContext>> {
        self.shared.tables.read().await.contexts.get(key).cloned()
    }

    /// Every context, in registration order.
    pub async fn contexts(&self) -> Vec<Arc<ParserContext>> {
        self.shared
            .tables
            .read()
            .await
            .contexts
            .values()
            .cloned()
            .collect()
    }

    /// Number of registered contexts.
    pub async fn context_count(&self) -> usize {
        self.shared.tables.read().await.contexts.len()
    }

    /// Registered workspaces, in registration order.
    pub async fn workspaces(&self) -> Vec<WorkspaceDescriptor> {
        self.shared
            .tables
            .read()
            .await
            .workspaces
            .values()
            .cloned()
            .collect()
    }

    /// Returns `true` once the initial workspace contexts exist.
    pub async fn is_workspace_initialized(&self) -> bool {
        self.shared.tables.read().await.workspace_initialized
    }

    /// Returns `true` when files are routed through workspaces.
    #[must_use]
    pub fn workspace_support(&self) -> bool {
        self.shared.workspace_support
    }

    async fn workspace_contexts(&self) -> Vec<(PathBuf, Arc<ParserContext>)> {
        let tables = self.shared.tables.read().await;
        tables
            .workspaces
            .keys()
            .filter_map(|root| {
                tables
                    .contexts
                    .get(root)
                    .map(|context| (root.clone(), Arc::clone(context)))
            })
            .collect()
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("oracle", &self.shared.oracle.describe())
            .field("workspace_support", &self.shared.workspace_support)
            .finish_non_exhaustive()
    }
}

/// Returns `true` if `path` is the workspace root itself or the workspace's
/// main file.
fn is_entry_point(path: &Path, root: &Path, context: &ParserContext) -> bool {
    if path == root {
        return true;
    }
    let Some(main_file) = context.main_file() else {
        return false;
    };
    let in_root = path.parent() == Some(root) && path.file_name() == Some(OsStr::new(&main_file));
    in_root || path == root.join(&main_file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::ReplayOracle;

    fn registry(oracle: &ReplayOracle) -> ParserRegistry {
        ParserRegistry::new(Arc::new(oracle.clone()), &ParserConfig::default())
    }

    #[test]
    fn entry_point_matches_root_and_main_file() {
        let context = ParserContext::workspace(
            PathBuf::from("/w"),
            Arc::new(ReplayOracle::new()),
            ContextSettings::default(),
            None,
        );
        context.set_main_file("main.pwn", false);

        assert!(is_entry_point(Path::new("/w"), Path::new("/w"), &context));
        assert!(is_entry_point(Path::new("/w/main.pwn"), Path::new("/w"), &context));
        assert!(!is_entry_point(Path::new("/w/other.pwn"), Path::new("/w"), &context));
        assert!(!is_entry_point(Path::new("/w/sub/main.pwn"), Path::new("/w"), &context));
    }

    #[test]
    fn entry_point_accepts_nested_main_file() {
        let context = ParserContext::workspace(
            PathBuf::from("/w"),
            Arc::new(ReplayOracle::new()),
            ContextSettings::default(),
            None,
        );
        context.set_main_file("src/main.pwn", false);

        assert!(is_entry_point(Path::new("/w/src/main.pwn"), Path::new("/w"), &context));
    }

    #[tokio::test]
    async fn unknown_file_resolves_to_itself() {
        let registry = registry(&ReplayOracle::new());

        let key = registry.resolve(Path::new("/x/a.pwn")).await;

        assert_eq!(key, PathBuf::from("/x/a.pwn"));
    }

    #[tokio::test]
    async fn get_without_auto_create_returns_none() {
        let registry = registry(&ReplayOracle::new());

        assert!(registry.get_or_create_context(Path::new("/x/a.pwn"), false).await.is_none());
        assert_eq!(registry.context_count().await, 0);
    }

    #[tokio::test]
    async fn auto_created_context_is_reused() {
        let oracle = ReplayOracle::new();
        let registry = registry(&oracle);

        let first = registry.get_or_create_context(Path::new("/x/a.pwn"), true).await.unwrap();
        let second = registry.get_or_create_context(Path::new("/x/a.pwn"), true).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!first.is_workspace_scoped());
        assert_eq!(oracle.invocation_count(), 0);
    }

    #[tokio::test]
    async fn remove_context_forgets_standalone() {
        let registry = registry(&ReplayOracle::new());
        registry.get_or_create_context(Path::new("/x/a.pwn"), true).await;

        registry.remove_context(Path::new("/x/a.pwn")).await;

        assert_eq!(registry.context_count().await, 0);
    }

    #[tokio::test]
    async fn shutdown_clears_everything() {
        let registry = registry(&ReplayOracle::new());
        registry.init(&[WorkspaceDescriptor::new("/w")]).await;
        registry.get_or_create_context(Path::new("/x/a.pwn"), true).await;

        registry.shutdown().await;

        assert_eq!(registry.context_count().await, 0);
        assert!(registry.workspaces().await.is_empty());
        assert!(!registry.is_workspace_initialized().await);
    }

    #[tokio::test]
    async fn garbage_collect_waits_for_initialization() {
        let oracle = ReplayOracle::new();
        let registry = registry(&oracle);
        registry.get_or_create_context(Path::new("/x/a.pwn"), true).await;

        registry.garbage_collect().await;

        assert_eq!(registry.context_count().await, 1);
    }
}
