//! Routing files to the contexts that own them.
//!
//! # Test Categories
//!
//! ## Entry Points
//! - Workspace roots and main files resolve without waiting
//!
//! ## Included Files
//! - Files a workspace includes resolve to the workspace once it has parsed
//! - Everything else is its own key
//!
//! ## Workspace Management
//! - Main-file discovery, per-workspace options, adding and removing
//!   workspaces, disabling workspace support

mod common;

use common::{functions, included_files, registry, registry_with, touch, within};
use pawn_parser::oracle::ReplayOracle;
use pawn_parser::{ParserConfig, SymbolKind, WorkspaceDescriptor};
use rstest::rstest;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn proj_oracle() -> ReplayOracle {
    let oracle = ReplayOracle::new();
    oracle.record(
        "/proj/main.pwn",
        included_files(&["/proj/util.inc"]) + &functions(&["Foo"]),
    );
    oracle
}

fn proj() -> WorkspaceDescriptor {
    WorkspaceDescriptor::new("/proj").with_main_file("main.pwn")
}

mod entry_points {
    use super::*;

    #[rstest]
    #[case::root("/proj")]
    #[case::main_file("/proj/main.pwn")]
    #[tokio::test]
    async fn resolves_without_waiting(#[case] path: &str) {
        let oracle = proj_oracle();
        let gate = oracle.hold();
        let registry = registry(&oracle);
        registry.init(&[proj()]).await;

        let key = within(registry.resolve(Path::new(path))).await;

        assert_eq!(key, PathBuf::from("/proj"));
        let context = registry.context(Path::new("/proj")).await.unwrap();
        assert!(context.is_in_progress(), "resolution must not wait for the parse");
        gate.open();
    }

    #[tokio::test]
    async fn file_outside_every_workspace_resolves_without_waiting() {
        let oracle = proj_oracle();
        let gate = oracle.hold();
        let registry = registry(&oracle);
        registry.init(&[proj()]).await;

        let key = within(registry.resolve(Path::new("/elsewhere/a.pwn"))).await;

        assert_eq!(key, PathBuf::from("/elsewhere/a.pwn"));
        drop(gate);
    }
}

mod includes {
    use super::*;

    #[tokio::test]
    async fn included_file_resolves_to_workspace() {
        let oracle = proj_oracle();
        let registry = registry(&oracle);
        registry.init(&[proj()]).await;

        let key = within(registry.resolve(Path::new("/proj/util.inc"))).await;

        assert_eq!(key, PathBuf::from("/proj"));
        let context = registry.context(Path::new("/proj")).await.unwrap();
        let symbols = context.symbols();
        let names: Vec<&str> = symbols
            .symbols(SymbolKind::Function)
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Foo"]);
    }

    #[tokio::test]
    async fn resolution_waits_for_running_parse() {
        let oracle = proj_oracle();
        let gate = oracle.hold();
        let registry = registry(&oracle);
        registry.init(&[proj()]).await;

        let pending = tokio::spawn({
            let registry = registry.clone();
            async move { registry.resolve(Path::new("/proj/util.inc")).await }
        });
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        gate.open();

        assert_eq!(within(pending).await.unwrap(), PathBuf::from("/proj"));
    }

    #[tokio::test]
    async fn file_in_root_but_not_included_is_its_own_key() {
        let registry = registry(&proj_oracle());
        registry.init(&[proj()]).await;

        let key = within(registry.resolve(Path::new("/proj/scratch.pwn"))).await;

        assert_eq!(key, PathBuf::from("/proj/scratch.pwn"));
    }

    #[tokio::test]
    async fn included_file_gets_the_workspace_context() {
        let registry = registry(&proj_oracle());
        registry.init(&[proj()]).await;

        let context = within(registry.get_or_create_context(Path::new("/proj/util.inc"), true))
            .await
            .unwrap();

        assert!(context.is_workspace_scoped());
        assert_eq!(context.root_path(), Path::new("/proj"));
        assert_eq!(registry.context_count().await, 1);
    }

    #[rstest]
    #[case::outer_first(&["/a", "/a/b"], "/a")]
    #[case::inner_first(&["/a/b", "/a"], "/a/b")]
    #[tokio::test]
    async fn nested_workspaces_first_registered_match_wins(
        #[case] order: &[&str],
        #[case] expected: &str,
    ) {
        let oracle = ReplayOracle::new();
        oracle.record("/a/main.pwn", included_files(&["/a/b/shared.inc"]));
        oracle.record("/a/b/main.pwn", included_files(&["/a/b/shared.inc"]));
        let registry = registry(&oracle);
        let descriptors: Vec<WorkspaceDescriptor> = order
            .iter()
            .map(|root| WorkspaceDescriptor::new(*root).with_main_file("main.pwn"))
            .collect();
        registry.init(&descriptors).await;

        let key = within(registry.resolve(Path::new("/a/b/shared.inc"))).await;

        assert_eq!(key, PathBuf::from(expected));
    }
}

mod workspace_management {
    use super::*;

    #[tokio::test]
    async fn discovered_main_file_round_trip() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("gm");
        touch(&root, "gm.pwn");
        touch(&root, "include/helpers.inc");
        let main = root.join("gm.pwn");
        let helpers = root.join("include/helpers.inc");

        let oracle = ReplayOracle::new();
        oracle.record(
            &main,
            included_files(&[helpers.to_str().unwrap()]) + &functions(&["OnGameModeInit"]),
        );
        let registry = registry(&oracle);
        registry.init(&[WorkspaceDescriptor::new(&root)]).await;

        let key = within(registry.resolve(&helpers)).await;

        assert_eq!(key, root);
        let context = registry.context(&root).await.unwrap();
        assert_eq!(context.main_file().as_deref(), Some("gm.pwn"));
        assert!(context.symbols().includes(&helpers));
        assert_eq!(oracle.invocations()[0].target, main);
        assert_eq!(oracle.invocations()[0].working_dir, root);
    }

    #[tokio::test]
    async fn workspace_without_main_file_never_runs() {
        let temp = TempDir::new().unwrap();
        let oracle = ReplayOracle::new();
        let registry = registry(&oracle);
        registry.init(&[WorkspaceDescriptor::new(temp.path())]).await;

        let key = within(registry.resolve(&temp.path().join("a.inc"))).await;

        assert_eq!(key, temp.path().join("a.inc"));
        assert_eq!(oracle.invocation_count(), 0);
        assert!(registry.is_workspace_initialized().await);
    }

    #[tokio::test]
    async fn workspace_options_replace_global_options() {
        let oracle = proj_oracle();
        let config = ParserConfig {
            compiler: pawn_parser::CompilerSettings {
                options: vec!["-O1".to_string()],
                ..pawn_parser::CompilerSettings::default()
            },
            ..ParserConfig::default()
        };
        let registry = registry_with(&oracle, &config);
        registry
            .init(&[
                proj(),
                WorkspaceDescriptor::new("/other")
                    .with_main_file("main.pwn")
                    .with_options(vec!["-d3".to_string()]),
            ])
            .await;
        within(registry.resolve(Path::new("/proj/util.inc"))).await;
        within(registry.resolve(Path::new("/other/x.inc"))).await;

        let mut flags: Vec<(PathBuf, Vec<String>)> = oracle
            .invocations()
            .into_iter()
            .map(|invocation| (invocation.target, invocation.flags))
            .collect();
        flags.sort();

        assert_eq!(
            flags,
            vec![
                (PathBuf::from("/other/main.pwn"), vec!["-d3".to_string(), "-R".to_string()]),
                (PathBuf::from("/proj/main.pwn"), vec!["-O1".to_string(), "-R".to_string()]),
            ]
        );
    }

    #[tokio::test]
    async fn removed_workspace_no_longer_owns_files() {
        let registry = registry(&proj_oracle());
        registry.init(&[proj()]).await;
        within(registry.resolve(Path::new("/proj/util.inc"))).await;

        registry
            .update_workspaces(
                &[PathBuf::from("/proj")],
                &[WorkspaceDescriptor::new("/next").with_main_file("main.pwn")],
            )
            .await;

        assert_eq!(
            within(registry.resolve(Path::new("/proj/main.pwn"))).await,
            PathBuf::from("/proj/main.pwn")
        );
        assert_eq!(
            within(registry.resolve(Path::new("/next/main.pwn"))).await,
            PathBuf::from("/next")
        );
        let roots: Vec<PathBuf> = registry
            .workspaces()
            .await
            .into_iter()
            .map(|w| w.root)
            .collect();
        assert_eq!(roots, vec![PathBuf::from("/next")]);
    }

    #[tokio::test]
    async fn removing_workspace_context_unregisters_workspace() {
        let registry = registry(&proj_oracle());
        registry.init(&[proj()]).await;

        registry.remove_context(Path::new("/proj/main.pwn")).await;

        assert!(registry.workspaces().await.is_empty());
        assert_eq!(registry.context_count().await, 0);
    }

    #[tokio::test]
    async fn disabled_workspace_support_routes_every_file_to_itself() {
        let oracle = proj_oracle();
        let config = ParserConfig {
            workspace_support: false,
            ..ParserConfig::default()
        };
        let registry = registry_with(&oracle, &config);
        registry.init(&[proj()]).await;

        for path in ["/proj", "/proj/main.pwn", "/proj/util.inc"] {
            assert_eq!(within(registry.resolve(Path::new(path))).await, PathBuf::from(path));
        }

        let context = registry
            .get_or_create_context(Path::new("/proj/util.inc"), true)
            .await
            .unwrap();
        assert!(!context.is_workspace_scoped());
    }
}
