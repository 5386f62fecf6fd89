//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use pawn_parser::oracle::ReplayOracle;
use pawn_parser::{ParserConfig, ParserRegistry};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound for anything a test waits on.
pub const TIMEOUT: Duration = Duration::from_secs(5);

/// Report line listing included files.
pub fn included_files(paths: &[&str]) -> String {
    format!(
        "{{\"kind\":\"includedFiles\",\"payload\":{}}}\n",
        serde_json::to_string(paths).unwrap()
    )
}

/// Report line declaring functions by name.
pub fn functions(names: &[&str]) -> String {
    let payload: Vec<serde_json::Value> = names
        .iter()
        .map(|name| serde_json::json!({ "name": name }))
        .collect();
    format!(
        "{{\"kind\":\"functions\",\"payload\":{}}}\n",
        serde_json::Value::Array(payload)
    )
}

/// Report line carrying one diagnostic.
pub fn diagnostic(message: &str) -> String {
    format!(
        "{{\"kind\":\"diagnostic\",\"payload\":{}}}\n",
        serde_json::json!({ "severity": "error", "message": message })
    )
}

/// Registry backed by `oracle` with default configuration.
pub fn registry(oracle: &ReplayOracle) -> ParserRegistry {
    registry_with(oracle, &ParserConfig::default())
}

/// Registry backed by `oracle` with `config`.
pub fn registry_with(oracle: &ReplayOracle, config: &ParserConfig) -> ParserRegistry {
    ParserRegistry::new(Arc::new(oracle.clone()), config)
}

/// Awaits `future`, failing the test if it takes longer than [`TIMEOUT`].
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(TIMEOUT, future)
        .await
        .expect("operation timed out")
}

/// Polls `condition` until it holds, failing the test after [`TIMEOUT`].
pub async fn eventually<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    within(async {
        while !condition().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
}

/// Key of every registered context, as strings.
pub async fn context_keys(registry: &ParserRegistry) -> Vec<String> {
    registry
        .contexts()
        .await
        .iter()
        .map(|context| context.root_path().display().to_string())
        .collect()
}

/// Writes an empty file at `root/name`, creating parent directories.
pub fn touch(root: &Path, name: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, "").unwrap();
}
