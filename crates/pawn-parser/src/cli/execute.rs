//! Command execution logic.

use anyhow::{Context as _, Result};
use colored::Colorize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::args::{DiagnosticsArgs, ResolveArgs, SymbolsArgs};
use super::output::{self, OutputConfig, OutputMode, Resolution};
use crate::config::ParserConfig;
use crate::context::ParserContext;
use crate::registry::ParserRegistry;

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("invalid path '{}'", path.display()))
}

/// Returns the up-to-date context that owns `path`.
///
/// Standalone contexts are compiled on demand; workspace contexts were
/// started when the registry was initialized.
async fn parsed_context(registry: &ParserRegistry, path: &Path) -> Result<Arc<ParserContext>> {
    let path = absolute(path)?;
    let context = registry
        .get_or_create_context(&path, true)
        .await
        .with_context(|| format!("no context for '{}'", path.display()))?;

    if !context.is_workspace_scoped() {
        context.run();
    }
    context.wait_for_result().await;
    Ok(context)
}

/// Execute the resolve command
pub async fn execute_resolve(
    registry: &ParserRegistry,
    args: &ResolveArgs,
    mode: OutputMode,
) -> Result<()> {
    let mut resolutions = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        let path = absolute(path)?;
        let key = registry.resolve(&path).await;
        resolutions.push(Resolution { path, key });
    }

    output::print_resolutions(
        &mut io::stdout().lock(),
        &resolutions,
        mode,
        &OutputConfig::from_env(),
    )?;
    Ok(())
}

/// Execute the symbols command
pub async fn execute_symbols(
    registry: &ParserRegistry,
    args: &SymbolsArgs,
    mode: OutputMode,
) -> Result<()> {
    let context = parsed_context(registry, &args.path).await?;

    output::print_symbols(
        &mut io::stdout().lock(),
        context.root_path(),
        &context.symbols(),
        args.kind.map(Into::into),
        mode,
        &OutputConfig::from_env(),
    )?;
    Ok(())
}

/// Execute the diagnostics command
pub async fn execute_diagnostics(
    registry: &ParserRegistry,
    args: &DiagnosticsArgs,
    mode: OutputMode,
) -> Result<()> {
    let context = parsed_context(registry, &args.path).await?;

    output::print_diagnostics(
        &mut io::stdout().lock(),
        context.root_path(),
        &context.diagnostics(),
        mode,
        &OutputConfig::from_env(),
    )?;
    Ok(())
}

/// Execute the contexts command
pub async fn execute_contexts(registry: &ParserRegistry, mode: OutputMode) -> Result<()> {
    let contexts = registry.contexts().await;
    for context in &contexts {
        context.wait_for_result().await;
    }
    let statuses: Vec<_> = contexts.iter().map(|context| context.status()).collect();

    output::print_contexts(
        &mut io::stdout().lock(),
        &statuses,
        mode,
        &OutputConfig::from_env(),
    )?;
    Ok(())
}

/// Execute the check-compiler command
pub async fn execute_check_compiler(config: &ParserConfig, mode: OutputMode) -> Result<()> {
    let executable = config.compiler.validate().await?;
    let options = config.compiler.effective_options();

    match mode {
        OutputMode::Json => output::print_json(
            &mut io::stdout().lock(),
            &serde_json::json!({
                "executable": executable,
                "options": options,
            }),
        )?,
        OutputMode::Text => {
            println!("{} {}", "Compiler found:".green(), executable.display());
            println!("  options: {}", options.join(" "));
        }
    }
    Ok(())
}
