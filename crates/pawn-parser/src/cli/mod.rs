//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `resolve`: Show which context owns each file
//! - `symbols`: Compile a file's context and list its symbols
//! - `diagnostics`: Compile a file's context and list its diagnostics
//! - `contexts`: List registered contexts once workspaces have parsed
//! - `check-compiler`: Verify the configured compiler path
//!
//! # Global Flags
//!
//! - `--config <FILE>`: Configuration file (default `./pawn-parser.yaml`)
//! - `--workspace <DIR>`: Register a workspace folder (repeatable)
//! - `--replay <FILE>`: Answer every invocation with a recorded report
//! - `--json`: Output in JSON format
//!
//! # Example
//!
//! ```bash
//! pawn-parser -w ~/gamemode symbols ~/gamemode/gamemode.pwn --kind function
//! pawn-parser -w ~/gamemode resolve ~/gamemode/includes/util.inc
//! ```

mod args;
mod execute;
pub mod output;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use args::{DiagnosticsArgs, ResolveArgs, SymbolKindArg, SymbolsArgs};

use crate::config::{CONFIG_FILE_NAME, ParserConfig};
use crate::oracle::{CompilerOracle, ReplayOracle};
use crate::registry::ParserRegistry;
use crate::workspace::WorkspaceDescriptor;
use output::OutputMode;

/// Query the Pawn compiler's view of scripts and workspaces
///
/// Runs pawncc in report mode and shows what it found: symbols, diagnostics,
/// and which workspace each file belongs to.
#[derive(Parser, Debug)]
#[command(name = "pawn-parser")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Register a workspace folder (repeatable)
    #[arg(short = 'w', long = "workspace", global = true, value_name = "DIR")]
    pub workspaces: Vec<PathBuf>,

    /// Replay a recorded report instead of running the compiler
    #[arg(long, global = true, value_name = "FILE")]
    pub replay: Option<PathBuf>,

    /// Treat every file as standalone, ignoring workspaces
    #[arg(long, global = true)]
    pub no_workspace_support: bool,

    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the context key of each file
    Resolve(ResolveArgs),

    /// List symbols declared in a file's context
    Symbols(SymbolsArgs),

    /// List compiler diagnostics for a file's context
    Diagnostics(DiagnosticsArgs),

    /// List registered contexts
    Contexts,

    /// Verify that the configured compiler exists
    CheckCompiler,
}

impl Cli {
    /// Parse command-line arguments.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default log filter for the requested verbosity. `RUST_LOG` overrides
    /// it.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "pawn_parser=warn,pawn_records=warn",
            1 => "pawn_parser=info,pawn_records=info",
            2 => "pawn_parser=debug,pawn_records=debug",
            _ => "pawn_parser=trace,pawn_records=trace",
        }
    }

    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        }
    }

    /// Execute the parsed command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded, a path cannot be
    /// made absolute, or output cannot be written.
    pub async fn execute(&self) -> Result<()> {
        let config = self.load_config().await?;
        let mode = self.output_mode();

        if matches!(self.command, Commands::CheckCompiler) {
            return execute::execute_check_compiler(&config, mode).await;
        }

        let registry = self.build_registry(&config).await?;
        let result = match &self.command {
            Commands::Resolve(args) => execute::execute_resolve(&registry, args, mode).await,
            Commands::Symbols(args) => execute::execute_symbols(&registry, args, mode).await,
            Commands::Diagnostics(args) => {
                execute::execute_diagnostics(&registry, args, mode).await
            }
            Commands::Contexts => execute::execute_contexts(&registry, mode).await,
            Commands::CheckCompiler => Ok(()),
        };
        registry.shutdown().await;
        result
    }

    /// Loads the configuration file and applies command-line overrides.
    async fn load_config(&self) -> Result<ParserConfig> {
        let mut config = match &self.config {
            Some(path) => ParserConfig::load(path).await?,
            None => ParserConfig::load_or_default(Path::new(CONFIG_FILE_NAME)).await?,
        };

        for root in &self.workspaces {
            config
                .workspaces
                .push(WorkspaceDescriptor::new(std::path::absolute(root)?));
        }
        if self.no_workspace_support {
            config.workspace_support = false;
        }

        Ok(config)
    }

    async fn build_registry(&self, config: &ParserConfig) -> Result<ParserRegistry> {
        let oracle: Arc<dyn CompilerOracle> = match &self.replay {
            Some(report) => Arc::new(ReplayOracle::from_report_file(report).await?),
            None => Arc::new(config.compiler.oracle()),
        };

        let registry = ParserRegistry::new(oracle, config);
        if config.workspace_support {
            registry.init(&config.workspaces).await;
        }
        Ok(registry)
    }
}
