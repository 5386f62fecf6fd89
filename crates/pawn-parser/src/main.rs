//! pawn-parser CLI binary.

use anyhow::Result;
use pawn_parser::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the pawn-parser CLI.
///
/// Compiler invocations run as spawned tasks, so a multi-threaded runtime
/// lets output reading and waiting proceed side by side.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Logs go to stderr so JSON on stdout stays machine-readable.
    // Example: RUST_LOG=pawn_parser=debug,pawn_records=trace pawn-parser contexts
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!("Starting pawn-parser CLI");

    cli.execute().await?;

    tracing::debug!("pawn-parser CLI completed successfully");
    Ok(())
}
