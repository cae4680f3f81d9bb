//! Bugtrack CLI binary.

use std::process::ExitCode;

use anyhow::Result;
use bugtrack::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the bugtrack CLI.
///
/// Uses tokio's `current_thread` runtime; every command is a short sequence
/// of I/O-bound storage calls.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // Example: RUST_LOG=bugtrack=debug,bugtrack_json=trace bugtrack category tree
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bugtrack=info,bugtrack_json=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting bugtrack CLI");

    let cli = Cli::parse_args();
    let code = cli.execute().await?;

    tracing::debug!("Bugtrack CLI finished");
    Ok(code)
}
