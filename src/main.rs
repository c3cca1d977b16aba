use std::process::ExitCode;

use clap::Parser;
use rigging::Args;
use tracing::error;

/// Main entry point for the `rigging` binary.
#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    if let Err(err) = Args::parse().run().await {
        error!("{err:?}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
