//! ## packwatch-cli
//! **Operational entrypoint for the telemetry relay**
//!
//! `packwatch serve` runs the HTTP surface (and, when enabled, the raw TCP
//! ingress) until interrupted; `packwatch check-config` validates a
//! configuration file and exits.

use clap::Parser;
use packwatch_telemetry::logging::EventLogger;

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    EventLogger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await,
        Commands::CheckConfig(args) => commands::run_check_config(args),
    }
}
