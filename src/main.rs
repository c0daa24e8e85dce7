//! revue-check - scenario runner for the Revue CRUD REST API
//!
//! Authenticates, then runs an ordered suite of create/list/edit/delete
//! checks, threading the token and captured ids from step to step.

use std::path::PathBuf;

use clap::Parser;
use revue_check::commands::Commands;
use revue_check::common::config::Config;
use revue_check::{cli, common};

#[derive(Parser)]
#[command(name = "revue-check", about = "Scenario runner for the Revue REST API")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let _log_guard = common::logging::init_cli(cli.log_file.as_deref());

    let config = match &cli.config {
        Some(path) => Config::from_file(path).map(|mut config| {
            config.apply_env(|key| std::env::var(key).ok());
            config
        }),
        None => Config::load(),
    };

    let result = match config {
        Ok(config) => cli::dispatch(cli.command, config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
