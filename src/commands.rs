//! CLI command definitions
//!
//! Defines the clap commands for revue-check.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a scenario suite against the Revue API
    Run {
        /// YAML scenario suite (default: built-in Revue CRUD suite)
        scenario: Option<PathBuf>,

        /// Base URL of the API, e.g. https://host/api
        #[arg(long)]
        base_url: Option<String>,

        /// Login email
        #[arg(long)]
        email: Option<String>,

        /// Login password
        #[arg(long)]
        password: Option<String>,

        /// Run only these steps (and the steps they depend on)
        /// Can be specified multiple times: --only edit_revue --only delete_revue
        #[arg(long)]
        only: Vec<String>,

        /// Authenticate once per run instead of before every step
        #[arg(long)]
        auth_once: bool,

        /// Verbose output
        #[arg(long, short)]
        verbose: bool,
    },

    /// Show the ordered plan with what each step produces and consumes
    Plan {
        /// YAML scenario suite (default: built-in Revue CRUD suite)
        scenario: Option<PathBuf>,
    },

    /// Serve an in-memory mock of the Revue API
    Mock {
        /// Address to listen on (default from config: 127.0.0.1:5080)
        #[arg(long)]
        listen: Option<String>,
    },

    /// Show the configuration file path and effective settings
    Config,
}
