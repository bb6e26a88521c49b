//! CLI parser and dispatch.

mod harvest;
mod session;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{HarvestConfig, Settings};

#[derive(Parser)]
#[command(name = "salesnav-harvest")]
#[command(about = "Resumable lead harvesting from Sales Navigator searches")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest every page of a lead search into a CSV file
    Run {
        /// Sales Navigator search URL (must contain /sales/search)
        url: String,
        /// Skip confirmation prompts
        #[arg(short, long)]
        yes: bool,
        /// Directory the CSV file is written to
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Show the browser window
        #[arg(long)]
        headed: bool,
        /// Attach to a running Chrome instead of launching one (e.g. ws://localhost:9222)
        #[arg(long, env = "SALESNAV_REMOTE_URL")]
        remote: Option<String>,
        /// JSON cookie export to inject before loading the search
        #[arg(long)]
        cookies: Option<PathBuf>,
    },

    /// Show the saved harvest session
    Status,

    /// Discard the saved harvest session
    Clear,

    /// Export the leads of an interrupted harvest and discard its session
    Export {
        /// Directory the CSV file is written to
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = HarvestConfig::load(cli.config.as_deref())?;
    let settings = Settings::from_config(&config);

    match cli.command {
        Commands::Run {
            url,
            yes,
            out,
            headed,
            remote,
            cookies,
        } => {
            let options = harvest::RunOptions {
                url,
                assume_yes: yes,
                output_dir: out,
                headed,
                remote_url: remote,
                cookies_file: cookies,
            };
            harvest::cmd_run(config, &settings, options).await
        }
        Commands::Status => session::cmd_status(&config, &settings),
        Commands::Clear => session::cmd_clear(&config, &settings),
        Commands::Export { out } => session::cmd_export(&config, &settings, out),
    }
}
