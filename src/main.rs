//! replug - ordered volume detach/reattach for OpenStack
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use replug::cli::{Cli, Commands};
use replug::config::ConfigManager;
use replug::error::ReplugResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ReplugResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("replug=warn"),
        1 => EnvFilter::new("replug=info"),
        _ => EnvFilter::new("replug=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        debug!("Local config discovery disabled (--no-local)");
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| replug::error::ReplugError::io("getting current directory", e))?;
        let found = ConfigManager::find_local_config(&cwd);
        if let Some(ref path) = found {
            debug!("Found local config: {}", path.display());
        }
        found
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    // Dispatch to command
    match cli.command {
        Commands::Cycle(args) => replug::cli::commands::cycle(args, &config).await,
        Commands::Plan(args) => replug::cli::commands::plan(args, &config).await,
        Commands::Status => replug::cli::commands::status(&config).await,
        Commands::Config(args) => replug::cli::commands::config(args, &config).await,
    }
}
