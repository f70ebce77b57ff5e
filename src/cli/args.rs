//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// replug - ordered volume detach/reattach for OpenStack
///
/// Detaches and reattaches non-root block volumes per instance in
/// ascending device order so in-guest device naming is restored.
#[derive(Parser, Debug)]
#[command(name = "replug")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "REPLUG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .replug.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detach then reattach all non-root volumes, preserving device order
    Cycle(CycleArgs),

    /// Show the inventory and call plan without mutating anything
    Plan(PlanArgs),

    /// Check control-plane CLI, session, and configuration health
    Status,

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the cycle command
#[derive(Parser, Debug)]
pub struct CycleArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Print the full call sequence without issuing any call
    #[arg(long)]
    pub dry_run: bool,

    /// Restrict the cycle to specific instance ids (repeatable)
    #[arg(short, long)]
    pub instance: Vec<String>,

    /// Override the configured policy for failed calls
    #[arg(long, value_enum)]
    pub on_failure: Option<OnFailure>,
}

/// Arguments for the plan command
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,

    /// Restrict to specific instance ids (repeatable)
    #[arg(short, long)]
    pub instance: Vec<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., cycle.root_device)
        key: String,
        /// Value to set
        value: String,
        /// Write to project-local .replug.toml instead of global config
        #[arg(long)]
        local: bool,
    },
}

/// Failure policy override for the cycle command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OnFailure {
    /// Record failed calls and keep going
    Continue,
    /// Stop at the first failed call
    Abort,
}

/// Output format for the plan command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one attachment per line)
    Plain,
}
