//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Overlay Janitor - keep advertised overlay peers healthy.
#[derive(Debug, Parser)]
#[command(name = "overlay-janitor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "OVERLAY_JANITOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database path (overrides the configuration file)
    #[arg(short, long, global = true, env = "OVERLAY_DATABASE")]
    pub database: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a single health sweep and exit
    Sweep(SweepArgs),

    /// Run health sweeps on an interval until interrupted
    Watch(WatchArgs),

    /// List peer records and their down counters
    List(ListArgs),
}

/// Arguments for the sweep command.
#[derive(Debug, Parser)]
pub struct SweepArgs {
    /// Log transitions without writing them
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the watch command.
#[derive(Debug, Parser)]
pub struct WatchArgs {
    /// Seconds between sweeps (overrides the configuration file)
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Log transitions without writing them
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the list command.
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Only list one collection (ship or slap)
    #[arg(short = 'C', long)]
    pub collection: Option<String>,
}
