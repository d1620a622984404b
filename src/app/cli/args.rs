//! Command-line arguments

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "graphswap")]
#[command(about = "Blue/green deployment supervisor for multi-tenant graph databases")]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Worker pool size (overrides the config file)
    #[arg(short = 'w', long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Snapshot scan interval in seconds (overrides the config file)
    #[arg(short = 's', long = "scan-interval", value_name = "SECONDS")]
    pub scan_interval: Option<u64>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "json"])]
    pub log_format: Option<String>,

    /// Log file path (in addition to stdout)
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Colored log output
    #[arg(long = "color", action = ArgAction::SetTrue)]
    pub color: bool,

    /// Disable colored log output
    #[arg(long = "no-color", action = ArgAction::SetTrue, conflicts_with = "color")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the deployment supervisor (the default)
    Run,

    /// List database aliases and their targets
    ListAliases,

    /// List user databases with their tenant/timestamp breakdown
    ListDatabases,

    /// Drop tenants' aliases and timestamped databases
    Cleanup {
        /// Tenant to clean up; repeatable
        #[arg(long = "tenant", value_name = "TENANT", required = true, action = ArgAction::Append)]
        tenants: Vec<String>,

        /// Only drop aliases, keep databases
        #[arg(long = "aliases-only", action = ArgAction::SetTrue, conflicts_with = "databases_only")]
        aliases_only: bool,

        /// Only drop databases, keep aliases
        #[arg(long = "databases-only", action = ArgAction::SetTrue)]
        databases_only: bool,
    },

    /// Copy an existing snapshot to a new current-epoch timestamp
    ///
    /// Useful for exercising a running supervisor without fresh source data.
    SimulateSnapshot {
        /// Tenant whose snapshot to copy
        #[arg(long = "tenant", value_name = "TENANT")]
        tenant: String,

        /// Source timestamp (defaults to the tenant's newest snapshot)
        #[arg(long = "source-timestamp", value_name = "TIMESTAMP")]
        source_timestamp: Option<u64>,
    },
}
