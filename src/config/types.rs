//! Configuration records and validation

use crate::config::ConfigError;
use crate::core::validation::{require_at_least, require_non_empty, require_percent};
use serde::Deserialize;
use std::path::PathBuf;

/// Top-level configuration for the graphswap binary
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub snapshots: SnapshotsConfig,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
}

/// Graph server connection parameters
///
/// Opaque to the supervisor beyond being handed to the catalog client and the
/// loader command.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub tls: bool,
}

fn default_http_port() -> u16 {
    7474
}

impl ServerConfig {
    /// Base URL of the server's HTTP endpoint
    pub fn base_url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.http_port)
    }
}

/// Snapshot filesystem layout
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotsConfig {
    /// Root directory scanned for `{tenant}/{timestamp}` snapshot trees
    pub root: PathBuf,
}

/// Supervisor tuning knobs
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupervisorConfig {
    /// Size of the worker pool
    pub workers: usize,
    /// Seconds between snapshot scans
    pub scan_interval: u64,
    /// Health gate: refuse loads when this many user databases exist
    pub max_databases: usize,
    /// Health gate: refuse loads above this heap utilisation
    pub heap_threshold_percent: u8,
    /// Health gate: refuse loads above this page-cache utilisation
    pub pagecache_threshold_percent: u8,
    /// Seconds before a health-vetoed task is offered again
    pub health_check_retry_delay: u64,
    /// Retry budget shared by health vetoes and transient load failures
    pub max_retries: u32,
    /// Base of the exponential retry backoff (seconds)
    pub retry_backoff_base: u64,
    /// Grace period for in-flight loads on shutdown (seconds)
    pub shutdown_timeout: u64,
    /// Databases kept per tenant after a successful deployment
    pub retention_keep: usize,
    /// Path of the JSON status file
    pub status_file: PathBuf,
    /// Log level applied after startup when no CLI level is given
    pub log_level: Option<String>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            scan_interval: 30,
            max_databases: 50,
            heap_threshold_percent: 85,
            pagecache_threshold_percent: 90,
            health_check_retry_delay: 60,
            max_retries: 3,
            retry_backoff_base: 2,
            shutdown_timeout: 300,
            retention_keep: 2,
            status_file: PathBuf::from("graphswap_status.json"),
            log_level: None,
        }
    }
}

/// External bulk-load command
///
/// The loader is an external collaborator: a child process that reads the
/// snapshot's columnar files and feeds them into the timestamped database.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Executable invoked per snapshot
    pub command: String,
    /// Extra arguments placed before the generated ones
    pub args: Vec<String>,
    /// Exit code the loader uses to signal a non-retryable input problem
    pub permanent_exit_code: i32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            command: String::from("graph-bulk-load"),
            args: Vec::new(),
            permanent_exit_code: 2,
        }
    }
}

impl Config {
    /// Validate every option once, before any side effect
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty("server.host", &self.server.host)?;
        require_non_empty("server.user", &self.server.user)?;
        require_non_empty("loader.command", &self.loader.command)?;

        let sup = &self.supervisor;
        require_at_least("supervisor.workers", sup.workers as u64, 1)?;
        require_at_least("supervisor.scan_interval", sup.scan_interval, 1)?;
        require_at_least("supervisor.max_databases", sup.max_databases as u64, 1)?;
        require_percent("supervisor.heap_threshold_percent", sup.heap_threshold_percent)?;
        require_percent(
            "supervisor.pagecache_threshold_percent",
            sup.pagecache_threshold_percent,
        )?;
        require_at_least(
            "supervisor.health_check_retry_delay",
            sup.health_check_retry_delay,
            1,
        )?;
        require_at_least("supervisor.retry_backoff_base", sup.retry_backoff_base, 1)?;
        require_at_least("supervisor.shutdown_timeout", sup.shutdown_timeout, 1)?;
        require_at_least("supervisor.retention_keep", sup.retention_keep as u64, 1)?;

        if let Some(level) = &sup.log_level {
            const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];
            if !LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(crate::core::validation::ValidationError::new(&format!(
                    "supervisor.log_level must be one of {LEVELS:?} (got '{level}')"
                ))
                .into());
            }
        }

        Ok(())
    }
}
