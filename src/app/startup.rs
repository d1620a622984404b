//! Startup wiring
//!
//! Logging first, then configuration: load the file, apply CLI overrides,
//! validate once. Nothing here has side effects beyond the logger.

use crate::app::cli::Args;
use crate::config::{load_config, Config, ConfigError};
use crate::core::logging::{init_logging, reconfigure_log_level};
use std::path::PathBuf;

const DEFAULT_CONFIG_FILE: &str = "graphswap.toml";

/// Initialise logging and produce the validated configuration
pub async fn startup(args: &Args) -> Result<Config, ConfigError> {
    let use_color = args.color && !args.no_color;
    let log_file = args.log_file.as_ref().map(|p| p.to_string_lossy().to_string());

    if let Err(e) = init_logging(
        args.log_level.as_deref(),
        args.log_format.as_deref(),
        log_file.as_deref(),
        use_color,
    ) {
        eprintln!("Failed to initialize logging: {e}");
    } else {
        log::trace!("Logging initialised");
    }

    let config_path = args
        .config_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut config = load_config(&config_path).await?;
    log::trace!("Configuration loaded from {}", config_path.display());

    // CLI flags take precedence over file values
    if let Some(workers) = args.workers {
        config.supervisor.workers = workers;
    }
    if let Some(scan_interval) = args.scan_interval {
        config.supervisor.scan_interval = scan_interval;
    }

    config.validate()?;

    // Stage 2: a config-file log level applies when the CLI gave none
    if args.log_level.is_none() {
        if let Some(level) = &config.supervisor.log_level {
            if let Err(e) = reconfigure_log_level(level) {
                log::warn!("Could not apply configured log level '{level}': {e}");
            }
        }
    }

    Ok(config)
}
