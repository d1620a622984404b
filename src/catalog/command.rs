//! External bulk-load command
//!
//! The data path is owned by a separate bulk-load executable; this module
//! only knows how to invoke it for one snapshot and classify its exit status.

use crate::catalog::api::SnapshotLoader;
use crate::catalog::{names, LoadError};
use crate::config::LoaderConfig;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// How much loader stderr to keep in the task's last_error
const STDERR_TAIL_LINES: usize = 5;

pub struct CommandLoader {
    command: String,
    extra_args: Vec<String>,
    permanent_exit_code: i32,
}

impl CommandLoader {
    pub fn new(config: &LoaderConfig) -> Self {
        Self {
            command: config.command.clone(),
            extra_args: config.args.clone(),
            permanent_exit_code: config.permanent_exit_code,
        }
    }
}

#[async_trait]
impl SnapshotLoader for CommandLoader {
    async fn load(
        &self,
        tenant: &str,
        timestamp: u64,
        data_path: &Path,
    ) -> Result<(), LoadError> {
        let database = names::database_name(tenant, timestamp);

        log::debug!(
            "{tenant}/{timestamp}: invoking loader '{}' for database {database}",
            self.command
        );

        let output = Command::new(&self.command)
            .args(&self.extra_args)
            .arg("--tenant")
            .arg(tenant)
            .arg("--timestamp")
            .arg(timestamp.to_string())
            .arg("--database")
            .arg(&database)
            .arg("--data-path")
            .arg(data_path)
            .kill_on_drop(false)
            .output()
            .await
            .map_err(|e| {
                LoadError::Transient(format!("could not spawn loader '{}': {e}", self.command))
            })?;

        if output.status.success() {
            return Ok(());
        }

        let detail = stderr_tail(&output.stderr);
        match output.status.code() {
            Some(code) if code == self.permanent_exit_code => Err(LoadError::Permanent(format!(
                "loader exited with permanent-failure code {code}: {detail}"
            ))),
            Some(code) => Err(LoadError::Transient(format!(
                "loader exited with code {code}: {detail}"
            ))),
            // Killed by a signal
            None => Err(LoadError::Transient(format!(
                "loader terminated by signal: {detail}"
            ))),
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    let tail = lines[start..].join(" | ");
    if tail.is_empty() {
        "(no stderr)".to_string()
    } else {
        tail
    }
}
