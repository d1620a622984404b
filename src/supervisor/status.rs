//! Status file publisher
//!
//! Rewrites a JSON status file atomically (temp file + rename) every five
//! seconds so operators and monitoring can observe the supervisor without
//! touching it. Write failures never interrupt deployments.

use crate::queue::TaskQueue;
use crate::supervisor::stats::StatsCollector;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

pub const PUBLISH_INTERVAL: Duration = Duration::from_secs(5);

/// Supervisor lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Running,
    Stopping,
    Stopped,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::Running => "running",
            Phase::Stopping => "stopping",
            Phase::Stopped => "stopped",
        }
    }
}

/// Shared, observable lifecycle phase
#[derive(Debug)]
pub struct PhaseCell(Mutex<Phase>);

impl Default for PhaseCell {
    fn default() -> Self {
        Self(Mutex::new(Phase::Init))
    }
}

impl PhaseCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Phase {
        *self.0.lock().unwrap()
    }

    pub fn set(&self, phase: Phase) {
        *self.0.lock().unwrap() = phase;
    }
}

/// The published JSON document
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub workers: usize,
    pub scan_interval: u64,
    pub data_path: String,
    pub queue_size: usize,
    pub tasks_discovered: u64,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub tasks_retried: u64,
    pub success_rate: f64,
    pub last_activity: Option<String>,
}

pub struct StatusPublisher {
    path: PathBuf,
    stats: Arc<StatsCollector>,
    queue: Arc<TaskQueue>,
    phase: Arc<PhaseCell>,
    workers: usize,
    scan_interval: u64,
    data_path: String,
}

impl StatusPublisher {
    pub fn new(
        path: PathBuf,
        stats: Arc<StatsCollector>,
        queue: Arc<TaskQueue>,
        phase: Arc<PhaseCell>,
        workers: usize,
        scan_interval: u64,
        data_path: &Path,
    ) -> Self {
        Self {
            path,
            stats,
            queue,
            phase,
            workers,
            scan_interval,
            data_path: data_path.display().to_string(),
        }
    }

    pub fn report(&self) -> StatusReport {
        let snapshot = self.stats.snapshot();
        StatusReport {
            status: self.phase.get().as_str(),
            uptime_seconds: snapshot.uptime_seconds,
            workers: self.workers,
            scan_interval: self.scan_interval,
            data_path: self.data_path.clone(),
            queue_size: self.queue.len(),
            tasks_discovered: snapshot.tasks_discovered,
            tasks_completed: snapshot.tasks_completed,
            tasks_failed: snapshot.tasks_failed,
            tasks_retried: snapshot.tasks_retried,
            success_rate: snapshot.success_rate,
            last_activity: snapshot.last_activity.map(|t| t.to_rfc3339()),
        }
    }

    /// Write the current report, atomically
    pub async fn write_once(&self) -> std::io::Result<()> {
        let report = self.report();
        let body = serde_json::to_vec_pretty(&report)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        // Temp file in the same directory so the rename stays on one filesystem
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &body).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    /// Publish until shutdown
    ///
    /// Writes once more after the shutdown signal so the file reflects the
    /// stopping phase while workers drain; the supervisor writes the final
    /// stopped snapshot itself.
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        loop {
            if let Err(e) = self.write_once().await {
                log::debug!("Could not write status file: {e}");
            }

            tokio::select! {
                _ = tokio::time::sleep(PUBLISH_INTERVAL) => {}
                _ = shutdown_rx.recv() => break,
            }
        }

        if let Err(e) = self.write_once().await {
            log::debug!("Could not write status file during shutdown: {e}");
        }
    }
}
