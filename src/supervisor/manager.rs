//! Supervisor lifecycle
//!
//! Startup probes, task spawning, and the shutdown sequence. The supervisor
//! is parametric over its collaborators, so the test suite can run the whole
//! pipeline against in-memory substitutes.

use crate::catalog::{Catalog, HealthProbes, SnapshotLoader};
use crate::config::Config;
use crate::core::shutdown::ShutdownCoordinator;
use crate::health::HealthGate;
use crate::queue::{SnapshotTask, TaskQueue};
use crate::scanner;
use crate::supervisor::status::{Phase, PhaseCell, StatusPublisher};
use crate::supervisor::worker::{RetryPolicy, Worker};
use crate::supervisor::{StatsCollector, SupervisorError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub struct Supervisor {
    config: Config,
    catalog: Arc<dyn Catalog>,
    probes: Arc<dyn HealthProbes>,
    loader: Arc<dyn SnapshotLoader>,
    queue: Arc<TaskQueue>,
    stats: Arc<StatsCollector>,
    phase: Arc<PhaseCell>,
}

impl Supervisor {
    pub fn new(
        config: Config,
        catalog: Arc<dyn Catalog>,
        probes: Arc<dyn HealthProbes>,
        loader: Arc<dyn SnapshotLoader>,
    ) -> Self {
        Self {
            config,
            catalog,
            probes,
            loader,
            queue: Arc::new(TaskQueue::new()),
            stats: Arc::new(StatsCollector::new()),
            phase: Arc::new(PhaseCell::new()),
        }
    }

    /// Shared statistics handle, for observation
    pub fn stats(&self) -> Arc<StatsCollector> {
        self.stats.clone()
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    /// Run until the coordinator signals shutdown
    pub async fn run(&self, coordinator: &ShutdownCoordinator) -> Result<(), SupervisorError> {
        let sup = &self.config.supervisor;

        // Fail fast before spawning anything: server reachable, root present
        self.catalog
            .ping()
            .await
            .map_err(|source| SupervisorError::StartupProbe { source })?;
        log::info!("Graph server connection successful");

        let root = self.config.snapshots.root.clone();
        if !root.is_dir() {
            return Err(SupervisorError::SnapshotRootMissing {
                path: root.display().to_string(),
            });
        }

        log::info!("Blue/green deployment supervisor starting");
        log::info!("Snapshot root: {}", root.display());
        log::info!("Workers: {}", sup.workers);
        log::info!("Scan interval: {}s", sup.scan_interval);

        let publisher = Arc::new(StatusPublisher::new(
            sup.status_file.clone(),
            self.stats.clone(),
            self.queue.clone(),
            self.phase.clone(),
            sup.workers,
            sup.scan_interval,
            &root,
        ));
        let publisher_handle = {
            let publisher = publisher.clone();
            let shutdown_rx = coordinator.subscribe();
            tokio::spawn(async move { publisher.run(shutdown_rx).await })
        };

        let scanner_handle = tokio::spawn(scanner_loop(
            root,
            Duration::from_secs(sup.scan_interval),
            self.queue.clone(),
            self.stats.clone(),
            coordinator.subscribe(),
        ));

        let gate = Arc::new(HealthGate::new(self.probes.clone(), sup));
        let policy = RetryPolicy {
            max_retries: sup.max_retries,
            backoff_base: sup.retry_backoff_base,
            health_check_retry_delay: Duration::from_secs(sup.health_check_retry_delay),
        };

        let mut worker_handles: Vec<JoinHandle<()>> = Vec::with_capacity(sup.workers);
        for id in 1..=sup.workers {
            let worker = Worker::new(
                id,
                self.queue.clone(),
                gate.clone(),
                self.catalog.clone(),
                self.loader.clone(),
                self.stats.clone(),
                policy.clone(),
                sup.retention_keep,
            );
            worker_handles.push(tokio::spawn(worker.run(coordinator.subscribe())));
        }

        self.phase.set(Phase::Running);
        log::info!("Supervisor running; send SIGINT/SIGTERM to stop");

        // Block until the first shutdown signal
        let mut shutdown_rx = coordinator.subscribe();
        if !coordinator.is_shutdown_requested() {
            let _ = shutdown_rx.recv().await;
        }

        self.phase.set(Phase::Stopping);
        log::info!(
            "Stopping: waiting up to {}s for in-flight deployments ({} queued tasks will be discarded)",
            sup.shutdown_timeout,
            self.queue.len()
        );

        // No new work: the scanner stops offering and take() returns the
        // close sentinel. In-flight loads run to completion.
        self.queue.close();

        let grace = Duration::from_secs(sup.shutdown_timeout);
        let drain = async {
            for handle in worker_handles {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(grace, drain).await.is_err() {
            log::warn!("Shutdown timeout reached; abandoning in-flight deployments");
        } else {
            log::info!("All workers drained");
        }

        let _ = scanner_handle.await;

        let _ = publisher_handle.await;
        self.phase.set(Phase::Stopped);
        if let Err(e) = publisher.write_once().await {
            log::debug!("Could not write final status file: {e}");
        }

        log::info!("Supervisor stopped");
        Ok(())
    }
}

/// Periodic snapshot discovery feeding the queue
async fn scanner_loop(
    root: PathBuf,
    interval: Duration,
    queue: Arc<TaskQueue>,
    stats: Arc<StatsCollector>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    log::info!(
        "Watching for snapshots in {} (scan every {}s)",
        root.display(),
        interval.as_secs()
    );

    loop {
        match scanner::scan(&root) {
            Ok(discovered) => {
                for snapshot in discovered {
                    let task = SnapshotTask::from(snapshot);
                    let key = task.key();
                    if queue.offer(task) {
                        stats.record_discovery();
                        log::info!("Discovered new snapshot: {key}");
                    }
                }
            }
            Err(e) => {
                // The root can disappear transiently on network shares
                log::warn!("Snapshot scan failed: {e}");
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown_rx.recv() => break,
        }
    }

    log::debug!("Scanner loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MemoryCatalog, MemoryLoader};
    use crate::config::{LoaderConfig, ServerConfig, SnapshotsConfig, SupervisorConfig};
    use std::fs::File;
    use tempfile::TempDir;

    fn test_config(root: &std::path::Path, status_file: PathBuf) -> Config {
        Config {
            server: ServerConfig {
                host: "localhost".to_string(),
                http_port: 7474,
                user: "neo4j".to_string(),
                password: "secret".to_string(),
                tls: false,
            },
            snapshots: SnapshotsConfig {
                root: root.to_path_buf(),
            },
            supervisor: SupervisorConfig {
                scan_interval: 1,
                status_file,
                ..SupervisorConfig::default()
            },
            loader: LoaderConfig::default(),
        }
    }

    fn write_snapshot(root: &std::path::Path, tenant: &str, timestamp: u64) {
        let snapshot = root.join(tenant).join(timestamp.to_string());
        for (section, kind) in [("nodes", "Person"), ("relationships", "KNOWS")] {
            let dir = snapshot.join(section).join(kind);
            std::fs::create_dir_all(&dir).unwrap();
            File::create(dir.join("part-0.parquet")).unwrap();
        }
    }

    #[tokio::test]
    async fn test_startup_fails_fast_when_server_unreachable() {
        let root = TempDir::new().unwrap();
        let status = root.path().join("status.json");
        let catalog = MemoryCatalog::new();
        catalog.set_unreachable(Some("connection refused"));
        let loader = MemoryLoader::new(catalog.clone());

        let supervisor = Supervisor::new(
            test_config(root.path(), status),
            catalog.clone(),
            catalog,
            loader,
        );
        let (coordinator, _rx) = ShutdownCoordinator::new();

        let err = supervisor.run(&coordinator).await.unwrap_err();
        assert!(matches!(err, SupervisorError::StartupProbe { .. }));
    }

    #[tokio::test]
    async fn test_startup_fails_fast_when_root_missing() {
        let dir = TempDir::new().unwrap();
        let status = dir.path().join("status.json");
        let mut config = test_config(dir.path(), status);
        config.snapshots.root = PathBuf::from("/nonexistent/snapshots");

        let catalog = MemoryCatalog::new();
        let loader = MemoryLoader::new(catalog.clone());
        let supervisor = Supervisor::new(config, catalog.clone(), catalog, loader);
        let (coordinator, _rx) = ShutdownCoordinator::new();

        let err = supervisor.run(&coordinator).await.unwrap_err();
        assert!(matches!(err, SupervisorError::SnapshotRootMissing { .. }));
    }

    #[tokio::test]
    async fn test_scanner_loop_offers_each_snapshot_once() {
        let root = TempDir::new().unwrap();
        write_snapshot(root.path(), "t1", 100);
        write_snapshot(root.path(), "t1", 200);

        let queue = Arc::new(TaskQueue::new());
        let stats = Arc::new(StatsCollector::new());
        let (coordinator, _rx) = ShutdownCoordinator::new();

        let handle = tokio::spawn(scanner_loop(
            root.path().to_path_buf(),
            Duration::from_millis(20),
            queue.clone(),
            stats.clone(),
            coordinator.subscribe(),
        ));

        // Let several sweeps happen; dedup keeps discoveries at 2
        tokio::time::sleep(Duration::from_millis(150)).await;
        coordinator.trigger_shutdown();
        let _ = handle.await;

        assert_eq!(stats.snapshot().tasks_discovered, 2);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.admitted_len(), 2);
    }
}
