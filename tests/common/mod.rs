//! Shared helpers for integration tests
#![allow(dead_code)]

use graphswap::catalog::{MemoryCatalog, MemoryLoader};
use graphswap::config::{Config, LoaderConfig, ServerConfig, SnapshotsConfig, SupervisorConfig};
use graphswap::core::shutdown::ShutdownCoordinator;
use graphswap::supervisor::{Supervisor, SupervisorError};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Write a structurally complete snapshot under `root`
pub fn write_snapshot(root: &Path, tenant: &str, timestamp: u64) {
    let snapshot = root.join(tenant).join(timestamp.to_string());
    for (section, kind) in [("nodes", "Person"), ("relationships", "KNOWS")] {
        let dir = snapshot.join(section).join(kind);
        fs::create_dir_all(&dir).unwrap();
        File::create(dir.join("part-0.parquet")).unwrap();
    }
}

/// Fast-cadence configuration for tests
pub fn test_config(root: &Path, status_file: PathBuf) -> Config {
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
            health_check_retry_delay: 1,
            retry_backoff_base: 1,
            shutdown_timeout: 10,
            status_file,
            ..SupervisorConfig::default()
        },
        loader: LoaderConfig::default(),
    }
}

/// A supervisor running against in-memory collaborators
pub struct Harness {
    pub catalog: Arc<MemoryCatalog>,
    pub loader: Arc<MemoryLoader>,
    pub supervisor: Arc<Supervisor>,
    pub coordinator: Arc<ShutdownCoordinator>,
    handle: JoinHandle<Result<(), SupervisorError>>,
}

impl Harness {
    /// Start the full pipeline
    pub fn start(config: Config) -> Self {
        let catalog = MemoryCatalog::new();
        let loader = MemoryLoader::new(catalog.clone());
        Self::start_with(config, catalog, loader)
    }

    /// Start with pre-configured collaborators
    pub fn start_with(
        config: Config,
        catalog: Arc<MemoryCatalog>,
        loader: Arc<MemoryLoader>,
    ) -> Self {
        let supervisor = Arc::new(Supervisor::new(
            config,
            catalog.clone(),
            catalog.clone(),
            loader.clone(),
        ));
        let (coordinator, _rx) = ShutdownCoordinator::new();
        let coordinator = Arc::new(coordinator);

        let handle = {
            let supervisor = supervisor.clone();
            let coordinator = coordinator.clone();
            tokio::spawn(async move { supervisor.run(&coordinator).await })
        };

        Self {
            catalog,
            loader,
            supervisor,
            coordinator,
            handle,
        }
    }

    /// Trigger shutdown and wait for the supervisor to finish
    pub async fn shutdown(self) -> Result<(), SupervisorError> {
        self.coordinator.trigger_shutdown();
        tokio::time::timeout(Duration::from_secs(30), self.handle)
            .await
            .expect("supervisor should stop within the grace period")
            .expect("supervisor task should not panic")
    }
}

/// Poll until `condition` holds, failing the test on timeout
pub async fn wait_until<F>(what: &str, timeout: Duration, mut condition: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for: {what}"
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}
