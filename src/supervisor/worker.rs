//! Deployment worker and retry engine
//!
//! Each worker drives one task at a time through the health gate, the bulk
//! load, the latest-wins alias rule, and retention GC. The retry loop here is
//! the single source of truth for retry policy: health vetoes and transient
//! load failures share one per-task budget, backoff is strictly exponential,
//! and an exhausted task is abandoned until the next supervisor start.

use crate::catalog::{names, Catalog, LoadError, SnapshotLoader};
use crate::health::HealthGate;
use crate::queue::{SnapshotTask, TaskOutcome, TaskQueue};
use crate::supervisor::stats::StatsCollector;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Upper bound on any single retry sleep
///
/// The exponential curve is unchanged below the cap; the cap only bounds the
/// pathological tail of high retry counts.
pub const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(300);

/// Retry knobs shared by every worker
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: u64,
    pub health_check_retry_delay: Duration,
}

impl RetryPolicy {
    /// Backoff before the attempt numbered `retry_count` (1-based)
    ///
    /// Delays run `base, base^2, base^3, ...` seconds, capped.
    pub fn backoff(&self, retry_count: u32) -> Duration {
        let seconds = self.backoff_base.saturating_pow(retry_count);
        Duration::from_secs(seconds).min(MAX_RETRY_BACKOFF)
    }
}

pub struct Worker {
    id: usize,
    queue: Arc<TaskQueue>,
    gate: Arc<HealthGate>,
    catalog: Arc<dyn Catalog>,
    loader: Arc<dyn SnapshotLoader>,
    stats: Arc<StatsCollector>,
    policy: RetryPolicy,
    retention_keep: usize,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        queue: Arc<TaskQueue>,
        gate: Arc<HealthGate>,
        catalog: Arc<dyn Catalog>,
        loader: Arc<dyn SnapshotLoader>,
        stats: Arc<StatsCollector>,
        policy: RetryPolicy,
        retention_keep: usize,
    ) -> Self {
        Self {
            id,
            queue,
            gate,
            catalog,
            loader,
            stats,
            policy,
            retention_keep,
        }
    }

    /// Consume tasks until the queue closes
    ///
    /// A task in flight is never interrupted; shutdown only interrupts the
    /// backoff sleeps, dropping the task for rediscovery on the next start.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        log::info!("Worker {} started", self.id);

        while let Some(mut task) = self.queue.take().await {
            match self.process(&mut task).await {
                TaskOutcome::Completed => {
                    self.stats.record_completion();
                }
                TaskOutcome::Retrying { delay } => {
                    self.stats.record_retry();
                    log::info!(
                        "Worker {}: retrying {} in {}s (attempt {}/{}): {}",
                        self.id,
                        task.key(),
                        delay.as_secs(),
                        task.retry_count + 1,
                        self.policy.max_retries + 1,
                        task.last_error.as_deref().unwrap_or("unknown error")
                    );

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {
                            if self.queue.requeue(task).is_err() {
                                log::debug!(
                                    "Worker {}: queue closed during backoff; task dropped",
                                    self.id
                                );
                                break;
                            }
                        }
                        _ = shutdown_rx.recv() => {
                            log::debug!(
                                "Worker {}: shutdown during backoff; task dropped",
                                self.id
                            );
                            break;
                        }
                    }
                }
                TaskOutcome::Abandoned { reason } => {
                    self.stats.record_failure();
                    log::error!(
                        "Worker {}: abandoned {} after {} retries: {reason}",
                        self.id,
                        task.key(),
                        task.retry_count
                    );
                }
            }
        }

        log::info!("Worker {} stopped", self.id);
    }

    /// One pass over a task: gate, load, alias, retention
    pub async fn process(&self, task: &mut SnapshotTask) -> TaskOutcome {
        let db_name = task.database_name();
        log::info!(
            "Worker {}: loading {} into {db_name} (attempt {})",
            self.id,
            task.key(),
            task.retry_count + 1
        );

        // 1. Pre-flight health gate. A veto is pressure, not failure.
        let verdict = self.gate.check().await;
        if !verdict.healthy {
            log::warn!(
                "Worker {}: health check failed for {}: {}",
                self.id,
                task.key(),
                verdict.reason
            );
            task.last_error = Some(verdict.reason.clone());
            return self.retry_or_abandon(task, self.policy.health_check_retry_delay);
        }

        // 2. The opaque bulk load.
        if let Err(error) = self
            .loader
            .load(&task.tenant, task.timestamp, &task.data_path)
            .await
        {
            task.last_error = Some(error.to_string());
            return match error {
                LoadError::Permanent(_) => TaskOutcome::Abandoned {
                    reason: error.to_string(),
                },
                LoadError::Transient(_) => {
                    let delay = self.policy.backoff(task.retry_count + 1);
                    self.retry_or_abandon(task, delay)
                }
            };
        }
        log::info!("Worker {}: loaded {db_name}", self.id);

        // 3. Latest-wins alias cutover, evaluated against the catalog so
        //    out-of-order completions never move the alias backwards.
        match self.is_latest_deployment(&task.tenant, task.timestamp).await {
            Ok(true) => {
                log::info!(
                    "Worker {}: switching alias {} -> {db_name}",
                    self.id,
                    task.tenant
                );
                if let Err(e) = self.catalog.set_alias(&task.tenant, &db_name).await {
                    // The load itself succeeded; the alias converges on the
                    // tenant's next deployment
                    log::error!(
                        "Worker {}: could not switch alias {} -> {db_name}: {e}",
                        self.id,
                        task.tenant
                    );
                }
            }
            Ok(false) => {
                log::info!(
                    "Worker {}: {db_name} is not the newest deployment for {}; alias unchanged",
                    self.id,
                    task.tenant
                );
            }
            Err(e) => {
                log::error!(
                    "Worker {}: could not evaluate latest deployment for {}: {e}",
                    self.id,
                    task.tenant
                );
            }
        }

        // 4. Retention GC. Failures leave extra databases for the next cycle.
        if let Err(e) = self.apply_retention(&task.tenant).await {
            log::error!(
                "Worker {}: retention pass failed for {}: {e}",
                self.id,
                task.tenant
            );
        }

        TaskOutcome::Completed
    }

    fn retry_or_abandon(&self, task: &mut SnapshotTask, delay: Duration) -> TaskOutcome {
        if task.retry_count < self.policy.max_retries {
            task.retry_count += 1;
            TaskOutcome::Retrying { delay }
        } else {
            TaskOutcome::Abandoned {
                reason: task
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "retries exhausted".to_string()),
            }
        }
    }

    /// Is `timestamp` the newest deployment present for this tenant?
    ///
    /// Present means in the catalog now: a worker that finished an older
    /// snapshot sees the newer database and declines the cutover.
    async fn is_latest_deployment(
        &self,
        tenant: &str,
        timestamp: u64,
    ) -> Result<bool, crate::catalog::CatalogError> {
        let databases = self.catalog.list_databases().await?;
        let newest = names::tenant_databases(&databases, tenant)
            .first()
            .map(|(ts, _)| *ts);
        Ok(newest.map_or(true, |newest| timestamp >= newest))
    }

    /// Drop everything beyond the newest `retention_keep` databases
    ///
    /// The current alias target is never dropped, even if it somehow fell out
    /// of the top K.
    async fn apply_retention(&self, tenant: &str) -> Result<(), crate::catalog::CatalogError> {
        let databases = self.catalog.list_databases().await?;
        let deployments = names::tenant_databases(&databases, tenant);
        if deployments.len() <= self.retention_keep {
            return Ok(());
        }

        let aliases = self.catalog.list_aliases().await?;

        for (_, name) in deployments.iter().skip(self.retention_keep) {
            if aliases.values().any(|target| target == name) {
                log::warn!(
                    "Worker {}: keeping {name} despite retention: it is an alias target",
                    self.id
                );
                continue;
            }
            log::info!("Worker {}: dropping old database {name}", self.id);
            if let Err(e) = self.catalog.drop_database(name).await {
                log::warn!("Worker {}: could not drop {name}: {e}", self.id);
            }
        }

        Ok(())
    }
}
