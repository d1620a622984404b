//! Health gate checks

use crate::catalog::{HealthProbes, Probe};
use crate::config::SupervisorConfig;
use std::sync::Arc;

/// Outcome of one gate evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthVerdict {
    pub healthy: bool,
    pub reason: String,
}

impl HealthVerdict {
    fn unhealthy(reason: String) -> Self {
        Self {
            healthy: false,
            reason,
        }
    }

    fn healthy(reason: String) -> Self {
        Self {
            healthy: true,
            reason,
        }
    }
}

/// Read-only pre-flight checks against the server
///
/// Checks run in order and short-circuit on the first failure:
/// connectivity, database count, heap utilisation, page-cache utilisation.
/// The database count is the one signal every server edition can answer; the
/// memory probes refine the verdict where they exist and are skipped (never
/// failed) where they do not.
pub struct HealthGate {
    probes: Arc<dyn HealthProbes>,
    max_databases: usize,
    heap_threshold_percent: u8,
    pagecache_threshold_percent: u8,
}

impl HealthGate {
    pub fn new(probes: Arc<dyn HealthProbes>, config: &SupervisorConfig) -> Self {
        Self {
            probes,
            max_databases: config.max_databases,
            heap_threshold_percent: config.heap_threshold_percent,
            pagecache_threshold_percent: config.pagecache_threshold_percent,
        }
    }

    pub async fn check(&self) -> HealthVerdict {
        // 1. Connectivity
        if let Err(e) = self.probes.ping().await {
            return HealthVerdict::unhealthy(format!("unreachable: {e}"));
        }

        // 2. Database count
        let count = match self.probes.count_databases().await {
            Ok(count) => count,
            Err(e) => return HealthVerdict::unhealthy(format!("unreachable: {e}")),
        };
        if count >= self.max_databases {
            return HealthVerdict::unhealthy(format!(
                "too many databases ({count} >= {})",
                self.max_databases
            ));
        }

        let mut notes: Vec<&str> = Vec::new();

        // 3. Heap utilisation, where the probe exists
        match self.probes.heap_usage().await {
            Ok(Probe::Available(heap)) => {
                let percent = heap.percent();
                if percent >= f64::from(self.heap_threshold_percent) {
                    return HealthVerdict::unhealthy(format!(
                        "heap utilisation {percent:.1}% >= {}%",
                        self.heap_threshold_percent
                    ));
                }
                log::debug!(
                    "heap utilisation {percent:.1}% ({} / {} bytes reachable)",
                    heap.used,
                    heap.used + heap.available
                );
            }
            Ok(Probe::Unavailable) | Err(_) => notes.push("heap probe unavailable"),
        }

        // 4. Page-cache utilisation, where the probe exists
        match self.probes.pagecache_usage().await {
            Ok(Probe::Available(pagecache)) => {
                let percent = pagecache.percent();
                if percent >= f64::from(self.pagecache_threshold_percent) {
                    return HealthVerdict::unhealthy(format!(
                        "page-cache utilisation {percent:.1}% >= {}%",
                        self.pagecache_threshold_percent
                    ));
                }
            }
            Ok(Probe::Unavailable) | Err(_) => {}
        }

        if notes.is_empty() {
            HealthVerdict::healthy("healthy".to_string())
        } else {
            HealthVerdict::healthy(format!("healthy ({})", notes.join(", ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{HeapUsage, MemoryCatalog, PagecacheUsage};
    use crate::config::SupervisorConfig;

    fn gate_with(catalog: Arc<MemoryCatalog>, config: &SupervisorConfig) -> HealthGate {
        HealthGate::new(catalog, config)
    }

    #[tokio::test]
    async fn test_healthy_when_probes_unavailable() {
        // No memory probes at all must still pass the gate
        let catalog = MemoryCatalog::new();
        let gate = gate_with(catalog, &SupervisorConfig::default());

        let verdict = gate.check().await;
        assert!(verdict.healthy, "got: {}", verdict.reason);
        assert!(verdict.reason.contains("heap probe unavailable"));
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_gate() {
        let catalog = MemoryCatalog::new();
        catalog.set_unreachable(Some("connection refused"));
        let gate = gate_with(catalog, &SupervisorConfig::default());

        let verdict = gate.check().await;
        assert!(!verdict.healthy);
        assert!(verdict.reason.starts_with("unreachable:"), "got: {}", verdict.reason);
    }

    #[tokio::test]
    async fn test_too_many_databases_fails_gate() {
        let catalog = MemoryCatalog::new();
        catalog.insert_database("t1-100");
        catalog.insert_database("t2-100");

        let config = SupervisorConfig {
            max_databases: 2,
            ..SupervisorConfig::default()
        };
        let gate = gate_with(catalog, &config);

        let verdict = gate.check().await;
        assert!(!verdict.healthy);
        assert_eq!(verdict.reason, "too many databases (2 >= 2)");
    }

    #[tokio::test]
    async fn test_heap_pressure_fails_gate() {
        let catalog = MemoryCatalog::new();
        catalog.set_heap(Some(HeapUsage {
            used: 90,
            committed: 95,
            available: 10,
        }));
        let gate = gate_with(catalog, &SupervisorConfig::default());

        let verdict = gate.check().await;
        assert!(!verdict.healthy);
        assert!(verdict.reason.contains("heap utilisation"), "got: {}", verdict.reason);
    }

    #[tokio::test]
    async fn test_heap_below_threshold_passes() {
        let catalog = MemoryCatalog::new();
        catalog.set_heap(Some(HeapUsage {
            used: 40,
            committed: 60,
            available: 60,
        }));
        let gate = gate_with(catalog, &SupervisorConfig::default());

        let verdict = gate.check().await;
        assert!(verdict.healthy);
        // Probe was available, so no unavailability note
        assert_eq!(verdict.reason, "healthy");
    }

    #[tokio::test]
    async fn test_pagecache_pressure_fails_gate() {
        let catalog = MemoryCatalog::new();
        catalog.set_heap(Some(HeapUsage {
            used: 10,
            committed: 50,
            available: 90,
        }));
        catalog.set_pagecache(Some(PagecacheUsage { used: 99, max: 100 }));
        let gate = gate_with(catalog, &SupervisorConfig::default());

        let verdict = gate.check().await;
        assert!(!verdict.healthy);
        assert!(verdict.reason.contains("page-cache utilisation"));
    }

    #[tokio::test]
    async fn test_database_count_checked_before_memory() {
        // Count failure short-circuits: heap pressure is never consulted
        let catalog = MemoryCatalog::new();
        catalog.insert_database("t1-100");
        catalog.set_heap(Some(HeapUsage {
            used: 99,
            committed: 100,
            available: 1,
        }));

        let config = SupervisorConfig {
            max_databases: 1,
            ..SupervisorConfig::default()
        };
        let gate = gate_with(catalog, &config);

        let verdict = gate.check().await;
        assert!(verdict.reason.starts_with("too many databases"));
    }
}
