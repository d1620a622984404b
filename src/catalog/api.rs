//! Collaborator traits and probe types

use crate::catalog::{CatalogError, LoadError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;

/// Result of a single health probe
///
/// `Unavailable` is a first-class answer: memory probes only exist on some
/// server editions, and their absence must never veto a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe<T> {
    Available(T),
    Unavailable,
}

/// Heap usage sample in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapUsage {
    pub used: u64,
    pub committed: u64,
    pub available: u64,
}

impl HeapUsage {
    /// Utilisation as a percentage of the reachable heap
    pub fn percent(&self) -> f64 {
        let reachable = self.used + self.available;
        if reachable == 0 {
            return 0.0;
        }
        (self.used as f64 / reachable as f64) * 100.0
    }
}

/// Page-cache usage sample in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagecacheUsage {
    pub used: u64,
    pub max: u64,
}

impl PagecacheUsage {
    pub fn percent(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        (self.used as f64 / self.max as f64) * 100.0
    }
}

/// Database and alias management on the graph server
///
/// All operations address the server's system catalog. Drops are idempotent:
/// dropping an absent database or alias succeeds.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Trivial round trip against the system catalog
    async fn ping(&self) -> Result<(), CatalogError>;

    /// Names of all user databases (the system database excluded)
    async fn list_databases(&self) -> Result<Vec<String>, CatalogError>;

    /// All aliases and the databases they point to
    async fn list_aliases(&self) -> Result<BTreeMap<String, String>, CatalogError>;

    /// Create or repoint an alias; idempotent
    async fn set_alias(&self, alias: &str, target: &str) -> Result<(), CatalogError>;

    /// Drop an alias; absent aliases are ignored
    async fn drop_alias(&self, alias: &str) -> Result<(), CatalogError>;

    /// Drop a database; absent databases are ignored
    async fn drop_database(&self, name: &str) -> Result<(), CatalogError>;
}

/// Read-only probes consulted by the health gate
#[async_trait]
pub trait HealthProbes: Send + Sync {
    /// Trivial connectivity round trip
    async fn ping(&self) -> Result<(), CatalogError>;

    /// Number of user databases
    async fn count_databases(&self) -> Result<usize, CatalogError>;

    /// Heap usage, where the server edition exposes it
    async fn heap_usage(&self) -> Result<Probe<HeapUsage>, CatalogError>;

    /// Page-cache usage, where the server edition exposes it
    async fn pagecache_usage(&self) -> Result<Probe<PagecacheUsage>, CatalogError>;
}

/// The opaque bulk-load call
///
/// Loads the snapshot at `data_path` into the database named
/// `{tenant}-{timestamp}`, creating it. The loader is expected to detect and
/// clean up partial state left by a previous failed attempt, so re-invoking
/// after a failure is safe.
#[async_trait]
pub trait SnapshotLoader: Send + Sync {
    async fn load(&self, tenant: &str, timestamp: u64, data_path: &Path)
        -> Result<(), LoadError>;
}
