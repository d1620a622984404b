//! In-memory collaborators for the test suite
//!
//! Deterministic substitutes for the HTTP catalog and the external loader.
//! Both are scriptable: the catalog can report pressure or refuse
//! connections, the loader can fail a set number of times, fail permanently,
//! or stall to simulate a slow bulk load.

use crate::catalog::api::{
    Catalog, HealthProbes, HeapUsage, PagecacheUsage, Probe, SnapshotLoader,
};
use crate::catalog::{names, CatalogError, LoadError};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct CatalogState {
    databases: BTreeSet<String>,
    aliases: BTreeMap<String, String>,
    unreachable: Option<String>,
    heap: Option<HeapUsage>,
    pagecache: Option<PagecacheUsage>,
}

/// In-memory catalog + health probes
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: Mutex<CatalogState>,
}

impl MemoryCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Pre-create a database, as if loaded by an earlier run
    pub fn insert_database(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .databases
            .insert(name.to_string());
    }

    pub fn remove_database(&self, name: &str) {
        self.state.lock().unwrap().databases.remove(name);
    }

    /// Simulate the server refusing connections
    pub fn set_unreachable(&self, reason: Option<&str>) {
        self.state.lock().unwrap().unreachable = reason.map(str::to_string);
    }

    pub fn set_heap(&self, heap: Option<HeapUsage>) {
        self.state.lock().unwrap().heap = heap;
    }

    pub fn set_pagecache(&self, pagecache: Option<PagecacheUsage>) {
        self.state.lock().unwrap().pagecache = pagecache;
    }

    pub fn databases(&self) -> Vec<String> {
        self.state.lock().unwrap().databases.iter().cloned().collect()
    }

    pub fn aliases(&self) -> BTreeMap<String, String> {
        self.state.lock().unwrap().aliases.clone()
    }

    pub fn alias_target(&self, alias: &str) -> Option<String> {
        self.state.lock().unwrap().aliases.get(alias).cloned()
    }

    fn check_reachable(&self) -> Result<(), CatalogError> {
        match &self.state.lock().unwrap().unreachable {
            Some(reason) => Err(CatalogError::Unreachable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn ping(&self) -> Result<(), CatalogError> {
        self.check_reachable()
    }

    async fn list_databases(&self) -> Result<Vec<String>, CatalogError> {
        self.check_reachable()?;
        Ok(self.databases())
    }

    async fn list_aliases(&self) -> Result<BTreeMap<String, String>, CatalogError> {
        self.check_reachable()?;
        Ok(self.aliases())
    }

    async fn set_alias(&self, alias: &str, target: &str) -> Result<(), CatalogError> {
        self.check_reachable()?;
        let mut state = self.state.lock().unwrap();
        if !state.databases.contains(target) {
            return Err(CatalogError::Api {
                code: "Neo.ClientError.Database.DatabaseNotFound".to_string(),
                message: format!("database {target} does not exist"),
            });
        }
        state.aliases.insert(alias.to_string(), target.to_string());
        Ok(())
    }

    async fn drop_alias(&self, alias: &str) -> Result<(), CatalogError> {
        self.check_reachable()?;
        self.state.lock().unwrap().aliases.remove(alias);
        Ok(())
    }

    async fn drop_database(&self, name: &str) -> Result<(), CatalogError> {
        self.check_reachable()?;
        self.state.lock().unwrap().databases.remove(name);
        Ok(())
    }
}

#[async_trait]
impl HealthProbes for MemoryCatalog {
    async fn ping(&self) -> Result<(), CatalogError> {
        self.check_reachable()
    }

    async fn count_databases(&self) -> Result<usize, CatalogError> {
        self.check_reachable()?;
        Ok(self.state.lock().unwrap().databases.len())
    }

    async fn heap_usage(&self) -> Result<Probe<HeapUsage>, CatalogError> {
        self.check_reachable()?;
        Ok(match self.state.lock().unwrap().heap {
            Some(heap) => Probe::Available(heap),
            None => Probe::Unavailable,
        })
    }

    async fn pagecache_usage(&self) -> Result<Probe<PagecacheUsage>, CatalogError> {
        self.check_reachable()?;
        Ok(match self.state.lock().unwrap().pagecache {
            Some(pagecache) => Probe::Available(pagecache),
            None => Probe::Unavailable,
        })
    }
}

type TaskId = (String, u64);

#[derive(Debug, Default)]
struct LoaderScript {
    failures: HashMap<TaskId, VecDeque<LoadError>>,
    delays: HashMap<TaskId, Duration>,
    attempts: Vec<TaskId>,
}

/// In-memory loader that materialises databases in a [`MemoryCatalog`]
#[derive(Debug)]
pub struct MemoryLoader {
    catalog: Arc<MemoryCatalog>,
    script: Mutex<LoaderScript>,
}

impl MemoryLoader {
    pub fn new(catalog: Arc<MemoryCatalog>) -> Arc<Self> {
        Arc::new(Self {
            catalog,
            script: Mutex::new(LoaderScript::default()),
        })
    }

    /// Queue failures to be returned, in order, before attempts succeed
    pub fn fail_next(&self, tenant: &str, timestamp: u64, errors: Vec<LoadError>) {
        self.script
            .lock()
            .unwrap()
            .failures
            .entry((tenant.to_string(), timestamp))
            .or_default()
            .extend(errors);
    }

    /// Make this snapshot's load take a while
    pub fn delay(&self, tenant: &str, timestamp: u64, delay: Duration) {
        self.script
            .lock()
            .unwrap()
            .delays
            .insert((tenant.to_string(), timestamp), delay);
    }

    /// Every load attempt, in invocation order
    pub fn attempts(&self) -> Vec<(String, u64)> {
        self.script.lock().unwrap().attempts.clone()
    }

    pub fn attempt_count(&self, tenant: &str, timestamp: u64) -> usize {
        self.script
            .lock()
            .unwrap()
            .attempts
            .iter()
            .filter(|(t, ts)| t == tenant && *ts == timestamp)
            .count()
    }
}

#[async_trait]
impl SnapshotLoader for MemoryLoader {
    async fn load(
        &self,
        tenant: &str,
        timestamp: u64,
        _data_path: &Path,
    ) -> Result<(), LoadError> {
        let key = (tenant.to_string(), timestamp);

        let (scripted_failure, delay) = {
            let mut script = self.script.lock().unwrap();
            script.attempts.push(key.clone());
            let failure = script
                .failures
                .get_mut(&key)
                .and_then(|queue| queue.pop_front());
            let delay = script.delays.get(&key).copied();
            (failure, delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = scripted_failure {
            return Err(error);
        }

        self.catalog
            .insert_database(&names::database_name(tenant, timestamp));
        Ok(())
    }
}
