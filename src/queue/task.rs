//! Deployment task types

use crate::catalog::names;
use crate::scanner::DiscoveredSnapshot;
use std::path::PathBuf;
use std::time::Duration;

/// Identity of a deployment within the admission set
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskKey {
    pub tenant: String,
    pub timestamp: u64,
}

impl std::fmt::Display for TaskKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.tenant, self.timestamp)
    }
}

/// One snapshot load travelling through the queue and a worker
#[derive(Debug, Clone)]
pub struct SnapshotTask {
    pub tenant: String,
    pub timestamp: u64,
    pub data_path: PathBuf,
    pub retry_count: u32,
    pub last_error: Option<String>,
}

impl SnapshotTask {
    pub fn key(&self) -> TaskKey {
        TaskKey {
            tenant: self.tenant.clone(),
            timestamp: self.timestamp,
        }
    }

    /// Name of the server-side database this task deploys
    pub fn database_name(&self) -> String {
        names::database_name(&self.tenant, self.timestamp)
    }
}

impl From<DiscoveredSnapshot> for SnapshotTask {
    fn from(snapshot: DiscoveredSnapshot) -> Self {
        Self {
            tenant: snapshot.tenant,
            timestamp: snapshot.timestamp,
            data_path: snapshot.path,
            retry_count: 0,
            last_error: None,
        }
    }
}

/// Terminal decision of one worker pass over a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    Retrying { delay: Duration },
    Abandoned { reason: String },
}
