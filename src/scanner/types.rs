//! Scanner output types

use std::path::PathBuf;

/// One structurally complete snapshot found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredSnapshot {
    pub tenant: String,
    pub timestamp: u64,
    pub path: PathBuf,
}
