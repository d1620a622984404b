//! Snapshot discovery
//!
//! Walks the snapshot root (`{root}/{tenant}/{timestamp}/`) and reports every
//! structurally complete snapshot found. The scanner is a pure function of
//! the filesystem at call time; remembering what has already been seen is the
//! task queue's job.

mod error;
mod types;
mod walk;

pub use error::ScanError;
pub use types::DiscoveredSnapshot;
pub use walk::scan;
