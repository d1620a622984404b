//! Graph server collaborators
//!
//! The supervisor never speaks to the graph server directly; it goes through
//! three capability seams defined here:
//!
//! - [`Catalog`] — database/alias management (`SHOW DATABASES`, alias ops,
//!   idempotent drops)
//! - [`HealthProbes`] — the read-only probes behind the health gate
//! - [`SnapshotLoader`] — the opaque bulk-load call for one snapshot
//!
//! Production implementations are [`HttpCatalog`] (the server's HTTP
//! transaction endpoint) and [`CommandLoader`] (an external bulk-load
//! process). [`MemoryCatalog`] / [`MemoryLoader`] are deterministic in-memory
//! substitutes for the test suite.

mod api;
mod command;
mod error;
mod http;
mod memory;
pub(crate) mod names;

pub use api::{Catalog, HealthProbes, HeapUsage, PagecacheUsage, Probe, SnapshotLoader};
pub use command::CommandLoader;
pub use error::{CatalogError, LoadError};
pub use http::HttpCatalog;
pub use memory::{MemoryCatalog, MemoryLoader};
pub use names::{database_name, parse_database_name, tenant_databases};
