//! Configuration
//!
//! Typed configuration records for the supervisor, loaded from a TOML file
//! with `${VAR}` / `${VAR:default}` environment substitution so credentials
//! can be injected at runtime. Every option has an explicit default and the
//! whole record is validated once at startup.

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::{load_config, substitute_env_vars};
pub use types::{Config, LoaderConfig, ServerConfig, SnapshotsConfig, SupervisorConfig};
