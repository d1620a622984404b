//! Supervisor error types

use crate::catalog::CatalogError;
use crate::core::error_handling::ContextualError;

#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("Could not connect to graph server: {source}. Check the [server] configuration.")]
    StartupProbe {
        #[source]
        source: CatalogError,
    },

    #[error("Snapshot root does not exist or is not a directory: {path}")]
    SnapshotRootMissing { path: String },
}

impl ContextualError for SupervisorError {
    fn is_user_actionable(&self) -> bool {
        // Both startup failures point at configuration or environment the
        // operator controls
        true
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}
