//! Scanner error types

use crate::core::error_handling::ContextualError;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Snapshot root does not exist or is not a directory: {path}")]
    RootMissing { path: String },

    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ContextualError for ScanError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, ScanError::RootMissing { .. })
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}
