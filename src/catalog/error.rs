//! Catalog and loader error types

use crate::core::error_handling::ContextualError;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server rejected statement ({code}): {message}")]
    Api { code: String, message: String },

    #[error("malformed server response: {0}")]
    Malformed(String),

    #[error("server unreachable: {0}")]
    Unreachable(String),
}

impl ContextualError for CatalogError {
    fn is_user_actionable(&self) -> bool {
        // Connection problems are fixable by the operator (host, port,
        // credentials); statement-level failures are not
        matches!(
            self,
            CatalogError::Transport(_) | CatalogError::Unreachable(_)
        )
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

/// Failure of one bulk-load invocation
///
/// The worker's retry engine branches on the classification: transient
/// failures consume retry budget, permanent ones abandon the task outright.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("transient load failure: {0}")]
    Transient(String),

    #[error("permanent load failure: {0}")]
    Permanent(String),
}

impl LoadError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, LoadError::Transient(_))
    }
}
