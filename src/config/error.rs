//! Configuration error types

use crate::core::error_handling::ContextualError;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Could not read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse configuration file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Environment variable '{name}' is not set and has no default")]
    MissingEnvVar { name: String },

    #[error("{0}")]
    Invalid(#[from] crate::core::validation::ValidationError),
}

impl ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        // Every configuration problem is fixable by the operator
        true
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ConfigError::Invalid(e) => Some(e.details()),
            // The Display impl already names the path/variable; surfacing it
            // verbatim is the most actionable message we have
            _ => None,
        }
    }
}
