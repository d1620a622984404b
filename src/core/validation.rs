//! Validation utilities for configuration and CLI values

use crate::core::error_handling::ContextualError;
use std::error::Error;
use std::fmt;

/// Error type for validation failures
///
/// Always user-actionable: the message names the offending option and the
/// accepted range.
#[derive(Debug)]
pub struct ValidationError {
    details: String,
}

impl ValidationError {
    pub fn new(msg: &str) -> ValidationError {
        ValidationError {
            details: msg.to_string(),
        }
    }

    pub fn details(&self) -> &str {
        &self.details
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.details)
    }
}

impl Error for ValidationError {}

impl ContextualError for ValidationError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        Some(&self.details)
    }
}

impl From<String> for ValidationError {
    fn from(msg: String) -> Self {
        ValidationError { details: msg }
    }
}

impl From<&str> for ValidationError {
    fn from(msg: &str) -> Self {
        ValidationError {
            details: msg.to_string(),
        }
    }
}

/// Require a value to be at least `min`
pub fn require_at_least(name: &str, value: u64, min: u64) -> Result<(), ValidationError> {
    if value < min {
        return Err(ValidationError::new(&format!(
            "{name} must be >= {min} (got {value})"
        )));
    }
    Ok(())
}

/// Require a percentage threshold in (0, 100]
pub fn require_percent(name: &str, value: u8) -> Result<(), ValidationError> {
    if value == 0 || value > 100 {
        return Err(ValidationError::new(&format!(
            "{name} must be a percentage between 1 and 100 (got {value})"
        )));
    }
    Ok(())
}

/// Require a non-empty string option
pub fn require_non_empty(name: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(&format!("{name} must not be empty")));
    }
    Ok(())
}
