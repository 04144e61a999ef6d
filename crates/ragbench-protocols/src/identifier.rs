//! Identifier grammar checks.
//!
//! Experiment names become database, collection and directory names, so they
//! are restricted to `[A-Za-z0-9_]+` before any backend sees them.

use crate::error::LifecycleError;

pub fn is_valid_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn validate_experiment_name(name: &str) -> Result<(), LifecycleError> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(LifecycleError::InvalidName(name.to_string()))
    }
}
