//! Experiment lifecycle errors.
//!
//! Only validation and the orchestrator's own persistence surface here.
//! Per-backend failures are reported in outcome maps, never as errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Experiment name failed the `[A-Za-z0-9_]+` grammar check.
    #[error("Invalid experiment name '{0}': only letters, digits and underscore are allowed")]
    InvalidName(String),

    #[error("Schema template not found: {0}")]
    TemplateNotFound(String),

    #[error("Experiment already exists: {0}")]
    AlreadyExists(String),

    #[error("Experiment not found: {0}")]
    NotFound(String),

    /// Destructive operation attempted without `force`.
    #[error("Deleting experiment '{0}' requires explicit confirmation")]
    ConfirmationRequired(String),

    #[error("Descriptor persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
