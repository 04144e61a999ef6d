//! Workbench errors.

use thiserror::Error;

use ragbench_config::ConfigError;
use ragbench_protocols::{
    BackendError, EmbeddingError, LifecycleError, RetrievalError, TemplateError,
};

/// Anything that can go wrong while wiring or driving the workbench.
#[derive(Debug, Error)]
pub enum WorkbenchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}
