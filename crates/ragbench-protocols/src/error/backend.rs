//! Backend adapter errors.

use thiserror::Error;

/// Error raised by a single backend adapter call.
///
/// Lifecycle operations record these per backend instead of propagating them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend could not be reached at all.
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    /// The backend was reachable but the operation errored.
    #[error("Backend operation failed: {0}")]
    OperationFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A blob path escaped the store root or was otherwise malformed.
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl BackendError {
    /// Connectivity failures are worth retrying, everything else is not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}
