//! Retrieval engine errors.

use thiserror::Error;

use super::BackendError;

/// Request-level retrieval failures.
///
/// Backend trouble during a search degrades the result instead of raising,
/// so these are limited to malformed or forbidden requests.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Unsupported search strategy: {0}")]
    UnsupportedStrategy(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Raw SQL was submitted while the custom strategy is disabled.
    #[error("Trust boundary violation: {0}")]
    TrustBoundaryViolation(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_strategy_display() {
        let err = RetrievalError::UnsupportedStrategy("fuzzy".to_string());
        assert!(err.to_string().contains("fuzzy"));
    }

    #[test]
    fn test_backend_error_from() {
        let err = RetrievalError::from(BackendError::Unreachable("down".to_string()));
        assert!(err.to_string().contains("down"));
    }
}
