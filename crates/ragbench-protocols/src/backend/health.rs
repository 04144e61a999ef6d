//! Backend kinds and health reporting.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BackendError;
use crate::types::Metadata;

/// The three backends of an experiment, in lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Relational,
    Vector,
    Blob,
}

impl BackendKind {
    /// Fixed order used by create, delete and backup.
    pub const ALL: [BackendKind; 3] = [Self::Relational, Self::Vector, Self::Blob];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relational => "relational",
            Self::Vector => "vector",
            Self::Blob => "blob",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Reachable but erroring.
    Unhealthy,
    /// Unreachable or not configured.
    Disconnected,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy => write!(f, "unhealthy"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Health of one backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendHealth {
    pub status: HealthStatus,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl BackendHealth {
    pub fn healthy(detail: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            detail: detail.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn unhealthy(detail: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            detail: detail.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn disconnected(detail: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Disconnected,
            detail: detail.into(),
            metadata: Metadata::new(),
        }
    }

    /// Unreachable maps to disconnected, any other error to unhealthy.
    pub fn from_error(err: &BackendError) -> Self {
        if err.is_unreachable() {
            Self::disconnected(err.to_string())
        } else {
            Self::unhealthy(err.to_string())
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_order() {
        assert_eq!(
            BackendKind::ALL,
            [BackendKind::Relational, BackendKind::Vector, BackendKind::Blob]
        );
    }

    #[test]
    fn test_backend_kind_serde() {
        let json = serde_json::to_string(&BackendKind::Vector).unwrap();
        assert_eq!(json, "\"vector\"");
        assert_eq!(BackendKind::Blob.to_string(), "blob");
    }

    #[test]
    fn test_from_error_mapping() {
        let down = BackendHealth::from_error(&BackendError::Unreachable("refused".into()));
        assert_eq!(down.status, HealthStatus::Disconnected);

        let broken = BackendHealth::from_error(&BackendError::OperationFailed("bad".into()));
        assert_eq!(broken.status, HealthStatus::Unhealthy);
        assert!(broken.detail.contains("bad"));
    }

    #[test]
    fn test_health_metadata() {
        let health = BackendHealth::healthy("ok").with_metadata("experiments_count", 3);
        assert!(health.is_healthy());
        assert_eq!(health.metadata.get("experiments_count"), Some(&serde_json::json!(3)));
    }
}
