//! Per-backend outcome reporting for lifecycle operations.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use ragbench_protocols::{BackendError, BackendHealth, BackendKind, ExperimentDescriptor};

/// Result of one lifecycle step against one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BackendOutcome {
    Succeeded { detail: String },
    Failed { error: String, disconnected: bool },
    /// The backend is not configured for this workbench.
    Skipped { reason: String },
}

impl BackendOutcome {
    pub fn succeeded(detail: impl Into<String>) -> Self {
        Self::Succeeded {
            detail: detail.into(),
        }
    }

    pub fn failed(error: &BackendError) -> Self {
        Self::Failed {
            error: error.to_string(),
            disconnected: error.is_unreachable(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn from_result(result: Result<String, BackendError>) -> Self {
        match result {
            Ok(detail) => Self::succeeded(detail),
            Err(e) => Self::failed(&e),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Outcomes keyed by backend, iterated in lifecycle order.
pub type OutcomeMap = BTreeMap<BackendKind, BackendOutcome>;

#[derive(Debug, Clone, Serialize)]
pub struct CreateReport {
    /// Descriptor as persisted, existence flags reflect the successes.
    pub descriptor: ExperimentDescriptor,
    pub outcomes: OutcomeMap,
}

impl CreateReport {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.values().all(BackendOutcome::is_success)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteReport {
    pub name: String,
    pub outcomes: OutcomeMap,
    /// Whether the active selection pointed at this experiment and was cleared.
    pub was_active: bool,
}

impl DeleteReport {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.values().all(BackendOutcome::is_success)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupReport {
    pub name: String,
    /// `<destination>/<name>_<YYYYmmdd_HHMMSS>`
    pub path: PathBuf,
    pub outcomes: OutcomeMap,
}

/// One row of `list()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExperimentListing {
    pub name: String,
    pub researcher: String,
    pub template_name: String,
    /// Live existence per backend.
    pub exists: BTreeMap<BackendKind, bool>,
    pub active: bool,
}

impl ExperimentListing {
    pub fn exists_in(&self, kind: BackendKind) -> bool {
        self.exists.get(&kind).copied().unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub backends: BTreeMap<BackendKind, BackendHealth>,
}

impl HealthReport {
    pub fn all_healthy(&self) -> bool {
        self.backends.values().all(BackendHealth::is_healthy)
    }

    pub fn get(&self, kind: BackendKind) -> Option<&BackendHealth> {
        self.backends.get(&kind)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExperimentInfo {
    pub descriptor: ExperimentDescriptor,
    /// Row count per relational table.
    pub table_counts: BTreeMap<String, u64>,
    /// Set when the relational namespace could not be inspected.
    pub relational_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub active: Option<String>,
    pub experiment_count: usize,
    pub template_count: usize,
    pub health: HealthReport,
}
