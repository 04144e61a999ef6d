//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod schema_backends;
mod schema_services;

pub use schema_backends::*;
pub use schema_services::*;

/// Shared default helper used by submodules.
pub(crate) fn default_true() -> bool {
    true
}

/// Base directory for on-disk state: `~/.ragbench`.
pub(crate) fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ragbench")
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relational: RelationalConfig,

    #[serde(default)]
    pub vector: VectorConfig,

    #[serde(default)]
    pub blob: BlobConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Point every on-disk location below `root`. Used by tests and demos.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut config = Self::default();
        config.relational.data_dir = root.join("relational");
        config.vector.data_dir = root.join("vector");
        config.blob.base_path = root.join("blob");
        config.lifecycle.descriptors_dir = root.join("experiments");
        config.lifecycle.templates_dir = root.join("schemas");
        config.lifecycle.backup_dir = root.join("backups");
        config
    }

    /// Relational namespace for an experiment, e.g. `knowledge_rag_exp1`.
    pub fn namespace_for(&self, experiment: &str) -> String {
        format!("{}{}", self.relational.namespace_prefix, experiment)
    }

    /// Vector collection for an experiment, e.g. `knowledge_rag_exp1_documents`.
    pub fn collection_for(&self, experiment: &str) -> String {
        format!(
            "{}{}{}",
            self.relational.namespace_prefix, experiment, self.vector.collection_suffix
        )
    }

    /// Blob directory for an experiment relative to the blob root.
    pub fn blob_dir_for(&self, experiment: &str) -> String {
        format!("{}/{}", self.blob.experiments_dir, experiment)
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
