//! Backend and embedding configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{default_home, default_true};

/// Relational store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationalConfig {
    /// Directory holding one database file per namespace.
    #[serde(default = "default_relational_dir")]
    pub data_dir: PathBuf,

    /// Prefix shared by every experiment namespace.
    #[serde(default = "default_namespace_prefix")]
    pub namespace_prefix: String,
}

impl Default for RelationalConfig {
    fn default() -> Self {
        Self {
            data_dir: default_relational_dir(),
            namespace_prefix: default_namespace_prefix(),
        }
    }
}

fn default_relational_dir() -> PathBuf {
    default_home().join("relational")
}

fn default_namespace_prefix() -> String {
    "knowledge_rag_".to_string()
}

/// Vector index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    /// When false no vector adapter is opened and the backend reports disconnected.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_vector_dir")]
    pub data_dir: PathBuf,

    /// "cosine" or "l2".
    #[serde(default = "default_metric")]
    pub metric: String,

    #[serde(default = "default_dimension")]
    pub dimension: usize,

    #[serde(default = "default_collection_suffix")]
    pub collection_suffix: String,

    /// Bound on one embed + search round trip.
    #[serde(default = "default_vector_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            data_dir: default_vector_dir(),
            metric: default_metric(),
            dimension: default_dimension(),
            collection_suffix: default_collection_suffix(),
            timeout_ms: default_vector_timeout_ms(),
        }
    }
}

fn default_vector_dir() -> PathBuf {
    default_home().join("vector")
}

fn default_metric() -> String {
    "cosine".to_string()
}

fn default_dimension() -> usize {
    1536
}

fn default_collection_suffix() -> String {
    "_documents".to_string()
}

fn default_vector_timeout_ms() -> u64 {
    5_000
}

/// Blob store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    #[serde(default = "default_blob_path")]
    pub base_path: PathBuf,

    /// Subdirectory holding one directory per experiment.
    #[serde(default = "default_experiments_dir")]
    pub experiments_dir: String,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            base_path: default_blob_path(),
            experiments_dir: default_experiments_dir(),
        }
    }
}

fn default_blob_path() -> PathBuf {
    default_home().join("blob")
}

fn default_experiments_dir() -> String {
    "experiments".to_string()
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "hash" (local, deterministic) or "openai" (any compatible endpoint).
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_dimension")]
    pub dimension: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            dimension: default_dimension(),
            base_url: None,
            api_key: None,
            timeout_ms: default_embedding_timeout_ms(),
        }
    }
}

fn default_provider() -> String {
    "hash".to_string()
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_timeout_ms() -> u64 {
    30_000
}
