//! Lifecycle, retrieval and logging configuration types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::default_home;

/// Lifecycle orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// One YAML descriptor per experiment plus the active selection file.
    #[serde(default = "default_descriptors_dir")]
    pub descriptors_dir: PathBuf,

    /// One YAML file per schema template.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,

    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    /// Attempts per adapter call when the backend is unreachable.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: usize,

    /// Initial backoff delay between attempts.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            descriptors_dir: default_descriptors_dir(),
            templates_dir: default_templates_dir(),
            backup_dir: default_backup_dir(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_descriptors_dir() -> PathBuf {
    default_home().join("experiments")
}

fn default_templates_dir() -> PathBuf {
    default_home().join("schemas")
}

fn default_backup_dir() -> PathBuf {
    default_home().join("backups")
}

fn default_retry_attempts() -> usize {
    3
}

fn default_retry_delay_ms() -> u64 {
    200
}

/// Where semantic hits look up their text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLookupConfig {
    #[serde(default = "default_lookup_table")]
    pub table: String,

    #[serde(default = "default_lookup_key")]
    pub key_column: String,

    #[serde(default = "default_lookup_content")]
    pub content_column: String,
}

impl Default for ContentLookupConfig {
    fn default() -> Self {
        Self {
            table: default_lookup_table(),
            key_column: default_lookup_key(),
            content_column: default_lookup_content(),
        }
    }
}

fn default_lookup_table() -> String {
    "chunks".to_string()
}

fn default_lookup_key() -> String {
    "id".to_string()
}

fn default_lookup_content() -> String {
    "text".to_string()
}

/// Retrieval engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f32,

    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f32,

    /// Raw SQL pass-through is refused unless enabled.
    #[serde(default)]
    pub allow_custom_sql: bool,

    /// Logical name to physical table used when a query has no mapping.
    #[serde(default = "default_table_mapping")]
    pub table_mapping: BTreeMap<String, String>,

    #[serde(default)]
    pub content_lookup: ContentLookupConfig,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            semantic_weight: default_semantic_weight(),
            keyword_weight: default_keyword_weight(),
            allow_custom_sql: false,
            table_mapping: default_table_mapping(),
            content_lookup: ContentLookupConfig::default(),
        }
    }
}

fn default_top_k() -> usize {
    10
}

fn default_semantic_weight() -> f32 {
    0.6
}

fn default_keyword_weight() -> f32 {
    0.4
}

pub fn default_table_mapping() -> BTreeMap<String, String> {
    [
        ("users", "users"),
        ("documents", "documents"),
        ("chunks", "chunks"),
        ("vectors", "embeddings"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,

    /// Daily rolling log files are written here when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            log_dir: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
