//! Blob store adapter.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BackendError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobStat {
    /// Total size in bytes; recursive for directories.
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    pub is_dir: bool,
}

/// A directory-tree blob store.
///
/// Paths are relative to [`BlobAdapter::root`] and must not escape it.
#[async_trait]
pub trait BlobAdapter: Send + Sync {
    /// Create a directory and its parents. Existing directories are fine.
    async fn ensure_dir(&self, path: &str) -> Result<(), BackendError>;

    /// Remove a directory tree. Removing a missing tree succeeds.
    async fn remove_tree(&self, path: &str) -> Result<(), BackendError>;

    /// Copy a tree out of the store to a local destination.
    ///
    /// Returns the number of files copied; a missing source copies nothing.
    async fn copy_tree(&self, src: &str, dst: &Path) -> Result<u64, BackendError>;

    async fn exists(&self, path: &str) -> Result<bool, BackendError>;

    async fn stat(&self, path: &str) -> Result<BlobStat, BackendError>;

    /// Names of the immediate subdirectories, sorted.
    async fn list_dirs(&self, path: &str) -> Result<Vec<String>, BackendError>;

    fn root(&self) -> PathBuf;
}
