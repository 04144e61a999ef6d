//! Directory-tree blob store rooted at a local path.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::{debug, info};
use walkdir::WalkDir;

use ragbench_protocols::{BackendError, BlobAdapter, BlobStat};

/// Blob store backed by a local directory.
///
/// Every path is relative to the root; absolute paths and `..` components
/// are rejected before touching the filesystem.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Open the store, creating the root directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;
        debug!("LocalBlobStore opened at {:?}", root);
        Ok(Self { root })
    }

    /// Resolve a store-relative path, refusing anything that escapes the root.
    fn resolve(&self, path: &str) -> Result<PathBuf, BackendError> {
        let relative = Path::new(path);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(BackendError::InvalidPath(format!(
                        "path '{}' escapes the blob store root",
                        path
                    )));
                }
            }
        }
        Ok(self.root.join(relative))
    }

    async fn check_root(&self) -> Result<(), BackendError> {
        match fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(BackendError::Unreachable(format!(
                "blob root {:?} is not a directory",
                self.root
            ))),
            Err(e) => Err(BackendError::Unreachable(format!(
                "blob root {:?}: {}",
                self.root, e
            ))),
        }
    }

    fn tree_size(path: &Path) -> u64 {
        WalkDir::new(path)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.metadata().ok())
            .map(|m| m.len())
            .sum()
    }

    fn copy_dir(src: &Path, dst: &Path) -> Result<u64, BackendError> {
        std::fs::create_dir_all(dst).map_err(|e| BackendError::OperationFailed(e.to_string()))?;

        let mut copied = 0;
        for entry in WalkDir::new(src).sort_by_file_name() {
            let entry = entry.map_err(|e| BackendError::OperationFailed(e.to_string()))?;
            let relative = entry
                .path()
                .strip_prefix(src)
                .map_err(|e| BackendError::OperationFailed(e.to_string()))?;
            let target = dst.join(relative);

            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&target)
                    .map_err(|e| BackendError::OperationFailed(e.to_string()))?;
            } else if entry.file_type().is_file() {
                std::fs::copy(entry.path(), &target)
                    .map_err(|e| BackendError::OperationFailed(e.to_string()))?;
                copied += 1;
            }
        }
        Ok(copied)
    }
}

#[async_trait]
impl BlobAdapter for LocalBlobStore {
    async fn ensure_dir(&self, path: &str) -> Result<(), BackendError> {
        let full = self.resolve(path)?;
        self.check_root().await?;
        fs::create_dir_all(&full)
            .await
            .map_err(|e| BackendError::OperationFailed(e.to_string()))
    }

    async fn remove_tree(&self, path: &str) -> Result<(), BackendError> {
        let full = self.resolve(path)?;
        if full == self.root {
            return Err(BackendError::InvalidPath(
                "refusing to remove the blob store root".to_string(),
            ));
        }
        self.check_root().await?;

        match fs::remove_dir_all(&full).await {
            Ok(()) => {
                info!("Removed blob tree: {}", path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BackendError::OperationFailed(e.to_string())),
        }
    }

    async fn copy_tree(&self, src: &str, dst: &Path) -> Result<u64, BackendError> {
        let source = self.resolve(src)?;
        self.check_root().await?;

        if !fs::try_exists(&source).await.unwrap_or(false) {
            debug!("Blob source {} missing, nothing to copy", src);
            return Ok(0);
        }

        let dst = dst.to_path_buf();
        let copied = tokio::task::spawn_blocking(move || Self::copy_dir(&source, &dst))
            .await
            .map_err(|e| BackendError::OperationFailed(e.to_string()))??;
        debug!("Copied {} blob files from {}", copied, src);
        Ok(copied)
    }

    async fn exists(&self, path: &str) -> Result<bool, BackendError> {
        let full = self.resolve(path)?;
        self.check_root().await?;
        Ok(fs::try_exists(&full).await.unwrap_or(false))
    }

    async fn stat(&self, path: &str) -> Result<BlobStat, BackendError> {
        let full = self.resolve(path)?;
        self.check_root().await?;

        let meta = match fs::metadata(&full).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BackendError::NotFound(path.to_string()));
            }
            Err(e) => return Err(BackendError::OperationFailed(e.to_string())),
        };

        let modified = meta.modified().ok().map(DateTime::<Utc>::from);
        let size = if meta.is_dir() {
            tokio::task::spawn_blocking(move || Self::tree_size(&full))
                .await
                .map_err(|e| BackendError::OperationFailed(e.to_string()))?
        } else {
            meta.len()
        };

        Ok(BlobStat {
            size,
            modified,
            is_dir: meta.is_dir(),
        })
    }

    async fn list_dirs(&self, path: &str) -> Result<Vec<String>, BackendError> {
        let full = self.resolve(path)?;
        self.check_root().await?;

        let mut entries = match fs::read_dir(&full).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BackendError::NotFound(path.to_string()));
            }
            Err(e) => return Err(BackendError::OperationFailed(e.to_string())),
        };

        let mut dirs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| BackendError::OperationFailed(e.to_string()))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                if let Some(name) = entry.file_name().to_str() {
                    dirs.push(name.to_string());
                }
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    fn root(&self) -> PathBuf {
        self.root.clone()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
