//! Persistent local implementation of [`VectorIndexAdapter`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::fs;
use tracing::{debug, info, warn};

use ragbench_protocols::{
    is_valid_identifier, BackendError, VectorFilter, VectorHit, VectorIndexAdapter, VectorRecord,
};

use crate::index::{CollectionIndex, VectorMetric};

/// Local vector index.
///
/// ```text
/// {data_dir}/
/// ├── knowledge_rag_exp1_documents.json
/// └── ...
/// ```
pub struct LocalVectorIndex {
    data_dir: PathBuf,
    metric: VectorMetric,
    collections: RwLock<HashMap<String, CollectionIndex>>,
}

impl LocalVectorIndex {
    /// Open the index, loading every persisted collection.
    pub async fn open(data_dir: impl Into<PathBuf>, metric: VectorMetric) -> Result<Self, BackendError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;

        let mut collections = HashMap::new();
        let mut entries = fs::read_dir(&data_dir)
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| BackendError::OperationFailed(e.to_string()))?
        {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            match Self::read_collection(&path).await {
                Ok(collection) => {
                    collections.insert(collection.name.clone(), collection);
                }
                Err(e) => warn!("Skipping unreadable collection file {:?}: {}", path, e),
            }
        }

        debug!(
            "LocalVectorIndex opened at {:?} with {} collections",
            data_dir,
            collections.len()
        );
        Ok(Self {
            data_dir,
            metric,
            collections: RwLock::new(collections),
        })
    }

    pub fn metric(&self) -> VectorMetric {
        self.metric
    }

    async fn read_collection(path: &Path) -> Result<CollectionIndex, BackendError> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| BackendError::OperationFailed(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| BackendError::OperationFailed(e.to_string()))
    }

    fn collection_path(&self, name: &str) -> Result<PathBuf, BackendError> {
        if !is_valid_identifier(name) {
            return Err(BackendError::InvalidPath(format!(
                "invalid collection name '{}'",
                name
            )));
        }
        Ok(self.data_dir.join(format!("{}.json", name)))
    }

    /// Write the in-memory state of one collection to disk.
    async fn persist(&self, name: &str) -> Result<(), BackendError> {
        let path = self.collection_path(name)?;
        let json = {
            let collections = self.collections.read();
            let collection = collections
                .get(name)
                .ok_or_else(|| BackendError::NotFound(format!("collection {}", name)))?;
            serde_json::to_string(collection)
                .map_err(|e| BackendError::OperationFailed(e.to_string()))?
        };
        fs::write(&path, json)
            .await
            .map_err(|e| BackendError::OperationFailed(e.to_string()))
    }

    /// Number of records in a collection.
    pub fn count(&self, name: &str) -> Option<usize> {
        self.collections.read().get(name).map(CollectionIndex::len)
    }
}

#[async_trait]
impl VectorIndexAdapter for LocalVectorIndex {
    async fn create_collection(&self, name: &str, dimension: usize) -> Result<(), BackendError> {
        self.collection_path(name)?;
        if dimension == 0 {
            return Err(BackendError::OperationFailed(
                "dimension must be greater than 0".to_string(),
            ));
        }

        {
            let mut collections = self.collections.write();
            if let Some(existing) = collections.get(name) {
                if existing.dimension != dimension {
                    return Err(BackendError::OperationFailed(format!(
                        "collection {} exists with dimension {}",
                        name, existing.dimension
                    )));
                }
                debug!("Collection {} already exists", name);
                return Ok(());
            }
            collections.insert(
                name.to_string(),
                CollectionIndex::new(name, dimension, self.metric),
            );
        }

        self.persist(name).await?;
        info!("Created vector collection: {} (dim {}, {})", name, dimension, self.metric);
        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> Result<(), BackendError> {
        let path = self.collection_path(name)?;
        self.collections.write().remove(name);

        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Dropped vector collection: {}", name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BackendError::OperationFailed(e.to_string())),
        }
    }

    async fn has_collection(&self, name: &str) -> Result<bool, BackendError> {
        Ok(self.collections.read().contains_key(name))
    }

    async fn upsert(&self, name: &str, records: Vec<VectorRecord>) -> Result<usize, BackendError> {
        let count = {
            let mut collections = self.collections.write();
            let collection = collections
                .get_mut(name)
                .ok_or_else(|| BackendError::NotFound(format!("collection {}", name)))?;
            collection.upsert(records)?
        };
        self.persist(name).await?;
        debug!("Upserted {} records into {}", count, name);
        Ok(count)
    }

    async fn search(
        &self,
        name: &str,
        vector: &[f32],
        top_k: usize,
        filter: Option<&VectorFilter>,
    ) -> Result<Vec<VectorHit>, BackendError> {
        let collections = self.collections.read();
        let collection = collections
            .get(name)
            .ok_or_else(|| BackendError::NotFound(format!("collection {}", name)))?;
        collection.search(vector, top_k, filter)
    }

    async fn version(&self) -> Result<String, BackendError> {
        if !fs::try_exists(&self.data_dir).await.unwrap_or(false) {
            return Err(BackendError::Unreachable(format!(
                "data directory {:?} is missing",
                self.data_dir
            )));
        }
        Ok(format!("local-vector-index {}", env!("CARGO_PKG_VERSION")))
    }
}

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;
