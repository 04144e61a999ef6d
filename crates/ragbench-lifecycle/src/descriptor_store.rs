//! Durable experiment descriptors and the active selection.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use ragbench_protocols::{validate_experiment_name, ExperimentDescriptor, LifecycleError};

/// Persistence for experiment descriptors, keyed by experiment name.
///
/// The store is the single source of truth for which experiments exist and
/// which one is active.
#[async_trait]
pub trait DescriptorStore: Send + Sync {
    /// Insert or replace a descriptor.
    async fn save(&self, descriptor: &ExperimentDescriptor) -> Result<(), LifecycleError>;

    async fn load(&self, name: &str) -> Result<Option<ExperimentDescriptor>, LifecycleError>;

    /// Remove a descriptor. Removing a missing descriptor is not an error.
    async fn delete(&self, name: &str) -> Result<(), LifecycleError>;

    /// All descriptors, sorted by name.
    async fn list(&self) -> Result<Vec<ExperimentDescriptor>, LifecycleError>;

    async fn exists(&self, name: &str) -> Result<bool, LifecycleError> {
        Ok(self.load(name).await?.is_some())
    }

    /// Persist the active selection; `None` clears it.
    async fn set_active(&self, name: Option<&str>) -> Result<(), LifecycleError>;

    async fn active(&self) -> Result<Option<String>, LifecycleError>;
}

/// In-memory descriptor store for testing.
pub struct MemoryDescriptorStore {
    descriptors: RwLock<BTreeMap<String, ExperimentDescriptor>>,
    active: RwLock<Option<String>>,
}

impl MemoryDescriptorStore {
    pub fn new() -> Self {
        Self {
            descriptors: RwLock::new(BTreeMap::new()),
            active: RwLock::new(None),
        }
    }
}

impl Default for MemoryDescriptorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DescriptorStore for MemoryDescriptorStore {
    async fn save(&self, descriptor: &ExperimentDescriptor) -> Result<(), LifecycleError> {
        let mut store = self.descriptors.write().await;
        store.insert(descriptor.name.clone(), descriptor.clone());
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<Option<ExperimentDescriptor>, LifecycleError> {
        Ok(self.descriptors.read().await.get(name).cloned())
    }

    async fn delete(&self, name: &str) -> Result<(), LifecycleError> {
        self.descriptors.write().await.remove(name);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ExperimentDescriptor>, LifecycleError> {
        Ok(self.descriptors.read().await.values().cloned().collect())
    }

    async fn set_active(&self, name: Option<&str>) -> Result<(), LifecycleError> {
        *self.active.write().await = name.map(str::to_string);
        Ok(())
    }

    async fn active(&self) -> Result<Option<String>, LifecycleError> {
        Ok(self.active.read().await.clone())
    }
}

/// Contents of the active-selection file.
#[derive(Debug, Serialize, Deserialize)]
struct ActiveSelection {
    name: String,
    switched_at: DateTime<Utc>,
}

/// File system based descriptor store.
///
/// One YAML file per experiment plus the active selection:
/// ```text
/// {storage_path}/
/// ├── current_experiment.yaml
/// └── descriptors/
///     ├── {name}.yaml
///     └── ...
/// ```
pub struct FileDescriptorStore {
    storage_path: PathBuf,
}

impl FileDescriptorStore {
    /// Open the store, creating its directories if needed.
    pub async fn new(storage_path: impl Into<PathBuf>) -> Result<Self, LifecycleError> {
        let storage_path = storage_path.into();
        fs::create_dir_all(storage_path.join("descriptors")).await?;

        debug!("FileDescriptorStore initialized at {:?}", storage_path);
        Ok(Self { storage_path })
    }

    fn descriptors_dir(&self) -> PathBuf {
        self.storage_path.join("descriptors")
    }

    fn active_path(&self) -> PathBuf {
        self.storage_path.join("current_experiment.yaml")
    }

    fn descriptor_path(&self, name: &str) -> Result<PathBuf, LifecycleError> {
        validate_experiment_name(name)?;
        Ok(self.descriptors_dir().join(format!("{}.yaml", name)))
    }

    async fn read_descriptor(path: &PathBuf) -> Result<ExperimentDescriptor, LifecycleError> {
        let content = fs::read_to_string(path).await?;
        serde_yml::from_str(&content).map_err(|e| {
            LifecycleError::Persistence(format!("Failed to parse {:?}: {}", path, e))
        })
    }
}

#[async_trait]
impl DescriptorStore for FileDescriptorStore {
    async fn save(&self, descriptor: &ExperimentDescriptor) -> Result<(), LifecycleError> {
        let path = self.descriptor_path(&descriptor.name)?;
        let yaml = serde_yml::to_string(descriptor)
            .map_err(|e| LifecycleError::Persistence(e.to_string()))?;

        // Replace atomically via a temp file
        let tmp = path.with_extension("yaml.tmp");
        fs::write(&tmp, yaml).await?;
        fs::rename(&tmp, &path).await?;

        debug!("Saved descriptor {} to {:?}", descriptor.name, path);
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<Option<ExperimentDescriptor>, LifecycleError> {
        let path = self.descriptor_path(name)?;
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        Self::read_descriptor(&path).await.map(Some)
    }

    async fn delete(&self, name: &str) -> Result<(), LifecycleError> {
        let path = self.descriptor_path(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted descriptor {}", name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<ExperimentDescriptor>, LifecycleError> {
        let mut descriptors = Vec::new();
        let mut entries = fs::read_dir(self.descriptors_dir()).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            match Self::read_descriptor(&path).await {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(e) => warn!("Skipping unreadable descriptor {:?}: {}", path, e),
            }
        }

        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(descriptors)
    }

    async fn set_active(&self, name: Option<&str>) -> Result<(), LifecycleError> {
        let path = self.active_path();
        match name {
            Some(name) => {
                let selection = ActiveSelection {
                    name: name.to_string(),
                    switched_at: Utc::now(),
                };
                let yaml = serde_yml::to_string(&selection)
                    .map_err(|e| LifecycleError::Persistence(e.to_string()))?;
                fs::write(&path, yaml).await?;
            }
            None => match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }

    async fn active(&self) -> Result<Option<String>, LifecycleError> {
        let path = self.active_path();
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).await?;
        let selection: ActiveSelection = serde_yml::from_str(&content)
            .map_err(|e| LifecycleError::Persistence(e.to_string()))?;
        Ok(Some(selection.name))
    }
}

#[cfg(test)]
#[path = "descriptor_store_tests.rs"]
mod tests;
