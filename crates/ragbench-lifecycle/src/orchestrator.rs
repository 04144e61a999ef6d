//! Experiment lifecycle orchestration.
//!
//! Every multi-backend operation visits the backends in the fixed order
//! relational, vector, blob. Each call is attempted independently: a failure
//! is recorded in the outcome map and the next backend is still attempted.
//! Errors are returned only for validation and descriptor persistence.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::fs;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use ragbench_config::Config;
use ragbench_protocols::{
    validate_experiment_name, BackendError, BackendHealth, BackendKind, BlobAdapter,
    ExperimentDescriptor, LifecycleError, RelationalAdapter, TemplateError, VectorIndexAdapter,
};
use ragbench_schema::TemplateRegistry;

use crate::descriptor_store::DescriptorStore;
use crate::outcome::{
    BackendOutcome, BackupReport, CreateReport, DeleteReport, ExperimentInfo, ExperimentListing,
    HealthReport, OutcomeMap, StatusReport,
};
use crate::retry::RetryPolicy;
use crate::session::ExperimentSession;

/// Subdirectories created inside every experiment blob directory.
pub const BLOB_SUBDIRS: [&str; 3] = ["documents", "images", "metadata"];

const NOT_CONFIGURED: &str = "backend not configured";

/// Held advisory lock on one experiment name.
///
/// Dropping it releases the mutex and removes the map entry when no other
/// caller holds or waits on it.
struct ExperimentLock<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    name: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ExperimentLock<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(&self.name, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

/// Drives experiment create/delete/list/health/backup across the backends.
pub struct ExperimentOrchestrator {
    config: Config,
    relational: Arc<dyn RelationalAdapter>,
    vector: Option<Arc<dyn VectorIndexAdapter>>,
    blob: Option<Arc<dyn BlobAdapter>>,
    templates: Arc<dyn TemplateRegistry>,
    descriptors: Arc<dyn DescriptorStore>,
    retry: RetryPolicy,
    /// Advisory per-experiment locks, in-process only.
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ExperimentOrchestrator {
    pub fn new(
        config: Config,
        relational: Arc<dyn RelationalAdapter>,
        templates: Arc<dyn TemplateRegistry>,
        descriptors: Arc<dyn DescriptorStore>,
    ) -> Self {
        let retry = RetryPolicy::from_config(&config.lifecycle);
        Self {
            config,
            relational,
            vector: None,
            blob: None,
            templates,
            descriptors,
            retry,
            locks: DashMap::new(),
        }
    }

    pub fn with_vector(mut self, vector: Arc<dyn VectorIndexAdapter>) -> Self {
        self.vector = Some(vector);
        self
    }

    pub fn with_blob(mut self, blob: Arc<dyn BlobAdapter>) -> Self {
        self.blob = Some(blob);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn templates(&self) -> &Arc<dyn TemplateRegistry> {
        &self.templates
    }

    /// Callers validate `name` first so rejected names never enter the map.
    async fn lock(&self, name: &str) -> ExperimentLock<'_> {
        let mutex = self.locks.entry(name.to_string()).or_default().value().clone();
        let guard = mutex.lock_owned().await;
        ExperimentLock {
            locks: &self.locks,
            name: name.to_string(),
            guard: Some(guard),
        }
    }

    fn try_lock(&self, name: &str) -> Option<ExperimentLock<'_>> {
        let mutex = self.locks.entry(name.to_string()).or_default().value().clone();
        let guard = mutex.try_lock_owned().ok()?;
        Some(ExperimentLock {
            locks: &self.locks,
            name: name.to_string(),
            guard: Some(guard),
        })
    }

    #[cfg(test)]
    pub(crate) fn lock_entries(&self) -> usize {
        self.locks.len()
    }

    async fn require(&self, name: &str) -> Result<ExperimentDescriptor, LifecycleError> {
        validate_experiment_name(name)?;
        self.descriptors
            .load(name)
            .await?
            .ok_or_else(|| LifecycleError::NotFound(name.to_string()))
    }

    fn record(
        outcomes: &mut OutcomeMap,
        experiment: &str,
        kind: BackendKind,
        result: Result<String, BackendError>,
    ) -> bool {
        match &result {
            Ok(detail) => debug!(backend = %kind, experiment, "{}", detail),
            Err(e) => warn!(backend = %kind, experiment, "Backend step failed: {}", e),
        }
        let outcome = BackendOutcome::from_result(result);
        let ok = outcome.is_success();
        outcomes.insert(kind, outcome);
        ok
    }

    /// Create an experiment in every backend.
    ///
    /// Validation (name, template, uniqueness) happens before any backend
    /// call. The descriptor is persisted whatever the backends report.
    pub async fn create(
        &self,
        name: &str,
        researcher: &str,
        description: &str,
        template_name: &str,
    ) -> Result<CreateReport, LifecycleError> {
        validate_experiment_name(name)?;
        let _guard = self.lock(name).await;

        let ddl = match self
            .templates
            .render_ddl_for(template_name, self.relational.dialect())
            .await
        {
            Ok(ddl) => ddl,
            Err(TemplateError::NotFound(_)) => {
                return Err(LifecycleError::TemplateNotFound(template_name.to_string()));
            }
            Err(e) => return Err(LifecycleError::Persistence(e.to_string())),
        };

        if self.descriptors.exists(name).await? {
            return Err(LifecycleError::AlreadyExists(name.to_string()));
        }

        let mut descriptor = ExperimentDescriptor::new(name, researcher, description, template_name)
            .with_resources(
                self.config.namespace_for(name),
                self.config.collection_for(name),
                self.config.blob_dir_for(name),
            );
        info!(experiment = name, template = template_name, "Creating experiment");

        let mut outcomes = OutcomeMap::new();

        let namespace = descriptor.namespace.clone();
        let result = self
            .retry
            .run(BackendKind::Relational, "create_namespace", || {
                self.relational.create_namespace(&namespace, &ddl)
            })
            .await
            .map(|()| format!("namespace {} created", namespace));
        let ok = Self::record(&mut outcomes, name, BackendKind::Relational, result);
        descriptor.set_exists(BackendKind::Relational, ok);

        match &self.vector {
            Some(vector) => {
                let collection = descriptor.collection.clone();
                let dimension = self.config.vector.dimension;
                let result = self
                    .retry
                    .run(BackendKind::Vector, "create_collection", || {
                        vector.create_collection(&collection, dimension)
                    })
                    .await
                    .map(|()| format!("collection {} created (dim {})", collection, dimension));
                let ok = Self::record(&mut outcomes, name, BackendKind::Vector, result);
                descriptor.set_exists(BackendKind::Vector, ok);
            }
            None => {
                outcomes.insert(BackendKind::Vector, BackendOutcome::skipped(NOT_CONFIGURED));
                descriptor.set_exists(BackendKind::Vector, false);
            }
        }

        match &self.blob {
            Some(blob) => {
                let dir = descriptor.blob_dir.clone();
                let result = self
                    .retry
                    .run(BackendKind::Blob, "ensure_dir", || async {
                        blob.ensure_dir(&dir).await?;
                        for sub in BLOB_SUBDIRS {
                            blob.ensure_dir(&format!("{}/{}", dir, sub)).await?;
                        }
                        Ok::<_, BackendError>(format!("directory {} created", dir))
                    })
                    .await;
                let ok = Self::record(&mut outcomes, name, BackendKind::Blob, result);
                descriptor.set_exists(BackendKind::Blob, ok);
            }
            None => {
                outcomes.insert(BackendKind::Blob, BackendOutcome::skipped(NOT_CONFIGURED));
                descriptor.set_exists(BackendKind::Blob, false);
            }
        }

        self.descriptors.save(&descriptor).await?;
        info!(experiment = name, "Experiment created");

        Ok(CreateReport {
            descriptor,
            outcomes,
        })
    }

    /// Delete an experiment from every backend.
    ///
    /// Requires `force`. The descriptor is removed once all three attempts
    /// were issued, regardless of their outcome.
    pub async fn delete(&self, name: &str, force: bool) -> Result<DeleteReport, LifecycleError> {
        validate_experiment_name(name)?;
        if !force {
            return Err(LifecycleError::ConfirmationRequired(name.to_string()));
        }
        let _guard = self.lock(name).await;
        let descriptor = self.require(name).await?;
        info!(experiment = name, "Deleting experiment");

        let mut outcomes = OutcomeMap::new();

        let namespace = &descriptor.namespace;
        let result = self
            .retry
            .run(BackendKind::Relational, "drop_namespace", || {
                self.relational.drop_namespace(namespace)
            })
            .await
            .map(|()| format!("namespace {} dropped", namespace));
        Self::record(&mut outcomes, name, BackendKind::Relational, result);

        match &self.vector {
            Some(vector) => {
                let collection = &descriptor.collection;
                let result = self
                    .retry
                    .run(BackendKind::Vector, "drop_collection", || {
                        vector.drop_collection(collection)
                    })
                    .await
                    .map(|()| format!("collection {} dropped", collection));
                Self::record(&mut outcomes, name, BackendKind::Vector, result);
            }
            None => {
                outcomes.insert(BackendKind::Vector, BackendOutcome::skipped(NOT_CONFIGURED));
            }
        }

        match &self.blob {
            Some(blob) => {
                let dir = &descriptor.blob_dir;
                let result = self
                    .retry
                    .run(BackendKind::Blob, "remove_tree", || blob.remove_tree(dir))
                    .await
                    .map(|()| format!("directory {} removed", dir));
                Self::record(&mut outcomes, name, BackendKind::Blob, result);
            }
            None => {
                outcomes.insert(BackendKind::Blob, BackendOutcome::skipped(NOT_CONFIGURED));
            }
        }

        self.descriptors.delete(name).await?;

        let was_active = self.descriptors.active().await?.as_deref() == Some(name);
        if was_active {
            self.descriptors.set_active(None).await?;
            info!(experiment = name, "Cleared active selection");
        }

        info!(experiment = name, "Experiment deleted");
        Ok(DeleteReport {
            name: name.to_string(),
            outcomes,
            was_active,
        })
    }

    async fn vector_exists(&self, collection: &str) -> bool {
        let Some(vector) = &self.vector else {
            return false;
        };
        vector.has_collection(collection).await.unwrap_or_else(|e| {
            debug!(backend = "vector", "has_collection({}) failed: {}", collection, e);
            false
        })
    }

    async fn blob_exists(&self, dir: &str) -> bool {
        let Some(blob) = &self.blob else {
            return false;
        };
        blob.exists(dir).await.unwrap_or_else(|e| {
            debug!(backend = "blob", "exists({}) failed: {}", dir, e);
            false
        })
    }

    /// All experiments with live per-backend existence.
    ///
    /// The descriptor store decides which experiments exist. Cached flags
    /// that disagree with the live checks are rewritten.
    pub async fn list(&self) -> Result<Vec<ExperimentListing>, LifecycleError> {
        let descriptors = self.descriptors.list().await?;
        let active = self.descriptors.active().await?;

        let namespaces: Option<BTreeSet<String>> = match self.relational.list_namespaces().await {
            Ok(namespaces) => Some(namespaces.into_iter().collect()),
            Err(e) => {
                warn!(backend = "relational", "Failed to list namespaces: {}", e);
                None
            }
        };

        let mut listings = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let mut exists = BTreeMap::new();
            exists.insert(
                BackendKind::Relational,
                namespaces
                    .as_ref()
                    .is_some_and(|ns| ns.contains(&descriptor.namespace)),
            );
            exists.insert(
                BackendKind::Vector,
                self.vector_exists(&descriptor.collection).await,
            );
            exists.insert(BackendKind::Blob, self.blob_exists(&descriptor.blob_dir).await);

            if exists != descriptor.backend_existence {
                self.reconcile(&descriptor.name, &exists).await;
            }

            listings.push(ExperimentListing {
                active: active.as_deref() == Some(descriptor.name.as_str()),
                name: descriptor.name,
                researcher: descriptor.researcher,
                template_name: descriptor.template_name,
                exists,
            });
        }
        Ok(listings)
    }

    /// Refresh cached existence flags unless a lifecycle operation holds the name.
    async fn reconcile(&self, name: &str, exists: &BTreeMap<BackendKind, bool>) {
        let Some(_guard) = self.try_lock(name) else {
            return;
        };

        match self.descriptors.load(name).await {
            Ok(Some(mut descriptor)) => {
                descriptor.backend_existence = exists.clone();
                descriptor.touch();
                if let Err(e) = self.descriptors.save(&descriptor).await {
                    warn!(experiment = name, "Failed to reconcile descriptor: {}", e);
                }
            }
            Ok(None) => {}
            Err(e) => warn!(experiment = name, "Failed to reload descriptor: {}", e),
        }
    }

    /// Relational namespaces that follow the naming convention but have no descriptor.
    pub async fn orphaned_namespaces(&self) -> Result<Vec<String>, LifecycleError> {
        let prefix = &self.config.relational.namespace_prefix;
        let namespaces = self
            .relational
            .list_namespaces()
            .await
            .map_err(|e| LifecycleError::Persistence(e.to_string()))?;
        let known: BTreeSet<String> = self
            .descriptors
            .list()
            .await?
            .into_iter()
            .map(|d| d.namespace)
            .collect();

        Ok(namespaces
            .into_iter()
            .filter(|ns| ns.starts_with(prefix.as_str()) && !known.contains(ns))
            .collect())
    }

    /// Per-backend health. Never fails.
    pub async fn health_check(&self) -> HealthReport {
        let mut backends = BTreeMap::new();
        backends.insert(BackendKind::Relational, self.relational_health().await);
        backends.insert(BackendKind::Vector, self.vector_health().await);
        backends.insert(BackendKind::Blob, self.blob_health().await);

        for (kind, health) in &backends {
            if !health.is_healthy() {
                warn!(backend = %kind, status = %health.status, "{}", health.detail);
            }
        }
        HealthReport { backends }
    }

    async fn relational_health(&self) -> BackendHealth {
        let version = match self.relational.ping().await {
            Ok(version) => version,
            Err(e) => return BackendHealth::from_error(&e),
        };
        let prefix = &self.config.relational.namespace_prefix;
        match self.relational.list_namespaces().await {
            Ok(namespaces) => {
                let count = namespaces
                    .iter()
                    .filter(|ns| ns.starts_with(prefix.as_str()))
                    .count();
                BackendHealth::healthy(version).with_metadata("experiments_count", count)
            }
            Err(e) => BackendHealth::from_error(&e),
        }
    }

    async fn vector_health(&self) -> BackendHealth {
        let Some(vector) = &self.vector else {
            return BackendHealth::disconnected("vector backend not configured");
        };
        match vector.version().await {
            Ok(version) => BackendHealth::healthy(version),
            Err(e) => BackendHealth::from_error(&e),
        }
    }

    async fn blob_health(&self) -> BackendHealth {
        let Some(blob) = &self.blob else {
            return BackendHealth::disconnected("blob backend not configured");
        };
        if let Err(e) = blob.exists("").await {
            return BackendHealth::from_error(&e);
        }
        let count = match blob.list_dirs(&self.config.blob.experiments_dir).await {
            Ok(dirs) => dirs.len(),
            Err(BackendError::NotFound(_)) => 0,
            Err(e) => return BackendHealth::from_error(&e),
        };
        BackendHealth::healthy(format!("blob store at {}", blob.root().display()))
            .with_metadata("experiments_count", count)
    }

    /// Back up an experiment into `<destination>/<name>_<YYYYmmdd_HHMMSS>/`.
    ///
    /// Uses the configured backup directory when `destination` is `None`.
    pub async fn backup(
        &self,
        name: &str,
        destination: Option<&Path>,
    ) -> Result<BackupReport, LifecycleError> {
        validate_experiment_name(name)?;
        let _guard = self.lock(name).await;
        let descriptor = self.require(name).await?;

        let base = destination
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.lifecycle.backup_dir.clone());
        let path = base.join(format!("{}_{}", name, Utc::now().format("%Y%m%d_%H%M%S")));
        fs::create_dir_all(&path).await?;
        info!(experiment = name, "Backing up experiment to {:?}", path);

        let mut outcomes = OutcomeMap::new();

        let namespace = &descriptor.namespace;
        let result = match self
            .retry
            .run(BackendKind::Relational, "dump", || self.relational.dump(namespace))
            .await
        {
            Ok(sql) => {
                let file = path.join(format!("{}.sql", namespace));
                fs::write(&file, sql)
                    .await
                    .map(|()| format!("dumped to {}", file.display()))
                    .map_err(|e| BackendError::OperationFailed(e.to_string()))
            }
            Err(e) => Err(e),
        };
        Self::record(&mut outcomes, name, BackendKind::Relational, result);

        match &self.vector {
            Some(vector) => {
                let result = self
                    .backup_vector_metadata(vector.as_ref(), &descriptor.collection, &path)
                    .await;
                Self::record(&mut outcomes, name, BackendKind::Vector, result);
            }
            None => {
                outcomes.insert(BackendKind::Vector, BackendOutcome::skipped(NOT_CONFIGURED));
            }
        }

        match &self.blob {
            Some(blob) => {
                let dst = path.join(format!("local_object_store_{}", name));
                let dir = &descriptor.blob_dir;
                let result = self
                    .retry
                    .run(BackendKind::Blob, "copy_tree", || blob.copy_tree(dir, &dst))
                    .await
                    .map(|copied| format!("copied {} files", copied));
                Self::record(&mut outcomes, name, BackendKind::Blob, result);
            }
            None => {
                outcomes.insert(BackendKind::Blob, BackendOutcome::skipped(NOT_CONFIGURED));
            }
        }

        Ok(BackupReport {
            name: name.to_string(),
            path,
            outcomes,
        })
    }

    /// Bulk vector export is out of scope: write a metadata stub instead.
    async fn backup_vector_metadata(
        &self,
        vector: &dyn VectorIndexAdapter,
        collection: &str,
        path: &Path,
    ) -> Result<String, BackendError> {
        let exists = self
            .retry
            .run(BackendKind::Vector, "has_collection", || {
                vector.has_collection(collection)
            })
            .await?;
        if !exists {
            return Ok(format!("collection {} absent, nothing to back up", collection));
        }

        let stub = serde_json::json!({
            "collection_name": collection,
            "backup_time": Utc::now().to_rfc3339(),
            "note": "Vector data export requires a dedicated bulk export tool",
        });
        let body = serde_json::to_string_pretty(&stub)
            .map_err(|e| BackendError::OperationFailed(e.to_string()))?;
        let file = path.join(format!("{}.json", collection));
        fs::write(&file, body)
            .await
            .map_err(|e| BackendError::OperationFailed(e.to_string()))?;
        Ok(format!("metadata stub written to {}", file.display()))
    }

    /// Mark an existing experiment as active.
    pub async fn switch_experiment(&self, name: &str) -> Result<ExperimentDescriptor, LifecycleError> {
        let descriptor = self.require(name).await?;
        self.descriptors.set_active(Some(name)).await?;
        info!(experiment = name, "Switched active experiment");
        Ok(descriptor)
    }

    /// The active experiment, if any. A selection whose descriptor is gone reads as `None`.
    pub async fn active_experiment(&self) -> Result<Option<ExperimentDescriptor>, LifecycleError> {
        let Some(name) = self.descriptors.active().await? else {
            return Ok(None);
        };
        let descriptor = self.descriptors.load(&name).await?;
        if descriptor.is_none() {
            warn!(experiment = %name, "Active selection points to a missing experiment");
        }
        Ok(descriptor)
    }

    pub async fn add_note(
        &self,
        name: &str,
        text: &str,
    ) -> Result<ExperimentDescriptor, LifecycleError> {
        validate_experiment_name(name)?;
        let _guard = self.lock(name).await;
        let mut descriptor = self.require(name).await?;
        descriptor.add_note(text);
        self.descriptors.save(&descriptor).await?;
        debug!(experiment = name, "Added note");
        Ok(descriptor)
    }

    /// Descriptor plus row counts of every relational table.
    pub async fn experiment_info(&self, name: &str) -> Result<ExperimentInfo, LifecycleError> {
        let descriptor = self.require(name).await?;
        let mut table_counts = BTreeMap::new();
        let mut relational_error = None;

        match self.relational.list_tables(&descriptor.namespace).await {
            Ok(tables) => {
                for table in tables {
                    match self.relational.count_rows(&descriptor.namespace, &table).await {
                        Ok(count) => {
                            table_counts.insert(table, count);
                        }
                        Err(e) => warn!(experiment = name, "Failed to count rows of {}: {}", table, e),
                    }
                }
            }
            Err(e) => {
                warn!(experiment = name, "Failed to list tables: {}", e);
                relational_error = Some(e.to_string());
            }
        }

        Ok(ExperimentInfo {
            descriptor,
            table_counts,
            relational_error,
        })
    }

    pub async fn status(&self) -> Result<StatusReport, LifecycleError> {
        let active = self.active_experiment().await?.map(|d| d.name);
        let experiment_count = self.descriptors.list().await?.len();
        let template_count = self
            .templates
            .list()
            .await
            .map_err(|e| LifecycleError::Persistence(e.to_string()))?
            .len();

        Ok(StatusReport {
            active,
            experiment_count,
            template_count,
            health: self.health_check().await,
        })
    }

    /// Build the retrieval context for an experiment.
    pub async fn open_session(&self, name: &str) -> Result<ExperimentSession, LifecycleError> {
        let descriptor = self.require(name).await?;
        Ok(ExperimentSession::new(
            descriptor,
            self.relational.clone(),
            self.vector.clone(),
        ))
    }

    /// Session for the active experiment.
    pub async fn open_active_session(&self) -> Result<ExperimentSession, LifecycleError> {
        let descriptor = self
            .active_experiment()
            .await?
            .ok_or_else(|| LifecycleError::NotFound("no active experiment".to_string()))?;
        Ok(ExperimentSession::new(
            descriptor,
            self.relational.clone(),
            self.vector.clone(),
        ))
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
