//! Wiring: configuration in, a ready orchestrator and retrieval engine out.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use ragbench_backend_blob::LocalBlobStore;
use ragbench_backend_sqlite::SqliteRelationalAdapter;
use ragbench_backend_vector::{LocalVectorIndex, VectorMetric};
use ragbench_config::{Config, ConfigValidator};
use ragbench_embedding::build_provider;
use ragbench_lifecycle::{ExperimentOrchestrator, ExperimentSession, FileDescriptorStore};
use ragbench_protocols::{
    EmbeddingProvider, SearchQuery, SearchResult, SearchStrategy, VectorRecord,
};
use ragbench_retrieval::{AnalysisReport, FlexibleRetrievalEngine, SearchAnalyzer, SearchExplanation};
use ragbench_schema::FileTemplateRegistry;

use crate::error::WorkbenchError;

/// The shipped backends behind one handle.
pub struct Workbench {
    orchestrator: ExperimentOrchestrator,
    engine: FlexibleRetrievalEngine,
    embedder: Arc<dyn EmbeddingProvider>,
}

/// What [`Workbench::ingest_chunks`] wrote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub document_id: i64,
    /// Keys of the inserted chunk rows, in input order.
    pub chunk_ids: Vec<i64>,
    /// Vectors upserted; zero when the vector backend is disabled.
    pub vectors: usize,
}

impl Workbench {
    /// Validate `config` and open every backend it names.
    ///
    /// The vector index is skipped when `vector.enabled` is false; lifecycle
    /// then reports it as disconnected and semantic search falls back to
    /// keyword search.
    pub async fn from_config(config: &Config) -> Result<Self, WorkbenchError> {
        let warnings = ConfigValidator::validate(config)?.into_result()?;
        for warning in warnings {
            warn!("Config {}: {}", warning.path, warning.message);
        }

        let relational = Arc::new(SqliteRelationalAdapter::new(
            config.relational.data_dir.clone(),
        ));
        let templates =
            Arc::new(FileTemplateRegistry::open(config.lifecycle.templates_dir.clone()).await?);
        let descriptors =
            Arc::new(FileDescriptorStore::new(config.lifecycle.descriptors_dir.clone()).await?);
        let blob = Arc::new(LocalBlobStore::open(config.blob.base_path.clone()).await?);

        let mut orchestrator =
            ExperimentOrchestrator::new(config.clone(), relational, templates, descriptors)
                .with_blob(blob);

        if config.vector.enabled {
            let metric: VectorMetric = config.vector.metric.parse()?;
            let vector = LocalVectorIndex::open(config.vector.data_dir.clone(), metric).await?;
            orchestrator = orchestrator.with_vector(Arc::new(vector));
        } else {
            info!("Vector backend disabled");
        }

        let embedder = build_provider(&config.embedding)?;
        let engine = FlexibleRetrievalEngine::new(config.retrieval.clone(), embedder.clone())
            .with_vector_timeout(Duration::from_millis(config.vector.timeout_ms));

        info!(
            relational = ?config.relational.data_dir,
            blob = ?config.blob.base_path,
            vector = config.vector.enabled,
            "Workbench ready"
        );
        Ok(Self {
            orchestrator,
            engine,
            embedder,
        })
    }

    pub fn orchestrator(&self) -> &ExperimentOrchestrator {
        &self.orchestrator
    }

    pub fn engine(&self) -> &FlexibleRetrievalEngine {
        &self.engine
    }

    pub fn config(&self) -> &Config {
        self.orchestrator.config()
    }

    /// Session for `name`, or for the active experiment when `None`.
    pub async fn session(&self, name: Option<&str>) -> Result<ExperimentSession, WorkbenchError> {
        let session = match name {
            Some(name) => self.orchestrator.open_session(name).await?,
            None => self.orchestrator.open_active_session().await?,
        };
        Ok(session)
    }

    pub async fn search(
        &self,
        name: Option<&str>,
        query: &SearchQuery,
    ) -> Result<Vec<SearchResult>, WorkbenchError> {
        let session = self.session(name).await?;
        Ok(self.engine.search(&session, query).await?)
    }

    pub async fn explain(
        &self,
        name: Option<&str>,
        query: &SearchQuery,
    ) -> Result<SearchExplanation, WorkbenchError> {
        let session = self.session(name).await?;
        Ok(self.engine.explain_search(&session, query).await?)
    }

    pub async fn analyze(
        &self,
        name: Option<&str>,
        queries: &[&str],
        strategies: &[SearchStrategy],
    ) -> Result<AnalysisReport, WorkbenchError> {
        let session = self.session(name).await?;
        Ok(SearchAnalyzer::new(&self.engine, &session)
            .analyze(queries, strategies)
            .await)
    }

    /// Write `texts` as chunks of `document_id` and index their embeddings.
    ///
    /// Rows go to the content lookup table with keys continuing after its
    /// current maximum. Each vector is stored under its chunk key, carrying
    /// `document_id`, `sequence` and, when the document row is found, the
    /// owning `user_id`. Relational rows are kept if embedding fails.
    pub async fn ingest_chunks(
        &self,
        name: Option<&str>,
        document_id: i64,
        texts: &[&str],
    ) -> Result<IngestReport, WorkbenchError> {
        let session = self.session(name).await?;
        let mut report = IngestReport {
            document_id,
            chunk_ids: Vec::with_capacity(texts.len()),
            vectors: 0,
        };
        if texts.is_empty() {
            return Ok(report);
        }

        let relational = session.relational();
        let namespace = session.namespace();
        let dialect = relational.dialect();
        let lookup = &self.config().retrieval.content_lookup;
        let table = dialect.quote_ident(&lookup.table);
        let key = dialect.quote_ident(&lookup.key_column);

        let max_sql = format!("SELECT COALESCE(MAX({key}), 0) AS max_id FROM {table}");
        let first_id = relational
            .query(namespace, &max_sql, &[])
            .await?
            .first()
            .and_then(|row| row.get("max_id"))
            .and_then(Value::as_i64)
            .unwrap_or(0)
            + 1;

        let insert_sql = format!(
            "INSERT INTO {table} ({key}, {}, {}, {}) VALUES (?, ?, ?, ?)",
            dialect.quote_ident("document_id"),
            dialect.quote_ident(&lookup.content_column),
            dialect.quote_ident("sequence"),
        );
        for (sequence, text) in texts.iter().enumerate() {
            let chunk_id = first_id + sequence as i64;
            let args = [
                Value::from(chunk_id),
                Value::from(document_id),
                Value::from(*text),
                Value::from(sequence as i64),
            ];
            relational.execute(namespace, &insert_sql, &args).await?;
            report.chunk_ids.push(chunk_id);
        }
        info!(
            experiment = session.name(),
            document_id,
            chunks = report.chunk_ids.len(),
            "Inserted chunks"
        );

        let Some(vector) = session.vector() else {
            info!(experiment = session.name(), "Vector backend disabled, chunks not indexed");
            return Ok(report);
        };

        let owner_sql = format!(
            "SELECT {} FROM {} WHERE {} = ? LIMIT 1",
            dialect.quote_ident("user_id"),
            dialect.quote_ident("documents"),
            dialect.quote_ident("id"),
        );
        let user_id = match relational
            .query(namespace, &owner_sql, &[Value::from(document_id)])
            .await
        {
            Ok(rows) => rows
                .first()
                .and_then(|row| row.get("user_id"))
                .and_then(Value::as_i64),
            Err(e) => {
                debug!(document_id, "Owner lookup failed: {}", e);
                None
            }
        };

        let embeddings = self.embedder.embed_batch(texts).await?;
        let records: Vec<VectorRecord> = report
            .chunk_ids
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(sequence, (chunk_id, embedding))| {
                let record = VectorRecord::new(chunk_id.to_string(), embedding.vector)
                    .with_field("document_id", document_id)
                    .with_field("sequence", sequence as i64);
                match user_id {
                    Some(user_id) => record.with_field("user_id", user_id),
                    None => record,
                }
            })
            .collect();
        report.vectors = vector.upsert(session.collection(), records).await?;
        info!(
            experiment = session.name(),
            collection = session.collection(),
            vectors = report.vectors,
            "Indexed chunk embeddings"
        );
        Ok(report)
    }
}
