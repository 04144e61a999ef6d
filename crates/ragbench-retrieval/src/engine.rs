//! Strategy dispatch, vector fallback and content hydration.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use ragbench_config::RetrievalConfig;
use ragbench_lifecycle::ExperimentSession;
use ragbench_protocols::{
    BackendError, EmbeddingProvider, Metadata, RetrievalError, SearchQuery, SearchResult,
    SearchStrategy, VectorFilter, VectorHit, VectorIndexAdapter,
};

use crate::fusion::{sort_by_score, weighted_fusion};
use crate::keyword::{build_keyword_statement, extract_content, row_id, word_overlap};

const VECTOR_SOURCE: &str = "vector";
const CUSTOM_SOURCE: &str = "custom_sql";

/// Side-effect free description of how a query would run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchExplanation {
    pub strategy: SearchStrategy,
    pub experiment: String,
    pub available_tables: Vec<String>,
    pub vector_backend_available: bool,
    /// Rendered vector filter, when the query carries one.
    pub vector_filter: Option<String>,
    pub description: String,
}

/// Retrieval over one experiment at a time, selected by the session.
pub struct FlexibleRetrievalEngine {
    config: RetrievalConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    vector_timeout: Duration,
}

impl FlexibleRetrievalEngine {
    pub fn new(config: RetrievalConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            config,
            embedder,
            vector_timeout: Duration::from_secs(5),
        }
    }

    /// Bound on the embedding plus vector search round trip.
    pub fn with_vector_timeout(mut self, vector_timeout: Duration) -> Self {
        self.vector_timeout = vector_timeout;
        self
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Run a query. Backend trouble degrades the result instead of failing;
    /// only malformed or disallowed requests return an error.
    pub async fn search(
        &self,
        session: &ExperimentSession,
        query: &SearchQuery,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        debug!(
            experiment = session.name(),
            strategy = %query.strategy,
            top_k = query.top_k,
            "Searching"
        );
        match query.strategy {
            SearchStrategy::Keyword => Ok(self.keyword_search(session, query).await),
            SearchStrategy::Semantic => Ok(self.semantic_search(session, query).await),
            SearchStrategy::Hybrid => Ok(self.hybrid_search(session, query).await),
            SearchStrategy::Custom => self.custom_search(session, query).await,
        }
    }

    // ========================================================================
    // keyword
    // ========================================================================

    async fn keyword_search(
        &self,
        session: &ExperimentSession,
        query: &SearchQuery,
    ) -> Vec<SearchResult> {
        let relational = session.relational();
        let namespace = session.namespace();

        let existing: BTreeSet<String> = match relational.list_tables(namespace).await {
            Ok(tables) => tables.into_iter().collect(),
            Err(e) => {
                warn!(experiment = session.name(), "Cannot list tables: {}", e);
                return Vec::new();
            }
        };

        let mapping = query
            .table_mapping
            .as_ref()
            .unwrap_or(&self.config.table_mapping);
        let mut seen = BTreeSet::new();
        let tables: Vec<&String> = mapping
            .values()
            .filter(|t| existing.contains(*t) && seen.insert(t.as_str()))
            .collect();
        if tables.is_empty() {
            warn!(experiment = session.name(), "No searchable tables found");
            return Vec::new();
        }

        let mut results = Vec::new();
        for table in tables {
            match self.search_table(session, table, query).await {
                Ok(hits) => results.extend(hits),
                Err(e) => warn!(experiment = session.name(), table = %table, "Table search failed: {}", e),
            }
        }

        sort_by_score(&mut results);
        results.truncate(query.top_k);
        results
    }

    async fn search_table(
        &self,
        session: &ExperimentSession,
        table: &str,
        query: &SearchQuery,
    ) -> Result<Vec<SearchResult>, BackendError> {
        let relational = session.relational();
        let namespace = session.namespace();
        let columns = relational.describe_columns(namespace, table).await?;

        let statement = match build_keyword_statement(
            relational.dialect(),
            table,
            &columns,
            &query.text,
            &query.filters,
            query.top_k,
        ) {
            Ok(statement) => statement,
            Err(skip) => {
                info!(table, "Skipping table: {}", skip);
                return Ok(Vec::new());
            }
        };

        let rows = relational
            .query(namespace, &statement.sql, &statement.args)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let content = extract_content(&row);
                let score = word_overlap(&query.text, &content);
                let id = row_id(&row).unwrap_or_default();
                SearchResult::new(id, score, content, table).with_metadata(row.into_metadata())
            })
            .collect())
    }

    // ========================================================================
    // semantic
    // ========================================================================

    /// The session's vector backend, if it answers within the timeout.
    async fn reachable_vector<'a>(
        &self,
        session: &'a ExperimentSession,
    ) -> Option<&'a Arc<dyn VectorIndexAdapter>> {
        let vector = session.vector()?;
        match timeout(self.vector_timeout, vector.version()).await {
            Ok(Ok(_)) => Some(vector),
            Ok(Err(e)) => {
                debug!("Vector backend unavailable: {}", e);
                None
            }
            Err(_) => {
                debug!("Vector backend did not answer within {:?}", self.vector_timeout);
                None
            }
        }
    }

    async fn semantic_search(
        &self,
        session: &ExperimentSession,
        query: &SearchQuery,
    ) -> Vec<SearchResult> {
        let Some(vector) = self.reachable_vector(session).await else {
            warn!(
                experiment = session.name(),
                "Vector backend unavailable, falling back to keyword search"
            );
            return self.keyword_search(session, query).await;
        };

        let filter = VectorFilter::from_filters(&query.filters);
        if let Some(expr) = filter.to_expr() {
            debug!(filter = %expr, "Applying vector filter");
        }
        let filter = (!filter.is_empty()).then_some(filter);

        let round_trip = async {
            let embedding = self
                .embedder
                .embed(&query.text)
                .await
                .map_err(|e| e.to_string())?;
            vector
                .search(
                    session.collection(),
                    &embedding.vector,
                    query.top_k,
                    filter.as_ref(),
                )
                .await
                .map_err(|e| e.to_string())
        };

        let hits = match timeout(self.vector_timeout, round_trip).await {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                warn!(experiment = session.name(), "Vector search failed: {}", e);
                return Vec::new();
            }
            Err(_) => {
                warn!(
                    experiment = session.name(),
                    "Vector search timed out after {:?}", self.vector_timeout
                );
                return Vec::new();
            }
        };

        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            if let Some(result) = self.hydrate(session, hit).await {
                results.push(result);
            }
        }
        sort_by_score(&mut results);
        results
    }

    /// Attach chunk content to a vector hit; `None` when the lookup fails.
    async fn hydrate(&self, session: &ExperimentSession, hit: VectorHit) -> Option<SearchResult> {
        let lookup = &self.config.content_lookup;
        let dialect = session.relational().dialect();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ? LIMIT 1",
            dialect.quote_ident(&lookup.content_column),
            dialect.quote_ident(&lookup.table),
            dialect.quote_ident(&lookup.key_column),
        );
        let key = match hit.id.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(hit.id.clone()),
        };

        let rows = match session
            .relational()
            .query(session.namespace(), &sql, &[key])
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                debug!(chunk = %hit.id, "Content lookup failed: {}", e);
                return None;
            }
        };
        let content = rows
            .first()
            .and_then(|row| row.get(&lookup.content_column))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())?
            .to_string();

        let mut metadata: Metadata = hit.fields;
        metadata.insert("distance".to_string(), Value::from(hit.distance));
        let score = (1.0 - hit.distance).clamp(0.0, 1.0);

        Some(SearchResult::new(hit.id, score, content, VECTOR_SOURCE).with_metadata(metadata))
    }

    // ========================================================================
    // hybrid / custom
    // ========================================================================

    async fn hybrid_search(
        &self,
        session: &ExperimentSession,
        query: &SearchQuery,
    ) -> Vec<SearchResult> {
        let semantic = self.semantic_search(session, query).await;
        let keyword = self.keyword_search(session, query).await;
        weighted_fusion(
            semantic,
            keyword,
            self.config.semantic_weight,
            self.config.keyword_weight,
            query.top_k,
        )
    }

    async fn custom_search(
        &self,
        session: &ExperimentSession,
        query: &SearchQuery,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        let sql = query.custom_sql().ok_or_else(|| {
            RetrievalError::InvalidQuery("custom search requires filters.custom_sql".to_string())
        })?;
        if !self.config.allow_custom_sql {
            return Err(RetrievalError::TrustBoundaryViolation(
                "custom SQL is disabled (retrieval.allow_custom_sql = false)".to_string(),
            ));
        }

        info!(experiment = session.name(), "Executing custom SQL");
        let rows = match session
            .relational()
            .query_read_only(session.namespace(), sql)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(experiment = session.name(), "Custom SQL failed: {}", e);
                return Ok(Vec::new());
            }
        };

        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                let id = row_id(&row).unwrap_or_else(|| i.to_string());
                let content = extract_content(&row);
                SearchResult::new(id, 1.0, content, CUSTOM_SOURCE).with_metadata(row.into_metadata())
            })
            .collect())
    }

    // ========================================================================
    // explain
    // ========================================================================

    /// Describe how `query` would run without running it.
    pub async fn explain_search(
        &self,
        session: &ExperimentSession,
        query: &SearchQuery,
    ) -> Result<SearchExplanation, RetrievalError> {
        let available_tables = session
            .relational()
            .list_tables(session.namespace())
            .await?;
        let vector_backend_available = self.reachable_vector(session).await.is_some();

        let description = match query.strategy {
            SearchStrategy::Semantic if vector_backend_available => {
                "Vector search + relational content lookup".to_string()
            }
            SearchStrategy::Semantic => {
                "Fallback to keyword search (vector backend unavailable)".to_string()
            }
            SearchStrategy::Keyword => "Full-text search across all text columns".to_string(),
            SearchStrategy::Hybrid => format!(
                "Semantic ({:.0}%) + Keyword ({:.0}%) combined search",
                self.config.semantic_weight * 100.0,
                self.config.keyword_weight * 100.0
            ),
            SearchStrategy::Custom => "Custom SQL execution".to_string(),
        };

        let vector_filter = match query.strategy {
            SearchStrategy::Semantic | SearchStrategy::Hybrid => {
                VectorFilter::from_filters(&query.filters).to_expr()
            }
            _ => None,
        };

        Ok(SearchExplanation {
            strategy: query.strategy,
            experiment: session.name().to_string(),
            available_tables,
            vector_backend_available,
            vector_filter,
            description,
        })
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
