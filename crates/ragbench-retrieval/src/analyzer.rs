//! Latency and result-count statistics across search strategies.

use std::fmt::Write as _;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, error};

use ragbench_lifecycle::ExperimentSession;
use ragbench_protocols::{SearchQuery, SearchStrategy};

use crate::engine::FlexibleRetrievalEngine;

const ANALYSIS_TOP_K: usize = 10;

/// Strategies analyzed when the caller names none.
pub const DEFAULT_STRATEGIES: [SearchStrategy; 3] = [
    SearchStrategy::Semantic,
    SearchStrategy::Keyword,
    SearchStrategy::Hybrid,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyStats {
    pub strategy: SearchStrategy,
    /// Queries that completed; failed ones only count as errors.
    pub total_queries: usize,
    pub total_time_ms: f64,
    pub avg_time_ms: f64,
    pub avg_results: f64,
    pub errors: usize,
}

impl StrategyStats {
    fn new(strategy: SearchStrategy) -> Self {
        Self {
            strategy,
            total_queries: 0,
            total_time_ms: 0.0,
            avg_time_ms: 0.0,
            avg_results: 0.0,
            errors: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub experiment: String,
    pub strategies: Vec<StrategyStats>,
}

impl AnalysisReport {
    pub fn get(&self, strategy: SearchStrategy) -> Option<&StrategyStats> {
        self.strategies.iter().find(|s| s.strategy == strategy)
    }

    /// Plain-text rendering.
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Search performance report - {}", self.experiment);
        let _ = writeln!(out, "{}", "=".repeat(50));
        let _ = writeln!(out);
        for stats in &self.strategies {
            let _ = writeln!(out, "Strategy: {}", stats.strategy);
            let _ = writeln!(out, "  Total queries: {}", stats.total_queries);
            let _ = writeln!(out, "  Avg time: {:.2}ms", stats.avg_time_ms);
            let _ = writeln!(out, "  Avg results: {:.1}", stats.avg_results);
            let _ = writeln!(out, "  Errors: {}", stats.errors);
            let _ = writeln!(out);
        }
        out
    }
}

/// Runs a query set against one experiment.
pub struct SearchAnalyzer<'a> {
    engine: &'a FlexibleRetrievalEngine,
    session: &'a ExperimentSession,
}

impl<'a> SearchAnalyzer<'a> {
    pub fn new(engine: &'a FlexibleRetrievalEngine, session: &'a ExperimentSession) -> Self {
        Self { engine, session }
    }

    /// Every query is run once per strategy with `top_k = 10`. An empty
    /// strategy list means [`DEFAULT_STRATEGIES`].
    pub async fn analyze(&self, queries: &[&str], strategies: &[SearchStrategy]) -> AnalysisReport {
        let strategies: &[SearchStrategy] = if strategies.is_empty() {
            &DEFAULT_STRATEGIES
        } else {
            strategies
        };

        let mut report = AnalysisReport {
            experiment: self.session.name().to_string(),
            strategies: Vec::with_capacity(strategies.len()),
        };

        for &strategy in strategies {
            let mut stats = StrategyStats::new(strategy);
            let mut result_count = 0usize;

            for text in queries {
                let query = SearchQuery::new(*text, strategy).with_top_k(ANALYSIS_TOP_K);
                let started = Instant::now();
                match self.engine.search(self.session, &query).await {
                    Ok(results) => {
                        stats.total_queries += 1;
                        stats.total_time_ms += started.elapsed().as_secs_f64() * 1000.0;
                        result_count += results.len();
                    }
                    Err(e) => {
                        stats.errors += 1;
                        error!(strategy = %strategy, "Search analysis failed: {}", e);
                    }
                }
            }

            if stats.total_queries > 0 {
                stats.avg_time_ms = stats.total_time_ms / stats.total_queries as f64;
                stats.avg_results = result_count as f64 / stats.total_queries as f64;
            }
            debug!(
                strategy = %strategy,
                queries = stats.total_queries,
                errors = stats.errors,
                "Strategy analyzed"
            );
            report.strategies.push(stats);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ragbench_backend_sqlite::SqliteRelationalAdapter;
    use ragbench_config::RetrievalConfig;
    use ragbench_embedding::SimpleHashEmbedding;
    use ragbench_protocols::{ExperimentDescriptor, RelationalAdapter};
    use tempfile::TempDir;

    const DDL: &str = r#"
CREATE TABLE chunks (id INTEGER PRIMARY KEY, document_id INTEGER, text TEXT);
INSERT INTO chunks VALUES (1, 1, 'machine learning basics');
INSERT INTO chunks VALUES (2, 1, 'learning rate schedules');
"#;

    async fn setup() -> (TempDir, ExperimentSession, FlexibleRetrievalEngine) {
        let dir = TempDir::new().unwrap();
        let relational = Arc::new(SqliteRelationalAdapter::new(dir.path()));
        relational.create_namespace("knowledge_rag_perf", DDL).await.unwrap();

        let descriptor = ExperimentDescriptor::new("perf", "bob", "", "basic_rag").with_resources(
            "knowledge_rag_perf",
            "knowledge_rag_perf_documents",
            "experiments/perf",
        );
        let session = ExperimentSession::new(descriptor, relational, None);
        let engine = FlexibleRetrievalEngine::new(
            RetrievalConfig::default(),
            Arc::new(SimpleHashEmbedding::new(32)),
        );
        (dir, session, engine)
    }

    #[tokio::test]
    async fn test_default_strategies() {
        let (_dir, session, engine) = setup().await;
        let report = SearchAnalyzer::new(&engine, &session)
            .analyze(&["learning", "machine learning"], &[])
            .await;

        assert_eq!(report.experiment, "perf");
        let order: Vec<_> = report.strategies.iter().map(|s| s.strategy).collect();
        assert_eq!(order, DEFAULT_STRATEGIES.to_vec());

        let keyword = report.get(SearchStrategy::Keyword).unwrap();
        assert_eq!(keyword.total_queries, 2);
        assert_eq!(keyword.errors, 0);
        assert_eq!(keyword.avg_results, 2.0);
        assert!(keyword.avg_time_ms >= 0.0);
    }

    #[tokio::test]
    async fn test_failures_count_as_errors() {
        let (_dir, session, engine) = setup().await;
        let report = SearchAnalyzer::new(&engine, &session)
            .analyze(&["a", "b"], &[SearchStrategy::Custom])
            .await;

        let custom = report.get(SearchStrategy::Custom).unwrap();
        assert_eq!(custom.errors, 2);
        assert_eq!(custom.total_queries, 0);
        assert_eq!(custom.avg_time_ms, 0.0);
        assert_eq!(custom.avg_results, 0.0);
    }

    #[test]
    fn test_report_text() {
        let report = AnalysisReport {
            experiment: "perf".into(),
            strategies: vec![StrategyStats {
                strategy: SearchStrategy::Keyword,
                total_queries: 4,
                total_time_ms: 10.0,
                avg_time_ms: 2.5,
                avg_results: 3.25,
                errors: 1,
            }],
        };
        let text = report.report();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "Search performance report - perf");
        assert_eq!(lines[1], "=".repeat(50));
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "Strategy: keyword");
        assert!(text.contains("  Avg time: 2.50ms\n"));
        assert!(text.contains("  Avg results: 3.2\n") || text.contains("  Avg results: 3.3\n"));
        assert!(text.contains("  Errors: 1\n"));
    }
}
