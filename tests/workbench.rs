//! End-to-end runs over the shipped on-disk backends.

use std::path::Path;

use serde_json::Value;
use tempfile::TempDir;

use ragbench::{Config, SearchQuery, Workbench, WorkbenchError};
use ragbench_embedding::SimpleHashEmbedding;
use ragbench_protocols::{
    BackendKind, EmbeddingProvider, HealthStatus, LifecycleError, VectorRecord,
};

const DIM: usize = 32;

const SEED: [&str; 5] = [
    "INSERT INTO users (id, name, email) VALUES (1, 'alice', 'alice@example.com')",
    "INSERT INTO documents (id, user_id, title, content) VALUES (1, 1, 'Intro', 'notes')",
    "INSERT INTO chunks (id, document_id, text) VALUES (1, 1, 'machine learning basics')",
    "INSERT INTO chunks (id, document_id, text) VALUES (2, 1, 'deep neural networks')",
    "INSERT INTO chunks (id, document_id, text) VALUES (3, 1, 'gradient descent')",
];

fn config(root: &Path) -> Config {
    let mut config = Config::rooted_at(root);
    config.vector.dimension = DIM;
    config.embedding.dimension = DIM;
    config
}

async fn seeded(config: &Config) -> Workbench {
    let workbench = Workbench::from_config(config).await.unwrap();
    let report = workbench
        .orchestrator()
        .create("exp1", "alice", "baseline", "basic_rag")
        .await
        .unwrap();
    assert!(report.all_succeeded(), "{:?}", report.outcomes);

    let session = workbench.session(Some("exp1")).await.unwrap();
    for sql in SEED {
        session
            .relational()
            .execute(session.namespace(), sql, &[])
            .await
            .unwrap();
    }
    workbench
}

#[tokio::test]
async fn test_create_search_delete() {
    let dir = TempDir::new().unwrap();
    let workbench = seeded(&config(dir.path())).await;

    let listing = workbench.orchestrator().list().await.unwrap();
    assert_eq!(listing.len(), 1);
    assert!(BackendKind::ALL.iter().all(|k| listing[0].exists_in(*k)));

    let results = workbench
        .search(Some("exp1"), &SearchQuery::keyword("machine learning"))
        .await
        .unwrap();
    assert_eq!(results[0].id, "1");
    assert_eq!(results[0].score, 1.0);
    assert_eq!(results[0].source, "chunks");

    // One of two query words in common scores one half.
    let results = workbench
        .search(Some("exp1"), &SearchQuery::keyword("deep learning"))
        .await
        .unwrap();
    let basics = results.iter().find(|r| r.id == "1").unwrap();
    assert_eq!(basics.content, "machine learning basics");
    assert_eq!(basics.score, 0.5);

    let report = workbench.orchestrator().delete("exp1", true).await.unwrap();
    assert!(report.all_succeeded());
    assert!(workbench.orchestrator().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_uses_active_experiment() {
    let dir = TempDir::new().unwrap();
    let workbench = seeded(&config(dir.path())).await;

    let err = workbench
        .search(None, &SearchQuery::keyword("machine"))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkbenchError::Lifecycle(LifecycleError::NotFound(_))));

    workbench.orchestrator().switch_experiment("exp1").await.unwrap();
    let results = workbench
        .search(None, &SearchQuery::keyword("machine"))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_semantic_and_hybrid_over_local_index() {
    let dir = TempDir::new().unwrap();
    let workbench = seeded(&config(dir.path())).await;
    let session = workbench.session(Some("exp1")).await.unwrap();

    let embedder = SimpleHashEmbedding::new(DIM);
    let mut records = Vec::new();
    for (id, text) in [("1", "machine learning basics"), ("2", "deep neural networks")] {
        let embedding = embedder.embed(text).await.unwrap();
        records.push(VectorRecord::new(id, embedding.vector).with_field("user_id", 1));
    }
    session
        .vector()
        .unwrap()
        .upsert(session.collection(), records)
        .await
        .unwrap();

    let semantic = workbench
        .search(Some("exp1"), &SearchQuery::semantic("machine learning basics"))
        .await
        .unwrap();
    assert_eq!(semantic[0].id, "1");
    assert_eq!(semantic[0].source, "vector");
    assert_eq!(semantic[0].content, "machine learning basics");

    let hybrid = workbench
        .search(Some("exp1"), &SearchQuery::hybrid("machine learning basics"))
        .await
        .unwrap();
    let expected = 0.6 * semantic[0].score + 0.4;
    assert_eq!(hybrid[0].id, "1");
    assert!((hybrid[0].score - expected).abs() < 1e-5);
}

#[tokio::test]
async fn test_ingest_chunks_indexes_for_semantic_search() {
    let dir = TempDir::new().unwrap();
    let workbench = seeded(&config(dir.path())).await;

    let report = workbench
        .ingest_chunks(
            Some("exp1"),
            1,
            &["vector databases store embeddings", "transformers use attention"],
        )
        .await
        .unwrap();
    // Keys continue after the three seeded chunks.
    assert_eq!(report.chunk_ids, vec![4, 5]);
    assert_eq!(report.vectors, 2);

    let semantic = workbench
        .search(
            Some("exp1"),
            &SearchQuery::semantic("vector databases store embeddings"),
        )
        .await
        .unwrap();
    assert_eq!(semantic[0].id, "4");
    assert_eq!(semantic[0].source, "vector");
    assert_eq!(semantic[0].content, "vector databases store embeddings");
    assert_eq!(semantic[0].metadata["document_id"], 1);
    assert_eq!(semantic[0].metadata["sequence"], 0);
    assert_eq!(semantic[0].metadata["user_id"], 1);

    let other_user = workbench
        .search(
            Some("exp1"),
            &SearchQuery::semantic("transformers").with_filter("user_id", 2),
        )
        .await
        .unwrap();
    assert!(other_user.is_empty());

    let keyword = workbench
        .search(Some("exp1"), &SearchQuery::keyword("attention"))
        .await
        .unwrap();
    assert_eq!(keyword.len(), 1);
    assert_eq!(keyword[0].id, "5");
}

#[tokio::test]
async fn test_ingest_without_vector_backend_keeps_rows() {
    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path());
    config.vector.enabled = false;
    let workbench = seeded(&config).await;

    let report = workbench
        .ingest_chunks(Some("exp1"), 1, &["retrieval augmented generation"])
        .await
        .unwrap();
    assert_eq!(report.chunk_ids, vec![4]);
    assert_eq!(report.vectors, 0);

    let results = workbench
        .search(Some("exp1"), &SearchQuery::keyword("augmented"))
        .await
        .unwrap();
    assert_eq!(results[0].id, "4");

    let empty = workbench.ingest_chunks(Some("exp1"), 1, &[]).await.unwrap();
    assert!(empty.chunk_ids.is_empty());
    let info = workbench.orchestrator().experiment_info("exp1").await.unwrap();
    assert_eq!(info.table_counts["chunks"], 4);
}

#[tokio::test]
async fn test_ingest_unknown_experiment() {
    let dir = TempDir::new().unwrap();
    let workbench = seeded(&config(dir.path())).await;

    let err = workbench
        .ingest_chunks(Some("ghost"), 1, &["text"])
        .await
        .unwrap_err();
    assert!(matches!(err, WorkbenchError::Lifecycle(LifecycleError::NotFound(_))));
}

#[tokio::test]
async fn test_vector_disabled_degrades() {
    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path());
    config.vector.enabled = false;
    let workbench = seeded(&config).await;

    let health = workbench.orchestrator().health_check().await;
    assert_eq!(health.get(BackendKind::Relational).unwrap().status, HealthStatus::Healthy);
    assert_eq!(health.get(BackendKind::Vector).unwrap().status, HealthStatus::Disconnected);
    assert_eq!(health.get(BackendKind::Blob).unwrap().status, HealthStatus::Healthy);

    let semantic = workbench
        .search(Some("exp1"), &SearchQuery::semantic("learning"))
        .await
        .unwrap();
    let keyword = workbench
        .search(Some("exp1"), &SearchQuery::keyword("learning"))
        .await
        .unwrap();
    assert_eq!(semantic, keyword);

    let explained = workbench
        .explain(Some("exp1"), &SearchQuery::semantic("learning"))
        .await
        .unwrap();
    assert!(!explained.vector_backend_available);
}

#[tokio::test]
async fn test_backup_writes_every_backend() {
    let dir = TempDir::new().unwrap();
    let workbench = seeded(&config(dir.path())).await;

    let report = workbench.orchestrator().backup("exp1", None).await.unwrap();
    assert!(report.path.starts_with(dir.path().join("backups")));
    assert!(report.path.join("knowledge_rag_exp1.sql").exists());

    let stub: Value = serde_json::from_str(
        &std::fs::read_to_string(report.path.join("knowledge_rag_exp1_documents.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(stub["collection_name"], "knowledge_rag_exp1_documents");
    assert!(report.path.join("local_object_store_exp1").is_dir());
}

#[tokio::test]
async fn test_analyze_reports_per_strategy() {
    let dir = TempDir::new().unwrap();
    let workbench = seeded(&config(dir.path())).await;

    let report = workbench
        .analyze(Some("exp1"), &["machine learning", "networks"], &[])
        .await
        .unwrap();
    assert_eq!(report.strategies.len(), 3);
    assert!(report.strategies.iter().all(|s| s.errors == 0 && s.total_queries == 2));
    assert!(report.report().starts_with("Search performance report - exp1\n"));
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = config(dir.path());
    config.vector.metric = "manhattan".to_string();

    let err = Workbench::from_config(&config).await.err().unwrap();
    assert!(matches!(err, WorkbenchError::Config(_)));
}
