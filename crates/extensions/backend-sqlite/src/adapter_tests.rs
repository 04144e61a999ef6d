use super::*;
use serde_json::json;
use tempfile::TempDir;

const DDL: &str = "
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title VARCHAR(255) NOT NULL,
    content LONGTEXT,
    user_id BIGINT
);
CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id BIGINT NOT NULL,
    text MEDIUMTEXT NOT NULL,
    FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
);
";

async fn adapter_with_namespace(dir: &TempDir) -> SqliteRelationalAdapter {
    let adapter = SqliteRelationalAdapter::new(dir.path().join("rel"));
    adapter.create_namespace("ns1", DDL).await.unwrap();
    adapter
}

#[tokio::test]
async fn test_dialect() {
    let adapter = SqliteRelationalAdapter::new("/tmp/unused");
    assert_eq!(adapter.dialect(), SqlDialect::Sqlite);
}

#[tokio::test]
async fn test_create_and_list_namespaces() {
    let dir = TempDir::new().unwrap();
    let adapter = adapter_with_namespace(&dir).await;
    adapter.create_namespace("ns0", DDL).await.unwrap();

    assert_eq!(adapter.list_namespaces().await.unwrap(), vec!["ns0", "ns1"]);
    assert_eq!(adapter.list_tables("ns1").await.unwrap(), vec!["chunks", "documents"]);
}

#[tokio::test]
async fn test_create_namespace_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let adapter = adapter_with_namespace(&dir).await;
    adapter.create_namespace("ns1", DDL).await.unwrap();
    assert_eq!(adapter.list_namespaces().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_namespaces_missing_dir() {
    let dir = TempDir::new().unwrap();
    let adapter = SqliteRelationalAdapter::new(dir.path().join("nothing-here"));
    assert!(adapter.list_namespaces().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_namespace_rejected() {
    let dir = TempDir::new().unwrap();
    let adapter = SqliteRelationalAdapter::new(dir.path());
    let err = adapter.create_namespace("../escape", DDL).await.unwrap_err();
    assert!(matches!(err, BackendError::InvalidPath(_)));
}

#[tokio::test]
async fn test_bad_ddl_fails() {
    let dir = TempDir::new().unwrap();
    let adapter = SqliteRelationalAdapter::new(dir.path());
    let err = adapter
        .create_namespace("ns1", "CREATE TABLE broken (")
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::OperationFailed(_)));
}

#[tokio::test]
async fn test_execute_and_query() {
    let dir = TempDir::new().unwrap();
    let adapter = adapter_with_namespace(&dir).await;

    let affected = adapter
        .execute(
            "ns1",
            "INSERT INTO documents (title, content, user_id) VALUES (?, ?, ?)",
            &[json!("Intro"), json!("machine learning basics"), json!(1)],
        )
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let rows = adapter
        .query("ns1", "SELECT id, title, content FROM documents WHERE user_id = ?", &[json!(1)])
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    let names: Vec<&str> = rows[0].iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["id", "title", "content"]);
    assert_eq!(rows[0].get("id"), Some(&json!(1)));
    assert_eq!(rows[0].get("title"), Some(&json!("Intro")));
}

#[tokio::test]
async fn test_query_missing_namespace() {
    let dir = TempDir::new().unwrap();
    let adapter = SqliteRelationalAdapter::new(dir.path());
    let err = adapter.query("nope", "SELECT 1", &[]).await.unwrap_err();
    assert!(matches!(err, BackendError::NotFound(_)));
}

#[tokio::test]
async fn test_describe_columns() {
    let dir = TempDir::new().unwrap();
    let adapter = adapter_with_namespace(&dir).await;

    let columns = adapter.describe_columns("ns1", "documents").await.unwrap();
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "title", "content", "user_id"]);
    assert!(columns[0].primary_key);
    assert!(!columns[1].nullable);
    assert!(columns[1].is_textual());
    assert!(columns[2].is_textual());
    assert!(!columns[3].is_textual());
}

#[tokio::test]
async fn test_describe_missing_table() {
    let dir = TempDir::new().unwrap();
    let adapter = adapter_with_namespace(&dir).await;
    let err = adapter.describe_columns("ns1", "ghosts").await.unwrap_err();
    assert!(matches!(err, BackendError::NotFound(_)));
}

#[tokio::test]
async fn test_count_rows() {
    let dir = TempDir::new().unwrap();
    let adapter = adapter_with_namespace(&dir).await;
    for title in ["a", "b", "c"] {
        adapter
            .execute("ns1", "INSERT INTO documents (title) VALUES (?)", &[json!(title)])
            .await
            .unwrap();
    }
    assert_eq!(adapter.count_rows("ns1", "documents").await.unwrap(), 3);
    assert_eq!(adapter.count_rows("ns1", "chunks").await.unwrap(), 0);
}

#[tokio::test]
async fn test_query_read_only_allows_select() {
    let dir = TempDir::new().unwrap();
    let adapter = adapter_with_namespace(&dir).await;
    adapter
        .execute("ns1", "INSERT INTO documents (title) VALUES ('x')", &[])
        .await
        .unwrap();

    let rows = adapter
        .query_read_only("ns1", "SELECT title FROM documents")
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_query_read_only_rejects_writes() {
    let dir = TempDir::new().unwrap();
    let adapter = adapter_with_namespace(&dir).await;

    let err = adapter
        .query_read_only("ns1", "DELETE FROM documents")
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::OperationFailed(_)));

    let err = adapter
        .query_read_only("ns1", "DROP TABLE documents")
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::OperationFailed(_)));
    assert_eq!(adapter.list_tables("ns1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_drop_namespace() {
    let dir = TempDir::new().unwrap();
    let adapter = adapter_with_namespace(&dir).await;

    adapter.drop_namespace("ns1").await.unwrap();
    assert!(adapter.list_namespaces().await.unwrap().is_empty());
    assert!(!dir.path().join("rel").join("ns1.db").exists());

    // Dropping again is fine
    adapter.drop_namespace("ns1").await.unwrap();
}

#[tokio::test]
async fn test_dump_contains_schema_and_rows() {
    let dir = TempDir::new().unwrap();
    let adapter = adapter_with_namespace(&dir).await;
    adapter
        .execute(
            "ns1",
            "INSERT INTO documents (title, content) VALUES (?, ?)",
            &[json!("O'Brien"), json!("text")],
        )
        .await
        .unwrap();

    let dump = adapter.dump("ns1").await.unwrap();
    assert!(dump.starts_with("-- ragbench SQLite dump of namespace ns1"));
    assert!(dump.contains("CREATE TABLE documents"));
    assert!(dump.contains("INSERT INTO \"documents\" VALUES(1,'O''Brien','text',NULL);"));
    assert!(dump.trim_end().ends_with("COMMIT;"));
}

#[tokio::test]
async fn test_dump_restores_into_fresh_namespace() {
    let dir = TempDir::new().unwrap();
    let adapter = adapter_with_namespace(&dir).await;
    adapter
        .execute("ns1", "INSERT INTO documents (title) VALUES ('kept')", &[])
        .await
        .unwrap();

    let dump = adapter.dump("ns1").await.unwrap();
    adapter.create_namespace("restored", &dump).await.unwrap();
    assert_eq!(adapter.count_rows("restored", "documents").await.unwrap(), 1);
}

#[tokio::test]
async fn test_ping() {
    let dir = TempDir::new().unwrap();
    let adapter = SqliteRelationalAdapter::new(dir.path().join("rel"));
    let version = adapter.ping().await.unwrap();
    assert!(version.starts_with("SQLite 3."));
}
