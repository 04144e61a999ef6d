//! SQLite implementation of [`RelationalAdapter`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use rusqlite::OpenFlags;
use serde_json::Value;
use tokio::fs;
use tokio_rusqlite::Connection;
use tracing::{debug, info, warn};

use ragbench_protocols::{
    is_valid_identifier, BackendError, ColumnInfo, RelationalAdapter, Row, SqlDialect,
};

use crate::convert::{collect_rows, to_sql_literal, to_sql_value};

const DB_EXTENSION: &str = "db";

/// Files SQLite may leave next to a database.
const SIDECAR_SUFFIXES: [&str; 3] = ["-wal", "-shm", "-journal"];

#[cfg(test)]
#[path = "adapter_tests.rs"]
mod tests;

/// SQLite-based relational adapter.
///
/// ```text
/// {data_dir}/
/// ├── knowledge_rag_exp1.db
/// ├── knowledge_rag_exp2.db
/// └── ...
/// ```
pub struct SqliteRelationalAdapter {
    data_dir: PathBuf,
    connections: DashMap<String, Connection>,
}

impl SqliteRelationalAdapter {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            connections: DashMap::new(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn db_path(&self, namespace: &str) -> Result<PathBuf, BackendError> {
        if !is_valid_identifier(namespace) {
            return Err(BackendError::InvalidPath(format!(
                "invalid namespace '{}'",
                namespace
            )));
        }
        Ok(self.data_dir.join(format!("{}.{}", namespace, DB_EXTENSION)))
    }

    fn check_table(table: &str) -> Result<(), BackendError> {
        if is_valid_identifier(table) {
            Ok(())
        } else {
            Err(BackendError::OperationFailed(format!(
                "invalid table name '{}'",
                table
            )))
        }
    }

    async fn open_file(path: &Path, flags: OpenFlags) -> Result<Connection, BackendError> {
        let conn = Connection::open_with_flags(path, flags)
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;
        conn.call(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        })
        .await
        .map_err(|e| BackendError::Unreachable(e.to_string()))?;
        Ok(conn)
    }

    /// Cached read-write connection to an existing namespace.
    async fn connection(&self, namespace: &str) -> Result<Connection, BackendError> {
        if let Some(conn) = self.connections.get(namespace) {
            return Ok(conn.clone());
        }

        let path = self.db_path(namespace)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(BackendError::NotFound(format!("namespace {}", namespace)));
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Self::open_file(&path, flags).await?;
        self.connections.insert(namespace.to_string(), conn.clone());
        Ok(conn)
    }

    async fn query_on(
        conn: &Connection,
        sql: String,
        args: Vec<Value>,
    ) -> Result<Vec<Row>, BackendError> {
        conn.call(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let params = rusqlite::params_from_iter(args.iter().map(to_sql_value));
            Ok(collect_rows(&mut stmt, params)?)
        })
        .await
        .map_err(|e| BackendError::OperationFailed(e.to_string()))
    }
}

#[async_trait]
impl RelationalAdapter for SqliteRelationalAdapter {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::Sqlite
    }

    async fn create_namespace(&self, namespace: &str, ddl: &str) -> Result<(), BackendError> {
        let path = self.db_path(namespace)?;
        fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Self::open_file(&path, flags).await?;

        let ddl = ddl.to_string();
        conn.call(move |conn| {
            conn.execute_batch(&ddl)?;
            Ok(())
        })
        .await
        .map_err(|e| BackendError::OperationFailed(e.to_string()))?;

        self.connections.insert(namespace.to_string(), conn);
        info!("Created relational namespace: {}", namespace);
        Ok(())
    }

    async fn drop_namespace(&self, namespace: &str) -> Result<(), BackendError> {
        let path = self.db_path(namespace)?;

        if let Some((_, conn)) = self.connections.remove(namespace) {
            if let Err(e) = conn.close().await {
                warn!("Failed to close connection for {}: {}", namespace, e);
            }
        }

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Namespace {} already absent", namespace);
            }
            Err(e) => return Err(BackendError::OperationFailed(e.to_string())),
        }

        for suffix in SIDECAR_SUFFIXES {
            let mut sidecar = path.clone().into_os_string();
            sidecar.push(suffix);
            let _ = fs::remove_file(PathBuf::from(sidecar)).await;
        }

        info!("Dropped relational namespace: {}", namespace);
        Ok(())
    }

    async fn list_namespaces(&self) -> Result<Vec<String>, BackendError> {
        let mut entries = match fs::read_dir(&self.data_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BackendError::Unreachable(e.to_string())),
        };

        let mut namespaces = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| BackendError::OperationFailed(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == DB_EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    namespaces.push(stem.to_string());
                }
            }
        }
        namespaces.sort();
        Ok(namespaces)
    }

    async fn list_tables(&self, namespace: &str) -> Result<Vec<String>, BackendError> {
        let conn = self.connection(namespace).await?;
        conn.call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
            )?;
            let tables = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tables)
        })
        .await
        .map_err(|e| BackendError::OperationFailed(e.to_string()))
    }

    async fn query(
        &self,
        namespace: &str,
        sql: &str,
        args: &[Value],
    ) -> Result<Vec<Row>, BackendError> {
        let conn = self.connection(namespace).await?;
        Self::query_on(&conn, sql.to_string(), args.to_vec()).await
    }

    async fn query_read_only(&self, namespace: &str, sql: &str) -> Result<Vec<Row>, BackendError> {
        let path = self.db_path(namespace)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(BackendError::NotFound(format!("namespace {}", namespace)));
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .await
        .map_err(|e| BackendError::Unreachable(e.to_string()))?;

        let sql = sql.to_string();
        let result = conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                if !stmt.readonly() {
                    return Err(tokio_rusqlite::Error::Other(
                        "statement is not read-only".into(),
                    ));
                }
                Ok(collect_rows(&mut stmt, [])?)
            })
            .await
            .map_err(|e| BackendError::OperationFailed(e.to_string()));

        if let Err(e) = conn.close().await {
            warn!("Failed to close read-only connection for {}: {}", namespace, e);
        }
        result
    }

    async fn execute(
        &self,
        namespace: &str,
        sql: &str,
        args: &[Value],
    ) -> Result<u64, BackendError> {
        let conn = self.connection(namespace).await?;
        let sql = sql.to_string();
        let args = args.to_vec();
        conn.call(move |conn| {
            let params = rusqlite::params_from_iter(args.iter().map(to_sql_value));
            let affected = conn.execute(&sql, params)?;
            Ok(affected as u64)
        })
        .await
        .map_err(|e| BackendError::OperationFailed(e.to_string()))
    }

    async fn describe_columns(
        &self,
        namespace: &str,
        table: &str,
    ) -> Result<Vec<ColumnInfo>, BackendError> {
        Self::check_table(table)?;
        let conn = self.connection(namespace).await?;
        let sql = format!("PRAGMA table_info({})", SqlDialect::Sqlite.quote_ident(table));
        let columns = conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let columns = stmt
                    .query_map([], |row| {
                        let name: String = row.get(1)?;
                        let data_type: String = row.get(2)?;
                        let not_null: i64 = row.get(3)?;
                        let pk: i64 = row.get(5)?;
                        Ok(ColumnInfo {
                            name,
                            data_type,
                            nullable: not_null == 0,
                            primary_key: pk > 0,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(columns)
            })
            .await
            .map_err(|e| BackendError::OperationFailed(e.to_string()))?;

        if columns.is_empty() {
            return Err(BackendError::NotFound(format!("table {}.{}", namespace, table)));
        }
        Ok(columns)
    }

    async fn count_rows(&self, namespace: &str, table: &str) -> Result<u64, BackendError> {
        Self::check_table(table)?;
        let conn = self.connection(namespace).await?;
        let sql = format!("SELECT COUNT(*) FROM {}", SqlDialect::Sqlite.quote_ident(table));
        conn.call(move |conn| {
            let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
            Ok(count.max(0) as u64)
        })
        .await
        .map_err(|e| BackendError::OperationFailed(e.to_string()))
    }

    async fn dump(&self, namespace: &str) -> Result<String, BackendError> {
        let conn = self.connection(namespace).await?;
        let header = format!("-- ragbench SQLite dump of namespace {}\n", namespace);
        conn.call(move |conn| {
            let mut out = header;
            out.push_str("PRAGMA foreign_keys=OFF;\nBEGIN TRANSACTION;\n");

            let mut stmt = conn.prepare(
                "SELECT type, name, sql FROM sqlite_master
                 WHERE sql IS NOT NULL AND name NOT LIKE 'sqlite_%'
                 ORDER BY CASE type WHEN 'table' THEN 0 ELSE 1 END, rowid",
            )?;
            let objects = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            for (kind, name, sql) in &objects {
                out.push_str(sql);
                out.push_str(";\n");
                if kind != "table" {
                    continue;
                }

                let quoted = SqlDialect::Sqlite.quote_ident(name);
                let mut rows_stmt = conn.prepare(&format!("SELECT * FROM {}", quoted))?;
                let column_count = rows_stmt.column_count();
                let mut rows = rows_stmt.query([])?;
                while let Some(row) = rows.next()? {
                    let mut values = Vec::with_capacity(column_count);
                    for i in 0..column_count {
                        values.push(to_sql_literal(row.get_ref(i)?));
                    }
                    out.push_str(&format!(
                        "INSERT INTO {} VALUES({});\n",
                        quoted,
                        values.join(",")
                    ));
                }
            }

            out.push_str("COMMIT;\n");
            Ok(out)
        })
        .await
        .map_err(|e| BackendError::OperationFailed(e.to_string()))
    }

    async fn ping(&self) -> Result<String, BackendError> {
        fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;

        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;
        let version = conn
            .call(|conn| {
                let version: String = conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?;
                Ok(version)
            })
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;
        let _ = conn.close().await;
        Ok(format!("SQLite {}", version))
    }
}
