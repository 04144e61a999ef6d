//! Relational store adapter.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BackendError;
use crate::types::{ColumnInfo, Row, SqlDialect};

/// A relational store partitioned into namespaces, one per experiment.
#[async_trait]
pub trait RelationalAdapter: Send + Sync {
    /// Dialect the store expects DDL in.
    fn dialect(&self) -> SqlDialect;

    /// Create a namespace and apply the given DDL inside it.
    async fn create_namespace(&self, namespace: &str, ddl: &str) -> Result<(), BackendError>;

    /// Drop a namespace and everything in it.
    async fn drop_namespace(&self, namespace: &str) -> Result<(), BackendError>;

    async fn list_namespaces(&self) -> Result<Vec<String>, BackendError>;

    async fn list_tables(&self, namespace: &str) -> Result<Vec<String>, BackendError>;

    /// Run a parameterized query and return its rows.
    async fn query(
        &self,
        namespace: &str,
        sql: &str,
        args: &[Value],
    ) -> Result<Vec<Row>, BackendError>;

    /// Run a statement verbatim on a connection that rejects writes.
    async fn query_read_only(&self, namespace: &str, sql: &str) -> Result<Vec<Row>, BackendError>;

    /// Run a parameterized statement and return the affected row count.
    async fn execute(&self, namespace: &str, sql: &str, args: &[Value])
    -> Result<u64, BackendError>;

    async fn describe_columns(
        &self,
        namespace: &str,
        table: &str,
    ) -> Result<Vec<ColumnInfo>, BackendError>;

    async fn count_rows(&self, namespace: &str, table: &str) -> Result<u64, BackendError>;

    /// Full logical SQL dump of a namespace.
    async fn dump(&self, namespace: &str) -> Result<String, BackendError>;

    /// Connectivity check returning the server version.
    async fn ping(&self) -> Result<String, BackendError>;
}
