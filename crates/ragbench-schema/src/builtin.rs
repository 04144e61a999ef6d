//! Built-in schema templates.

use serde_json::Value;

use crate::template::{ColumnDef, ForeignKeyDef, SchemaTemplate, TableDef};

pub const BUILTIN_TEMPLATE_NAMES: [&str; 4] =
    ["basic_rag", "vector_experiment", "flexible_json", "graph_database"];

pub fn builtin_templates() -> Vec<SchemaTemplate> {
    vec![basic_rag(), vector_experiment(), flexible_json(), graph_database()]
}

fn id() -> ColumnDef {
    ColumnDef::id("id", "BIGINT")
}

fn created_at() -> ColumnDef {
    ColumnDef::new("created_at", "DATETIME").default_value("CURRENT_TIMESTAMP")
}

/// Users, documents and chunks.
fn basic_rag() -> SchemaTemplate {
    SchemaTemplate::new("basic_rag", "Basic RAG tables")
        .with_table(TableDef::new(
            "users",
            vec![
                id(),
                ColumnDef::new("name", "VARCHAR(255)").not_null().comment("user name"),
                ColumnDef::new("email", "VARCHAR(255)").comment("email"),
                created_at(),
            ],
        ))
        .with_table(
            TableDef::new(
                "documents",
                vec![
                    id(),
                    ColumnDef::new("user_id", "BIGINT").not_null(),
                    ColumnDef::new("title", "VARCHAR(255)").not_null(),
                    ColumnDef::new("content", "LONGTEXT"),
                    created_at(),
                ],
            )
            .with_foreign_key(ForeignKeyDef::new("user_id", "users", "id").on_delete("CASCADE")),
        )
        .with_table(
            TableDef::new(
                "chunks",
                vec![
                    id(),
                    ColumnDef::new("document_id", "BIGINT").not_null(),
                    ColumnDef::new("text", "MEDIUMTEXT").not_null(),
                    ColumnDef::new("sequence", "INT").default_value(0),
                    created_at(),
                ],
            )
            .with_foreign_key(
                ForeignKeyDef::new("document_id", "documents", "id").on_delete("CASCADE"),
            ),
        )
}

/// Embedding bookkeeping and retrieval logs.
fn vector_experiment() -> SchemaTemplate {
    SchemaTemplate::new("vector_experiment", "Vector experiment tables")
        .with_table(TableDef::new(
            "vectors",
            vec![
                id(),
                ColumnDef::new("chunk_id", "BIGINT").not_null(),
                ColumnDef::new("model_name", "VARCHAR(100)").not_null(),
                ColumnDef::new("vector_dim", "INT").not_null(),
                ColumnDef::new("vector_ref", "VARCHAR(50)").comment("id in the vector index"),
                created_at(),
            ],
        ))
        .with_table(TableDef::new(
            "retrieval_logs",
            vec![
                id(),
                ColumnDef::new("query_text", "TEXT").not_null(),
                ColumnDef::new("model_name", "VARCHAR(100)"),
                ColumnDef::new("top_k", "INT").default_value(10),
                ColumnDef::new("results", "JSON").comment("retrieval results"),
                ColumnDef::new("duration_ms", "FLOAT").comment("latency in milliseconds"),
                created_at(),
            ],
        ))
}

/// JSON-heavy documents and experiment records.
fn flexible_json() -> SchemaTemplate {
    SchemaTemplate::new("flexible_json", "Flexible JSON field tables")
        .with_table(TableDef::new(
            "flexible_documents",
            vec![
                id(),
                ColumnDef::new("user_id", "BIGINT").not_null(),
                ColumnDef::new("doc_type", "VARCHAR(50)").default_value("unknown"),
                ColumnDef::new("metadata", "JSON").comment("document metadata"),
                ColumnDef::new("content", "LONGTEXT"),
                ColumnDef::new("properties", "JSON").comment("custom properties"),
                created_at(),
                ColumnDef::new("updated_at", "DATETIME").default_value("CURRENT_TIMESTAMP"),
            ],
        ))
        .with_table(TableDef::new(
            "experiments",
            vec![
                id(),
                ColumnDef::new("name", "VARCHAR(100)").not_null(),
                ColumnDef::new("config", "JSON").comment("experiment config"),
                ColumnDef::new("results", "JSON").comment("experiment results"),
                ColumnDef::new("metrics", "JSON").comment("evaluation metrics"),
                ColumnDef::new("status", "ENUM('running', 'completed', 'failed')")
                    .default_value("running"),
                created_at(),
            ],
        ))
}

/// Property graph as node and edge tables.
fn graph_database() -> SchemaTemplate {
    SchemaTemplate::new("graph_database", "Graph database tables")
        .with_table(TableDef::new(
            "nodes",
            vec![
                id(),
                ColumnDef::new("node_id", "VARCHAR(100)").not_null(),
                ColumnDef::new("node_type", "VARCHAR(50)").not_null(),
                ColumnDef::new("properties", "JSON"),
                created_at(),
            ],
        ))
        .with_table(TableDef::new(
            "edges",
            vec![
                id(),
                ColumnDef::new("from_node", "VARCHAR(100)").not_null(),
                ColumnDef::new("to_node", "VARCHAR(100)").not_null(),
                ColumnDef::new("relation_type", "VARCHAR(50)").not_null(),
                ColumnDef::new("weight", "FLOAT").default_value(Value::from(1.0)),
                ColumnDef::new("properties", "JSON"),
                created_at(),
            ],
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_ddl;
    use ragbench_protocols::SqlDialect;

    #[test]
    fn test_builtin_names_match() {
        let names: Vec<String> = builtin_templates().into_iter().map(|t| t.name).collect();
        assert_eq!(names, BUILTIN_TEMPLATE_NAMES.to_vec());
    }

    #[test]
    fn test_builtins_validate() {
        for template in builtin_templates() {
            template.validate().unwrap();
        }
    }

    #[test]
    fn test_basic_rag_tables_in_fk_order() {
        let template = basic_rag();
        assert_eq!(template.table_names(), vec!["users", "documents", "chunks"]);
        let chunks = template.table("chunks").unwrap();
        assert_eq!(chunks.foreign_keys[0].ref_table, "documents");
    }

    #[test]
    fn test_basic_rag_mysql_ddl() {
        let ddl = render_ddl(&basic_rag(), SqlDialect::MySql);
        assert!(ddl.contains("CREATE TABLE IF NOT EXISTS chunks ("));
        assert!(ddl.contains("    sequence INT DEFAULT 0,"));
        assert!(ddl.contains(
            "    FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE"
        ));
    }

    #[test]
    fn test_graph_edges_weight_default() {
        let ddl = render_ddl(&graph_database(), SqlDialect::MySql);
        assert!(ddl.contains("    weight FLOAT DEFAULT 1.0,"));
    }
}
