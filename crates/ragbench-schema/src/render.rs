//! DDL rendering.
//!
//! Pure and deterministic: the same template always renders to the same bytes.

use chrono::SecondsFormat;
use serde_json::Value;

use ragbench_protocols::SqlDialect;

use crate::template::{ColumnDef, ForeignKeyDef, IndexDef, IndexKind, SchemaTemplate, TableDef};

const MYSQL_TABLE_OPTIONS: &str = "ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci";

/// Default expressions rendered without quotes.
const KEYWORD_DEFAULTS: [&str; 2] = ["CURRENT_TIMESTAMP", "NULL"];

/// Render a template to DDL for the given dialect.
///
/// `MySql` is the canonical form. `Sqlite` maps auto-increment primary keys to
/// `INTEGER PRIMARY KEY AUTOINCREMENT`, maps `ENUM(...)` to `TEXT`, drops
/// column comments and table options, and skips full-text indexes.
pub fn render_ddl(template: &SchemaTemplate, dialect: SqlDialect) -> String {
    let mut lines = vec![
        format!("-- {} schema", template.name),
        format!("-- Description: {}", single_line(&template.description)),
        format!(
            "-- Created: {}",
            template.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ),
        format!("-- Version: {}", single_line(&template.version)),
        String::new(),
    ];

    for table in &template.tables {
        render_table(table, dialect, &mut lines);
    }

    lines.join("\n")
}

fn render_table(table: &TableDef, dialect: SqlDialect, lines: &mut Vec<String>) {
    lines.push(format!("-- Table: {}", table.name));
    lines.push(format!("CREATE TABLE IF NOT EXISTS {} (", table.name));

    let mut body: Vec<String> = table
        .columns
        .iter()
        .map(|col| format!("    {}", render_column(col, dialect)))
        .collect();
    body.extend(
        table
            .foreign_keys
            .iter()
            .map(|fk| format!("    {}", render_foreign_key(fk))),
    );
    lines.push(body.join(",\n"));

    match dialect {
        SqlDialect::MySql => lines.push(format!(") {};", MYSQL_TABLE_OPTIONS)),
        SqlDialect::Sqlite => lines.push(");".to_string()),
    }
    lines.push(String::new());

    for idx in &table.indexes {
        if dialect == SqlDialect::Sqlite && idx.kind == IndexKind::FulltextIndex {
            continue;
        }
        lines.push(render_index(&table.name, idx));
    }
    lines.push(String::new());
}

fn render_column(col: &ColumnDef, dialect: SqlDialect) -> String {
    let mut sql = match dialect {
        SqlDialect::Sqlite if col.auto_increment && col.primary_key => {
            return format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", col.name);
        }
        SqlDialect::Sqlite if is_enum(&col.data_type) => format!("{} TEXT", col.name),
        _ => format!("{} {}", col.name, col.data_type),
    };

    if col.not_null {
        sql.push_str(" NOT NULL");
    }
    if col.auto_increment && dialect == SqlDialect::MySql {
        sql.push_str(" AUTO_INCREMENT");
    }
    if col.primary_key {
        sql.push_str(" PRIMARY KEY");
    }
    if let Some(default) = &col.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&render_default(default));
    }
    if let Some(comment) = col.comment.as_deref().filter(|c| !c.is_empty()) {
        if dialect == SqlDialect::MySql {
            sql.push_str(&format!(" COMMENT {}", quote_literal(comment)));
        }
    }
    sql
}

fn render_foreign_key(fk: &ForeignKeyDef) -> String {
    let mut sql = format!(
        "FOREIGN KEY ({}) REFERENCES {}({})",
        fk.column, fk.ref_table, fk.ref_column
    );
    if let Some(action) = &fk.on_delete {
        sql.push_str(&format!(" ON DELETE {}", action.to_uppercase()));
    }
    if let Some(action) = &fk.on_update {
        sql.push_str(&format!(" ON UPDATE {}", action.to_uppercase()));
    }
    sql
}

fn render_index(table: &str, idx: &IndexDef) -> String {
    format!(
        "CREATE {} idx_{}_{} ON {} ({});",
        idx.kind.as_sql(),
        table,
        idx.name,
        table,
        idx.columns.join(", ")
    )
}

/// Strings are quoted unless they are a keyword expression; numbers and
/// booleans are rendered bare.
fn render_default(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            let upper = s.trim().to_uppercase();
            if KEYWORD_DEFAULTS.contains(&upper.as_str()) {
                upper
            } else {
                quote_literal(s)
            }
        }
        other => quote_literal(&other.to_string()),
    }
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn is_enum(data_type: &str) -> bool {
    data_type.trim_start().to_uppercase().starts_with("ENUM")
}

fn single_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
