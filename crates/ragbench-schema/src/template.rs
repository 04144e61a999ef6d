//! Template data model.
//!
//! Templates are pure configuration. Identifiers are restricted to the
//! `[A-Za-z0-9_]+` grammar and free-text fields are escaped on render, so a
//! validated template can be rendered without further checks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use ragbench_protocols::{is_valid_identifier, TemplateError};

const REFERENTIAL_ACTIONS: [&str; 5] = ["CASCADE", "SET NULL", "SET DEFAULT", "RESTRICT", "NO ACTION"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub not_null: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub primary_key: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub auto_increment: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            not_null: false,
            primary_key: false,
            auto_increment: false,
            default: None,
            comment: None,
        }
    }

    /// Auto-increment primary key.
    pub fn id(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        let mut col = Self::new(name, data_type);
        col.primary_key = true;
        col.auto_increment = true;
        col
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IndexKind {
    #[default]
    #[serde(rename = "INDEX")]
    Index,
    #[serde(rename = "UNIQUE INDEX")]
    UniqueIndex,
    #[serde(rename = "FULLTEXT INDEX")]
    FulltextIndex,
}

impl IndexKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Index => "INDEX",
            Self::UniqueIndex => "UNIQUE INDEX",
            Self::FulltextIndex => "FULLTEXT INDEX",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDef {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default, rename = "type")]
    pub kind: IndexKind,
}

impl IndexDef {
    pub fn new(name: impl Into<String>, columns: &[&str], kind: IndexKind) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    pub column: String,
    pub ref_table: String,
    pub ref_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
}

impl ForeignKeyDef {
    pub fn new(
        column: impl Into<String>,
        ref_table: impl Into<String>,
        ref_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            ref_table: ref_table.into(),
            ref_column: ref_column.into(),
            on_delete: None,
            on_update: None,
        }
    }

    pub fn on_delete(mut self, action: impl Into<String>) -> Self {
        self.on_delete = Some(action.into());
        self
    }

    pub fn on_update(mut self, action: impl Into<String>) -> Self {
        self.on_update = Some(action.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKeyDef>,
}

impl TableDef {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.into(),
            columns,
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn with_index(mut self, index: IndexDef) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn with_foreign_key(mut self, fk: ForeignKeyDef) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }
}

fn default_version() -> String {
    "1.0".to_string()
}

/// A named, versioned set of table definitions.
///
/// Tables keep declaration order so referenced tables are created first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub tables: Vec<TableDef>,
}

impl SchemaTemplate {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            version: default_version(),
            created_at: Utc::now(),
            tables: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: TableDef) -> Self {
        self.tables.push(table);
        self
    }

    pub fn with_tables(mut self, tables: Vec<TableDef>) -> Self {
        self.tables.extend(tables);
        self
    }

    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Check identifier grammar and internal references.
    pub fn validate(&self) -> Result<(), TemplateError> {
        let invalid = |msg: String| Err(TemplateError::InvalidTemplate(format!("{}: {}", self.name, msg)));

        if !is_valid_identifier(&self.name) {
            return invalid("template name must match [A-Za-z0-9_]+".to_string());
        }
        if self.tables.is_empty() {
            return invalid("template has no tables".to_string());
        }

        let mut seen_tables = Vec::new();
        for table in &self.tables {
            if !is_valid_identifier(&table.name) {
                return invalid(format!("invalid table name '{}'", table.name));
            }
            if seen_tables.contains(&table.name.as_str()) {
                return invalid(format!("duplicate table '{}'", table.name));
            }
            seen_tables.push(table.name.as_str());

            if table.columns.is_empty() {
                return invalid(format!("table '{}' has no columns", table.name));
            }
            let mut seen_columns = Vec::new();
            for col in &table.columns {
                if !is_valid_identifier(&col.name) {
                    return invalid(format!("invalid column name '{}.{}'", table.name, col.name));
                }
                if seen_columns.contains(&col.name.as_str()) {
                    return invalid(format!("duplicate column '{}.{}'", table.name, col.name));
                }
                seen_columns.push(col.name.as_str());
                if !is_valid_type(&col.data_type) {
                    return invalid(format!(
                        "invalid type '{}' for column '{}.{}'",
                        col.data_type, table.name, col.name
                    ));
                }
            }

            for idx in &table.indexes {
                if !is_valid_identifier(&idx.name) || idx.columns.is_empty() {
                    return invalid(format!("invalid index '{}' on '{}'", idx.name, table.name));
                }
                if let Some(col) = idx.columns.iter().find(|c| !table.has_column(c)) {
                    return invalid(format!(
                        "index '{}' references unknown column '{}.{}'",
                        idx.name, table.name, col
                    ));
                }
            }

            for fk in &table.foreign_keys {
                if !table.has_column(&fk.column) {
                    return invalid(format!(
                        "foreign key references unknown column '{}.{}'",
                        table.name, fk.column
                    ));
                }
                if !is_valid_identifier(&fk.ref_table) || !is_valid_identifier(&fk.ref_column) {
                    return invalid(format!(
                        "invalid foreign key target '{}({})'",
                        fk.ref_table, fk.ref_column
                    ));
                }
                for action in [&fk.on_delete, &fk.on_update].into_iter().flatten() {
                    if !REFERENTIAL_ACTIONS.contains(&action.to_uppercase().as_str()) {
                        return invalid(format!("invalid referential action '{}'", action));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Column types are free-form (`ENUM('a', 'b')`, `VARCHAR(255)`) but may not
/// terminate or comment out the statement.
fn is_valid_type(ty: &str) -> bool {
    !ty.trim().is_empty()
        && !ty.contains(';')
        && !ty.contains("--")
        && !ty.contains("/*")
        && ty
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || " _(),'".contains(c))
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
