//! Common utility types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata map type.
pub type Metadata = HashMap<String, serde_json::Value>;

/// Column description returned by relational introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared type as reported by the backend, e.g. `VARCHAR(255)`.
    pub data_type: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
}

fn default_true() -> bool {
    true
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            primary_key: false,
        }
    }

    /// Textual columns take part in keyword matching.
    pub fn is_textual(&self) -> bool {
        let ty = self.data_type.to_lowercase();
        ty.contains("text") || ty.contains("varchar") || ty.contains("char")
    }
}

#[cfg(test)]
#[path = "common_tests.rs"]
mod tests;
