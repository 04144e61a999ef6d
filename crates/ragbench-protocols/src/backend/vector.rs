//! Vector index adapter and its record types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BackendError;
use crate::types::Metadata;

/// A vector with its scalar fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    #[serde(default)]
    pub fields: Metadata,
}

impl VectorRecord {
    pub fn new(id: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            vector,
            fields: Metadata::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// A nearest-neighbour hit. Lower distance is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    pub id: String,
    pub distance: f32,
    #[serde(default)]
    pub fields: Metadata,
}

/// Scalar pre-filter applied during vector search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_label: Option<String>,
    /// Inclusive `ts` range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts_range: Option<(i64, i64)>,
}

impl VectorFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_id(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_doc_uuid(mut self, doc_uuid: impl Into<String>) -> Self {
        self.doc_uuid = Some(doc_uuid.into());
        self
    }

    pub fn with_version_label(mut self, label: impl Into<String>) -> Self {
        self.version_label = Some(label.into());
        self
    }

    pub fn with_ts_range(mut self, start: i64, end: i64) -> Self {
        self.ts_range = Some((start, end));
        self
    }

    /// Build a filter from query filters.
    ///
    /// Recognized keys are `user_id`, `doc_uuid`, `version_label` and the
    /// `ts_start`/`ts_end` pair. Everything else is ignored.
    pub fn from_filters(filters: &Metadata) -> Self {
        let user_id = filters.get("user_id").and_then(as_i64);
        let doc_uuid = filters
            .get("doc_uuid")
            .and_then(Value::as_str)
            .map(str::to_string);
        let version_label = filters
            .get("version_label")
            .and_then(Value::as_str)
            .map(str::to_string);
        let ts_range = match (
            filters.get("ts_start").and_then(as_i64),
            filters.get("ts_end").and_then(as_i64),
        ) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        };
        Self {
            user_id,
            doc_uuid,
            version_label,
            ts_range,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none()
            && self.doc_uuid.is_none()
            && self.version_label.is_none()
            && self.ts_range.is_none()
    }

    /// Render as a boolean expression, e.g. `user_id == 3 and doc_uuid == "d1"`.
    pub fn to_expr(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(user_id) = self.user_id {
            parts.push(format!("user_id == {user_id}"));
        }
        if let Some(doc_uuid) = &self.doc_uuid {
            parts.push(format!("doc_uuid == \"{doc_uuid}\""));
        }
        if let Some(label) = &self.version_label {
            parts.push(format!("version_label == \"{label}\""));
        }
        if let Some((start, end)) = self.ts_range {
            parts.push(format!("ts >= {start} and ts <= {end}"));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" and "))
        }
    }

    /// Evaluate the filter against a record's fields. Missing fields never match.
    pub fn matches(&self, fields: &Metadata) -> bool {
        if let Some(user_id) = self.user_id {
            if fields.get("user_id").and_then(as_i64) != Some(user_id) {
                return false;
            }
        }
        if let Some(doc_uuid) = &self.doc_uuid {
            if fields.get("doc_uuid").and_then(Value::as_str) != Some(doc_uuid.as_str()) {
                return false;
            }
        }
        if let Some(label) = &self.version_label {
            if fields.get("version_label").and_then(Value::as_str) != Some(label.as_str()) {
                return false;
            }
        }
        if let Some((start, end)) = self.ts_range {
            match fields.get("ts").and_then(as_i64) {
                Some(ts) if ts >= start && ts <= end => {}
                _ => return false,
            }
        }
        true
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// A store of named vector collections.
#[async_trait]
pub trait VectorIndexAdapter: Send + Sync {
    async fn create_collection(&self, name: &str, dimension: usize) -> Result<(), BackendError>;

    async fn drop_collection(&self, name: &str) -> Result<(), BackendError>;

    async fn has_collection(&self, name: &str) -> Result<bool, BackendError>;

    /// Insert or replace records by id. Returns the number written.
    async fn upsert(&self, name: &str, records: Vec<VectorRecord>) -> Result<usize, BackendError>;

    /// Nearest neighbours of `vector`, closest first.
    async fn search(
        &self,
        name: &str,
        vector: &[f32],
        top_k: usize,
        filter: Option<&VectorFilter>,
    ) -> Result<Vec<VectorHit>, BackendError>;

    /// Server version; doubles as the connectivity check.
    async fn version(&self) -> Result<String, BackendError>;
}

#[cfg(test)]
#[path = "vector_tests.rs"]
mod tests;
