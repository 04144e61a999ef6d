//! Experiment descriptor, the durable record of one experiment.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;

/// A timestamped free-text note attached to an experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentNote {
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentDescriptor {
    pub name: String,
    #[serde(default)]
    pub researcher: String,
    #[serde(default)]
    pub description: String,
    pub template_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Relational namespace holding the experiment tables.
    pub namespace: String,
    /// Vector collection name.
    pub collection: String,
    /// Blob directory, relative to the blob store root.
    pub blob_dir: String,

    /// Advisory cache of which backends hold this experiment.
    /// Reconciled against live checks by list and health.
    #[serde(default)]
    pub backend_existence: BTreeMap<BackendKind, bool>,

    #[serde(default)]
    pub notes: Vec<ExperimentNote>,
}

impl ExperimentDescriptor {
    pub fn new(
        name: impl Into<String>,
        researcher: impl Into<String>,
        description: impl Into<String>,
        template_name: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            namespace: name.clone(),
            collection: name.clone(),
            blob_dir: name.clone(),
            name,
            researcher: researcher.into(),
            description: description.into(),
            template_name: template_name.into(),
            created_at: now,
            updated_at: now,
            backend_existence: BTreeMap::new(),
            notes: Vec::new(),
        }
    }

    /// Set the per-backend resource names.
    pub fn with_resources(
        mut self,
        namespace: impl Into<String>,
        collection: impl Into<String>,
        blob_dir: impl Into<String>,
    ) -> Self {
        self.namespace = namespace.into();
        self.collection = collection.into();
        self.blob_dir = blob_dir.into();
        self
    }

    pub fn exists_in(&self, kind: BackendKind) -> bool {
        self.backend_existence.get(&kind).copied().unwrap_or(false)
    }

    pub fn set_exists(&mut self, kind: BackendKind, exists: bool) {
        self.backend_existence.insert(kind, exists);
    }

    pub fn add_note(&mut self, text: impl Into<String>) {
        let now = Utc::now();
        self.notes.push(ExperimentNote {
            timestamp: now,
            text: text.into(),
        });
        self.updated_at = now;
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_descriptor_defaults() {
        let desc = ExperimentDescriptor::new("exp1", "alice", "first run", "basic_rag");
        assert_eq!(desc.namespace, "exp1");
        assert!(desc.notes.is_empty());
        assert!(!desc.exists_in(BackendKind::Relational));
    }

    #[test]
    fn test_with_resources() {
        let desc = ExperimentDescriptor::new("exp1", "", "", "basic_rag").with_resources(
            "knowledge_rag_exp1",
            "knowledge_rag_exp1_documents",
            "experiments/exp1",
        );
        assert_eq!(desc.collection, "knowledge_rag_exp1_documents");
        assert_eq!(desc.blob_dir, "experiments/exp1");
    }

    #[test]
    fn test_notes_are_ordered() {
        let mut desc = ExperimentDescriptor::new("exp1", "", "", "basic_rag");
        desc.add_note("first");
        desc.add_note("second");
        let texts: Vec<&str> = desc.notes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert!(desc.updated_at >= desc.created_at);
    }

    #[test]
    fn test_backend_existence_roundtrip_json() {
        let mut desc = ExperimentDescriptor::new("exp1", "", "", "basic_rag");
        desc.set_exists(BackendKind::Relational, true);
        desc.set_exists(BackendKind::Vector, false);
        let json = serde_json::to_string(&desc).unwrap();
        assert!(json.contains("\"relational\":true"));
        let back: ExperimentDescriptor = serde_json::from_str(&json).unwrap();
        assert!(back.exists_in(BackendKind::Relational));
        assert!(!back.exists_in(BackendKind::Vector));
    }
}
