//! Explicit retrieval context for one experiment.

use std::sync::Arc;

use ragbench_protocols::{ExperimentDescriptor, RelationalAdapter, VectorIndexAdapter};

/// Descriptor plus the adapter handles a search needs.
///
/// Sessions are cheap to clone and never mutate lifecycle state.
#[derive(Clone)]
pub struct ExperimentSession {
    descriptor: ExperimentDescriptor,
    relational: Arc<dyn RelationalAdapter>,
    vector: Option<Arc<dyn VectorIndexAdapter>>,
}

impl ExperimentSession {
    pub fn new(
        descriptor: ExperimentDescriptor,
        relational: Arc<dyn RelationalAdapter>,
        vector: Option<Arc<dyn VectorIndexAdapter>>,
    ) -> Self {
        Self {
            descriptor,
            relational,
            vector,
        }
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn namespace(&self) -> &str {
        &self.descriptor.namespace
    }

    pub fn collection(&self) -> &str {
        &self.descriptor.collection
    }

    pub fn descriptor(&self) -> &ExperimentDescriptor {
        &self.descriptor
    }

    pub fn relational(&self) -> &Arc<dyn RelationalAdapter> {
        &self.relational
    }

    pub fn vector(&self) -> Option<&Arc<dyn VectorIndexAdapter>> {
        self.vector.as_ref()
    }
}

impl std::fmt::Debug for ExperimentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExperimentSession")
            .field("experiment", &self.descriptor.name)
            .field("namespace", &self.descriptor.namespace)
            .field("collection", &self.descriptor.collection)
            .field("vector", &self.vector.is_some())
            .finish()
    }
}
