//! # ragbench Protocols
//!
//! Core protocol definitions for ragbench experiment environments.
//! Contains interface definitions, the shared data model and the error
//! taxonomy. Backend implementations live in the extension crates.
//!
//! ## Core Traits
//!
//! - [`RelationalAdapter`] - namespaced relational store
//! - [`VectorIndexAdapter`] - vector collections with nearest-neighbour search
//! - [`BlobAdapter`] - directory-tree blob store
//! - [`EmbeddingProvider`] - text to vector capability

pub mod backend;
pub mod descriptor;
pub mod error;
pub mod identifier;
pub mod search;
pub mod types;

pub use backend::{
    BackendHealth, BackendKind, BlobAdapter, BlobStat, Embedding, EmbeddingProvider,
    HealthStatus, RelationalAdapter, VectorFilter, VectorHit, VectorIndexAdapter, VectorRecord,
};
pub use descriptor::{ExperimentDescriptor, ExperimentNote};
pub use error::{BackendError, EmbeddingError, LifecycleError, RetrievalError, TemplateError};
pub use identifier::{is_valid_identifier, validate_experiment_name};
pub use search::{SearchQuery, SearchResult, SearchStrategy, CUSTOM_SQL_KEY, USER_ID_KEY};
pub use types::*;
