//! Embedding providers for ragbench.
//!
//! - [`SimpleHashEmbedding`]: deterministic, offline, not semantic
//! - [`OpenAIEmbedding`]: OpenAI-compatible `/embeddings` endpoint

mod builder;
mod hash;
mod openai;

pub use builder::build_provider;
pub use hash::SimpleHashEmbedding;
pub use openai::{OpenAIEmbedding, OpenAIEmbeddingConfig};
