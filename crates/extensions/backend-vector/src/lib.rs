//! Local vector index backend for ragbench.
//!
//! Collections are held in memory, searched brute-force and persisted as one
//! JSON file per collection.

mod adapter;
mod index;

pub use adapter::LocalVectorIndex;
pub use index::{CollectionIndex, VectorMetric};
