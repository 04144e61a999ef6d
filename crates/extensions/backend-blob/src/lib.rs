//! Local filesystem blob store for ragbench.

mod store;

pub use store::LocalBlobStore;
