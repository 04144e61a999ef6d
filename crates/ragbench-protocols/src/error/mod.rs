//! Error types for the ragbench protocol layer.

mod backend;
mod embedding;
mod lifecycle;
mod retrieval;
mod template;

pub use backend::*;
pub use embedding::*;
pub use lifecycle::*;
pub use retrieval::*;
pub use template::*;
