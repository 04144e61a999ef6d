//! Backend adapter protocol definitions.
//!
//! Each experiment spans three independent backends. Adapters are
//! capability-narrow and share no transaction boundary.

mod blob;
mod embedding;
mod health;
mod relational;
mod vector;

pub use blob::*;
pub use embedding::*;
pub use health::*;
pub use relational::*;
pub use vector::*;
