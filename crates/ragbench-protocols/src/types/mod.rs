//! Common types shared by adapters, lifecycle and retrieval.

mod common;
mod dialect;
mod row;

pub use common::*;
pub use dialect::*;
pub use row::*;
