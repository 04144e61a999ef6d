//! SQLite relational backend for ragbench.
//!
//! Each namespace is a separate database file under the data directory, so
//! creating and dropping a namespace is creating and removing a file.

mod adapter;
mod convert;

pub use adapter::SqliteRelationalAdapter;
