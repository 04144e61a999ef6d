//! # ragbench Schema
//!
//! Named table-definition templates stored as data and rendered to DDL.
//!
//! Four built-in templates (`basic_rag`, `vector_experiment`,
//! `flexible_json`, `graph_database`) are bootstrapped into a registry on
//! first use when absent.

pub mod builtin;
pub mod registry;
pub mod render;
pub mod template;

pub use builtin::{builtin_templates, BUILTIN_TEMPLATE_NAMES};
pub use registry::{FileTemplateRegistry, MemoryTemplateRegistry, TemplateRegistry};
pub use render::render_ddl;
pub use template::{ColumnDef, ForeignKeyDef, IndexDef, IndexKind, SchemaTemplate, TableDef};
