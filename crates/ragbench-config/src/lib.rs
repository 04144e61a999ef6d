//! # ragbench Config
//!
//! Configuration management for ragbench: TOML schema with defaults for
//! every field, `${VAR}` and `~` expansion, and validation.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
