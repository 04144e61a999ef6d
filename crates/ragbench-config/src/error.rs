//! Errors raised while loading and validating a ragbench config.

use std::path::PathBuf;

use thiserror::Error;

/// Origin label for configs parsed from an in-memory string.
pub const INLINE_ORIGIN: &str = "<inline>";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ragbench config not found at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("cannot read ragbench config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{origin}: malformed TOML: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("{origin}:{line}: environment variable `{var}` is not set")]
    EnvVarNotSet {
        origin: String,
        line: usize,
        var: String,
    },

    #[error("invalid [{section}] {key}: {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },

    #[error("bad `${{VAR}}` placeholder pattern: {0}")]
    Placeholder(#[from] regex::Error),
}

impl ConfigError {
    /// Build an [`ConfigError::InvalidValue`] from a dotted path such as
    /// `retrieval.default_top_k`. The first segment names the TOML section;
    /// a path without a dot is reported under `root`.
    pub fn invalid(path: &str, message: impl Into<String>) -> Self {
        let (section, key) = match path.split_once('.') {
            Some((section, key)) => (section, key),
            None => ("root", path),
        };
        Self::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            message: message.into(),
        }
    }
}
