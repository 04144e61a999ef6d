//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error into a [`ConfigError::InvalidValue`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(ConfigError::invalid(&err.path, err.message)),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

const VALID_METRICS: [&str; 2] = ["cosine", "l2"];
const VALID_PROVIDERS: [&str; 2] = ["hash", "openai"];

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_relational(config, &mut result);
        Self::validate_vector(config, &mut result);
        Self::validate_blob(config, &mut result);
        Self::validate_embedding(config, &mut result);
        Self::validate_lifecycle(config, &mut result);
        Self::validate_retrieval(config, &mut result);

        Ok(result)
    }

    fn is_identifier(s: &str) -> bool {
        s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    fn validate_relational(config: &Config, result: &mut ValidationResult) {
        // Prefix becomes part of every namespace identifier
        if !Self::is_identifier(&config.relational.namespace_prefix) {
            result.add_error(ValidationError::new(
                "relational.namespace_prefix",
                "namespace_prefix may only contain letters, digits and underscore",
            ));
        }
        if config.relational.namespace_prefix.is_empty() {
            result.add_warning(ValidationWarning::new(
                "relational.namespace_prefix",
                "Empty namespace_prefix, every namespace will be treated as an experiment",
            ));
        }
    }

    fn validate_vector(config: &Config, result: &mut ValidationResult) {
        let vector = &config.vector;
        if !VALID_METRICS.contains(&vector.metric.as_str()) {
            result.add_error(ValidationError::new(
                "vector.metric",
                format!(
                    "Unknown metric '{}', valid values: {:?}",
                    vector.metric, VALID_METRICS
                ),
            ));
        }

        if vector.dimension == 0 {
            result.add_error(ValidationError::new(
                "vector.dimension",
                "dimension must be greater than 0",
            ));
        }

        if vector.timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "vector.timeout_ms",
                "timeout_ms must be greater than 0",
            ));
        }

        if !Self::is_identifier(&vector.collection_suffix) {
            result.add_error(ValidationError::new(
                "vector.collection_suffix",
                "collection_suffix may only contain letters, digits and underscore",
            ));
        }

        if !vector.enabled {
            result.add_warning(ValidationWarning::new(
                "vector.enabled",
                "Vector backend disabled, semantic search will fall back to keyword search",
            ));
        }
    }

    fn validate_blob(config: &Config, result: &mut ValidationResult) {
        let dir = &config.blob.experiments_dir;
        if dir.is_empty() || dir.starts_with('/') || dir.split('/').any(|p| p == "..") {
            result.add_error(ValidationError::new(
                "blob.experiments_dir",
                "experiments_dir must be a relative path inside the blob store",
            ));
        }
    }

    fn validate_embedding(config: &Config, result: &mut ValidationResult) {
        let embedding = &config.embedding;
        if !VALID_PROVIDERS.contains(&embedding.provider.as_str()) {
            result.add_error(ValidationError::new(
                "embedding.provider",
                format!(
                    "Unknown embedding provider '{}', valid values: {:?}",
                    embedding.provider, VALID_PROVIDERS
                ),
            ));
        }

        if config.vector.enabled && embedding.dimension != config.vector.dimension {
            result.add_error(ValidationError::new(
                "embedding.dimension",
                format!(
                    "embedding dimension {} does not match vector dimension {}",
                    embedding.dimension, config.vector.dimension
                ),
            ));
        }

        if embedding.provider == "openai" && embedding.api_key.is_none() {
            result.add_warning(ValidationWarning::new(
                "embedding.api_key",
                "API key is not set, may need to be set via environment variable",
            ));
        }

        if let Some(ref url) = embedding.base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                result.add_error(ValidationError::new(
                    "embedding.base_url",
                    "base_url must start with http:// or https://",
                ));
            }
        }
    }

    fn validate_lifecycle(config: &Config, result: &mut ValidationResult) {
        if config.lifecycle.retry_attempts == 0 {
            result.add_error(ValidationError::new(
                "lifecycle.retry_attempts",
                "retry_attempts must be at least 1",
            ));
        }

        if config.lifecycle.retry_attempts > 10 {
            result.add_warning(ValidationWarning::new(
                "lifecycle.retry_attempts",
                "retry_attempts is very high (>10), unreachable backends will stall lifecycle operations",
            ));
        }
    }

    fn validate_retrieval(config: &Config, result: &mut ValidationResult) {
        let retrieval = &config.retrieval;
        if retrieval.default_top_k == 0 {
            result.add_error(ValidationError::new(
                "retrieval.default_top_k",
                "default_top_k must be greater than 0",
            ));
        }

        for (path, weight) in [
            ("retrieval.semantic_weight", retrieval.semantic_weight),
            ("retrieval.keyword_weight", retrieval.keyword_weight),
        ] {
            if !(0.0..=1.0).contains(&weight) {
                result.add_error(ValidationError::new(path, "weight must be within [0, 1]"));
            }
        }

        if (retrieval.semantic_weight + retrieval.keyword_weight - 1.0).abs() > 1e-3 {
            result.add_warning(ValidationWarning::new(
                "retrieval",
                "semantic_weight + keyword_weight != 1, hybrid scores may exceed 1",
            ));
        }

        for (logical, table) in &retrieval.table_mapping {
            if !Self::is_identifier(table) || table.is_empty() {
                result.add_error(ValidationError::new(
                    format!("retrieval.table_mapping.{}", logical),
                    format!("Invalid table name '{}'", table),
                ));
            }
        }

        let lookup = &retrieval.content_lookup;
        for (field, value) in [
            ("table", &lookup.table),
            ("key_column", &lookup.key_column),
            ("content_column", &lookup.content_column),
        ] {
            if value.is_empty() || !Self::is_identifier(value) {
                result.add_error(ValidationError::new(
                    format!("retrieval.content_lookup.{}", field),
                    format!("Invalid identifier '{}'", value),
                ));
            }
        }

        if retrieval.allow_custom_sql {
            result.add_warning(ValidationWarning::new(
                "retrieval.allow_custom_sql",
                "Custom SQL pass-through is enabled, statements run verbatim on a read-only connection",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
