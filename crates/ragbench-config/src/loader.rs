//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ConfigError, INLINE_ORIGIN};
use crate::schema::Config;

static ENV_VAR_RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        Self::parse(content, INLINE_ORIGIN)
    }

    fn parse(content: &str, origin: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content, origin)?;
        let mut config: Config =
            toml::from_str(&expanded).map_err(|source| ConfigError::Parse {
                origin: origin.to_string(),
                source,
            })?;
        Self::expand_config_paths(&mut config);
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str, origin: &str) -> Result<String, ConfigError> {
        let re = ENV_VAR_RE
            .get_or_init(|| Regex::new(r"\$\{([^}]+)\}"))
            .as_ref()
            .map_err(|e| ConfigError::Placeholder(e.clone()))?;

        let mut result = content.to_string();
        for cap in re.captures_iter(content) {
            let (Some(whole), Some(var)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            let value = std::env::var(var.as_str()).map_err(|_| ConfigError::EnvVarNotSet {
                origin: origin.to_string(),
                line: content[..whole.start()].matches('\n').count() + 1,
                var: var.as_str().to_string(),
            })?;
            result = result.replace(whole.as_str(), &value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.ragbench`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }

    fn expand_path_buf(path: &mut PathBuf) {
        if let Some(s) = path.to_str() {
            if s.starts_with('~') {
                *path = PathBuf::from(Self::expand_path(s));
            }
        }
    }

    fn expand_config_paths(config: &mut Config) {
        Self::expand_path_buf(&mut config.relational.data_dir);
        Self::expand_path_buf(&mut config.vector.data_dir);
        Self::expand_path_buf(&mut config.blob.base_path);
        Self::expand_path_buf(&mut config.lifecycle.descriptors_dir);
        Self::expand_path_buf(&mut config.lifecycle.templates_dir);
        Self::expand_path_buf(&mut config.lifecycle.backup_dir);
        if let Some(dir) = config.logging.log_dir.as_mut() {
            Self::expand_path_buf(dir);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.relational.namespace_prefix, "knowledge_rag_");
        assert_eq!(config.retrieval.default_top_k, 10);
    }

    #[test]
    fn test_load_sections() {
        let content = r#"
            [relational]
            data_dir = "/data/rel"
            namespace_prefix = "rb_"

            [vector]
            enabled = false
            metric = "l2"
            dimension = 64

            [retrieval]
            allow_custom_sql = true
            semantic_weight = 0.7
            keyword_weight = 0.3

            [retrieval.table_mapping]
            docs = "documents"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.relational.data_dir, PathBuf::from("/data/rel"));
        assert_eq!(config.relational.namespace_prefix, "rb_");
        assert!(!config.vector.enabled);
        assert_eq!(config.vector.metric, "l2");
        assert_eq!(config.vector.dimension, 64);
        assert!(config.retrieval.allow_custom_sql);
        assert_eq!(config.retrieval.table_mapping.len(), 1);
        assert_eq!(config.retrieval.table_mapping["docs"], "documents");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[lifecycle]").unwrap();
        writeln!(file, "retry_attempts = 5").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.lifecycle.retry_attempts, 5);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/ragbench.toml"));
        match result {
            Err(ConfigError::NotFound { path }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/path/ragbench.toml"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::Parse { origin, .. }) if origin == INLINE_ORIGIN));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: unique test-only variable
        unsafe {
            std::env::set_var("RAGBENCH_TEST_API_KEY", "sk-test");
        }
        let content = "[embedding]\napi_key = \"${RAGBENCH_TEST_API_KEY}\"";
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.embedding.api_key.as_deref(), Some("sk-test"));
        unsafe {
            std::env::remove_var("RAGBENCH_TEST_API_KEY");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "[embedding]\nmodel = \"x\"\napi_key = \"${RAGBENCH_UNSET_VAR_98765}\"";
        let result = ConfigLoader::expand_env_vars(content, INLINE_ORIGIN);
        match result {
            Err(ConfigError::EnvVarNotSet { origin, line, var }) => {
                assert_eq!(origin, INLINE_ORIGIN);
                assert_eq!(line, 3);
                assert_eq!(var, "RAGBENCH_UNSET_VAR_98765");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_file_errors_name_the_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[retrieval]").unwrap();
        writeln!(file, "default_top_k = [").unwrap();

        let err = ConfigLoader::load(file.path()).unwrap_err();
        let shown = file.path().display().to_string();
        assert!(matches!(&err, ConfigError::Parse { origin, .. } if *origin == shown));
        assert!(err.to_string().starts_with(&shown));
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        let content = "value = \"no variables here\"";
        assert_eq!(
            ConfigLoader::expand_env_vars(content, INLINE_ORIGIN).unwrap(),
            content
        );
    }

    #[test]
    fn test_tilde_paths_expanded() {
        let content = r#"
            [blob]
            base_path = "~/ragbench-blobs"
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        let path = config.blob.base_path.to_string_lossy().to_string();
        assert!(!path.starts_with('~'));
        assert!(path.ends_with("ragbench-blobs"));
    }

    #[test]
    fn test_expand_path_no_tilde() {
        assert_eq!(ConfigLoader::expand_path("/usr/local"), "/usr/local");
    }
}
