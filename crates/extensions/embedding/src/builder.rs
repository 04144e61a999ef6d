//! Provider selection from configuration.

use std::sync::Arc;

use tracing::info;

use ragbench_config::EmbeddingConfig;
use ragbench_protocols::{EmbeddingError, EmbeddingProvider};

use crate::{OpenAIEmbedding, OpenAIEmbeddingConfig, SimpleHashEmbedding};

/// Build the embedding provider named by `config.provider`.
pub fn build_provider(
    config: &EmbeddingConfig,
) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
    match config.provider.as_str() {
        "hash" => {
            info!("Using hash embedding (dimension {})", config.dimension);
            Ok(Arc::new(SimpleHashEmbedding::new(config.dimension)))
        }
        "openai" => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                EmbeddingError::InvalidInput("openai provider requires api_key".to_string())
            })?;
            let mut openai = OpenAIEmbeddingConfig::new(api_key)
                .with_model(config.model.clone())
                .with_dimension(config.dimension)
                .with_timeout_ms(config.timeout_ms);
            if let Some(url) = &config.base_url {
                openai = openai.with_base_url(url.clone());
            }
            info!("Using OpenAI embedding model {}", openai.model);
            Ok(Arc::new(OpenAIEmbedding::new(openai)?))
        }
        other => Err(EmbeddingError::InvalidInput(format!(
            "unknown embedding provider: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_hash() {
        let config = EmbeddingConfig {
            dimension: 32,
            ..Default::default()
        };
        let provider = build_provider(&config).unwrap();
        assert_eq!(provider.dimension(), 32);
    }

    #[test]
    fn test_openai_requires_key() {
        let config = EmbeddingConfig {
            provider: "openai".to_string(),
            api_key: None,
            ..Default::default()
        };
        assert!(matches!(
            build_provider(&config),
            Err(EmbeddingError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unknown_provider() {
        let config = EmbeddingConfig {
            provider: "bogus".to_string(),
            ..Default::default()
        };
        assert!(build_provider(&config).is_err());
    }
}
