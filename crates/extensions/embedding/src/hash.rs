//! Hash-based embedding for offline use and tests.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use ragbench_protocols::{Embedding, EmbeddingError, EmbeddingProvider};

/// Deterministic bag-of-words hash embedding (not semantic).
///
/// Identical texts map to identical unit vectors, and texts sharing words
/// land closer together than unrelated ones.
pub struct SimpleHashEmbedding {
    dimension: usize,
}

impl SimpleHashEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn hash_text(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimension];

        for word in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let hash = hasher.finish();

            for (j, slot) in vector.iter_mut().enumerate() {
                let shift = (j * 7) % 57;
                let val = ((hash.rotate_left(j as u32) >> shift) & 0xFF) as f32 / 255.0 - 0.5;
                *slot += val;
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Embedding::new(vector)
    }
}

impl Default for SimpleHashEmbedding {
    fn default() -> Self {
        Self::new(128)
    }
}

#[async_trait]
impl EmbeddingProvider for SimpleHashEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        Ok(self.hash_text(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.hash_text(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dimension() {
        let provider = SimpleHashEmbedding::new(64);
        let emb = provider.embed("hello world").await.unwrap();
        assert_eq!(emb.dimension, 64);
        assert_eq!(provider.dimension(), 64);
        assert_eq!(SimpleHashEmbedding::default().dimension(), 128);
    }

    #[tokio::test]
    async fn test_identical_texts() {
        let provider = SimpleHashEmbedding::new(128);
        let a = provider.embed("Machine Learning basics").await.unwrap();
        let b = provider.embed("machine learning   basics").await.unwrap();
        assert!((a.cosine_similarity(&b) - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_unit_norm() {
        let provider = SimpleHashEmbedding::new(32);
        let emb = provider.embed("some text here").await.unwrap();
        let norm: f32 = emb.vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = SimpleHashEmbedding::new(16);
        let emb = provider.embed("").await.unwrap();
        assert!(emb.vector.iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn test_batch() {
        let provider = SimpleHashEmbedding::new(64);
        let embeddings = provider.embed_batch(&["hello", "world", "test"]).await.unwrap();
        assert_eq!(embeddings.len(), 3);
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    }
}
