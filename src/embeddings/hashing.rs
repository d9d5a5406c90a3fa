use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{EmbeddingError, EmbeddingProvider};


/// Offline embedder: feature-hashes lowercased words and character trigrams
/// into a fixed number of buckets, then L2-normalises. Deterministic across
/// runs and machines.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, feature: &str) -> (usize, f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&digest[..8]);
        let value = u64::from_le_bytes(raw);
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        ((value % self.dimensions as u64) as usize, sign)
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let lowered = text.to_lowercase();

        for word in lowered.split_whitespace() {
            let (idx, sign) = self.bucket(word);
            vector[idx] += sign;

            let padded: Vec<char> = format!(" {word} ").chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                let (idx, sign) = self.bucket(&gram);
                vector[idx] += 0.5 * sign;
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyText);
        }
        Ok(self.embed_sync(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        futures::future::try_join_all(texts.iter().map(|t| self.embed(t))).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::cosine_similarity;

    #[tokio::test]
    async fn test_embedding_is_normalised_and_sized() {
        let embedder = HashEmbedder::new(64);
        let v = embedder.embed("parse json from a string").await.unwrap();
        assert_eq!(v.len(), 64);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn test_embedding_is_deterministic() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("Deserialize a JSON document").await.unwrap();
        let b = embedder.embed("Deserialize a JSON document").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_shared_words_score_higher() {
        let embedder = HashEmbedder::default();
        let query = embedder.embed("json parsing").await.unwrap();
        let related = embedder.embed("JSON parsing and serialization").await.unwrap();
        let unrelated = embedder.embed("thread safe queue").await.unwrap();
        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let embedder = HashEmbedder::default();
        assert!(matches!(embedder.embed("   ").await, Err(EmbeddingError::EmptyText)));
    }
}
