pub mod cache;
pub mod hashing;
pub mod ollama;

pub use cache::{CacheStats, EmbeddingCache};
pub use hashing::HashEmbedder;
pub use ollama::OllamaEmbedder;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::core::config::PolystoreConfig;
use crate::core::error::{PolystoreError, Result};


#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty text")]
    EmptyText,
}


/// Text-to-vector collaborator behind the vector store.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {

    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError>;


    async fn embed_batch(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError>;


    fn dimensions(&self) -> usize;


    fn provider_name(&self) -> &str;
}


pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|y| y * y).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    f64::from(dot / (mag_a * mag_b))
}


pub struct EmbeddingProviderFactory;

impl EmbeddingProviderFactory {
    pub fn from_config(config: &PolystoreConfig) -> Result<Arc<dyn EmbeddingProvider>> {
        match config.embedding_provider.to_lowercase().as_str() {
            "hash" => Ok(Arc::new(HashEmbedder::new(config.embedding_dimensions))),
            "ollama" => Ok(Arc::new(OllamaEmbedder::new(
                config.embedding_url.clone(),
                config.embedding_model.clone(),
                config.embedding_timeout_secs,
                config.embedding_cache_size,
                crate::DEFAULT_CACHE_TTL,
            )?)),
            other => Err(PolystoreError::config(format!(
                "unknown embedding provider: {other}. Supported: hash, ollama"
            ))),
        }
    }
}
