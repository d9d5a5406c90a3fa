use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info};

use super::cache::EmbeddingCache;
use super::{EmbeddingError, EmbeddingProvider};


#[derive(Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}


pub struct OllamaEmbedder {
    url: String,
    model: String,
    client: Client,
    cache: EmbeddingCache,
    dimensions: OnceLock<usize>,
}

impl OllamaEmbedder {
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
        cache_size: usize,
        cache_ttl: u64,
    ) -> Result<Self, EmbeddingError> {
        let url = url.into().trim_end_matches('/').to_string();
        let model = model.into();
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        info!(
            "OllamaEmbedder initialized: url={}, model={}, cache={}",
            url, model, cache_size
        );

        Ok(Self {
            url,
            model,
            client,
            cache: EmbeddingCache::new(cache_size, cache_ttl),
            dimensions: OnceLock::new(),
        })
    }

    async fn request(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = OllamaEmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.url))
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .map_err(EmbeddingError::Http)?
            .json::<OllamaEmbeddingResponse>()
            .await?;

        if response.embedding.is_empty() {
            return Err(EmbeddingError::InvalidResponse("empty embedding".to_string()));
        }
        Ok(response.embedding)
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyText);
        }

        let key = EmbeddingCache::make_key(&self.model, text);
        if let Some(cached) = self.cache.get(&key) {
            debug!("Cache HIT for: {}...", crate::safe_truncate(text, 50));
            return Ok(cached);
        }

        let embedding = self.request(text).await?;
        let dims = *self.dimensions.get_or_init(|| embedding.len());
        if embedding.len() != dims {
            return Err(EmbeddingError::InvalidResponse(format!(
                "dimension changed from {} to {}",
                dims,
                embedding.len()
            )));
        }

        self.cache.set(&key, embedding.clone());
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Zero until the first successful request reveals the model's width.
    fn dimensions(&self) -> usize {
        self.dimensions.get().copied().unwrap_or(0)
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }
}
