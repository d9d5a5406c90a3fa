use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{MemoryStore, latest_by_id};
use crate::core::document::Document;
use crate::core::error::Result;
use crate::embeddings::{EmbeddingProvider, cosine_similarity};


/// Brute-force cosine search over an in-memory collection.
pub struct VectorStore {
    embedder: Arc<dyn EmbeddingProvider>,
    entries: Vec<(Document, Vec<f32>)>,
}

impl VectorStore {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
        }
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    fn embedding_text(doc: &Document) -> String {
        if doc.content().trim().is_empty() {
            doc.id().to_string()
        } else {
            doc.content().to_string()
        }
    }
}

#[async_trait]
impl MemoryStore for VectorStore {
    async fn index(&mut self, documents: &[Document]) -> Result<()> {
        let documents = latest_by_id(documents);
        let missing: Vec<usize> = documents
            .iter()
            .enumerate()
            .filter(|(_, doc)| doc.embedding().is_none())
            .map(|(i, _)| i)
            .collect();

        let texts: Vec<String> = missing
            .iter()
            .map(|&i| Self::embedding_text(documents[i]))
            .collect();
        let mut computed = self.embedder.embed_batch(&texts).await?.into_iter();

        let mut entries = Vec::with_capacity(documents.len());
        for doc in &documents {
            let vector = match doc.embedding() {
                Some(existing) => existing.to_vec(),
                None => computed.next().unwrap_or_default(),
            };
            entries.push((doc.stripped(), vector));
        }
        self.entries = entries;

        info!(
            "Vector store indexed: {} documents ({} embedded via {})",
            self.entries.len(),
            missing.len(),
            self.embedder.provider_name()
        );
        Ok(())
    }

    async fn query(&self, query_text: &str, n_results: usize) -> Result<Vec<Document>> {
        if self.entries.is_empty() || n_results == 0 || query_text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query_text).await?;

        let mut scored: Vec<(usize, f64)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (_, vector))| (i, cosine_similarity(&query_vector, vector)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(n_results);

        debug!(
            "Vector query {:?}: best similarity {:.4}",
            crate::safe_truncate(query_text, 60),
            scored.first().map(|(_, s)| *s).unwrap_or(0.0)
        );

        Ok(scored
            .into_iter()
            .map(|(i, _)| self.entries[i].0.clone())
            .collect())
    }

    async fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }

    fn size(&self) -> usize {
        self.entries.len()
    }

    fn name(&self) -> &str {
        "vector"
    }
}
