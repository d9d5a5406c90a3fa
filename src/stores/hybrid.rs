//! Hybrid store: vector, graph and BM25 queried together and fused with weighted RRF.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::fusion::weighted_rrf;
use super::{Bm25Params, Bm25Store, GraphStore, MemoryStore, VectorStore};
use crate::classifiers::StructuralIntentClassifier;
use crate::core::config::PolystoreConfig;
use crate::core::document::Document;
use crate::core::error::{PolystoreError, Result};
use crate::embeddings::EmbeddingProviderFactory;

const WEIGHT_TOLERANCE: f64 = 0.001;


/// Per-store fusion weights. Non-negative and summing to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridWeights {
    vector: f64,
    graph: f64,
    bm25: f64,
}

impl HybridWeights {
    pub fn new(vector: f64, graph: f64, bm25: f64) -> Result<Self> {
        if [vector, graph, bm25].iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(PolystoreError::config(format!(
                "weights must be non-negative, got vector={vector}, graph={graph}, bm25={bm25}"
            )));
        }

        let total = vector + graph + bm25;
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(PolystoreError::config(format!(
                "weights must sum to 1.0, got {total:.3}"
            )));
        }

        Ok(Self { vector, graph, bm25 })
    }

    pub fn vector(&self) -> f64 {
        self.vector
    }

    pub fn graph(&self) -> f64 {
        self.graph
    }

    pub fn bm25(&self) -> f64 {
        self.bm25
    }
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            vector: 0.4,
            graph: 0.3,
            bm25: 0.3,
        }
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSizes {
    pub vector: usize,
    pub graph: usize,
    pub bm25: usize,
}

impl StoreSizes {
    pub fn in_sync(&self) -> bool {
        self.vector == self.graph && self.graph == self.bm25
    }
}


/// Queries vector, graph and BM25 stores side by side and fuses their
/// rankings with weighted reciprocal rank fusion.
pub struct HybridStore {
    vector: Box<dyn MemoryStore>,
    graph: Box<dyn MemoryStore>,
    bm25: Box<dyn MemoryStore>,
    weights: HybridWeights,
    rrf_k: u32,
}

impl HybridStore {
    pub fn new(
        vector: Box<dyn MemoryStore>,
        graph: Box<dyn MemoryStore>,
        bm25: Box<dyn MemoryStore>,
        weights: HybridWeights,
    ) -> Self {
        Self {
            vector,
            graph,
            bm25,
            weights,
            rrf_k: crate::DEFAULT_RRF_K,
        }
    }

    #[must_use]
    pub fn with_rrf_k(mut self, rrf_k: u32) -> Self {
        self.rrf_k = rrf_k.max(1);
        self
    }

    /// Wires the three stores from configuration, sharing `classifier` with the graph store.
    pub fn from_config(
        config: &PolystoreConfig,
        classifier: Arc<StructuralIntentClassifier>,
    ) -> Result<Self> {
        config.validate()?;
        let weights = config.hybrid_weights()?;
        let embedder = EmbeddingProviderFactory::from_config(config)?;

        info!(
            "HybridStore: weights vector={}, graph={}, bm25={}, k={}",
            weights.vector, weights.graph, weights.bm25, config.rrf_k
        );

        Ok(Self::new(
            Box::new(VectorStore::new(embedder)),
            Box::new(GraphStore::with_config(classifier, config)),
            Box::new(Bm25Store::new(Bm25Params::from(config))),
            weights,
        )
        .with_rrf_k(config.rrf_k))
    }

    pub fn weights(&self) -> HybridWeights {
        self.weights
    }

    pub fn sizes(&self) -> StoreSizes {
        StoreSizes {
            vector: self.vector.size(),
            graph: self.graph.size(),
            bm25: self.bm25.size(),
        }
    }
}

#[async_trait]
impl MemoryStore for HybridStore {
    async fn index(&mut self, documents: &[Document]) -> Result<()> {
        self.vector.index(documents).await?;
        self.graph.index(documents).await?;
        self.bm25.index(documents).await?;

        let sizes = self.sizes();
        if !sizes.in_sync() {
            warn!("Sub-store sizes disagree after indexing: {:?}", sizes);
        }
        info!("Hybrid indexed: {:?}", sizes);
        Ok(())
    }

    async fn query(&self, query_text: &str, n_results: usize) -> Result<Vec<Document>> {
        if n_results == 0 {
            return Ok(Vec::new());
        }
        let fetch = n_results * 2;

        let (vector, graph, bm25) = tokio::join!(
            self.vector.query(query_text, fetch),
            self.graph.query(query_text, fetch),
            self.bm25.query(query_text, fetch),
        );
        let (vector, graph, bm25) = (vector?, graph?, bm25?);

        debug!(
            "Hybrid candidates: vector={}, graph={}, bm25={}",
            vector.len(),
            graph.len(),
            bm25.len()
        );

        let fused = weighted_rrf(
            &[
                (&vector[..], self.weights.vector),
                (&graph[..], self.weights.graph),
                (&bm25[..], self.weights.bm25),
            ],
            self.rrf_k,
        );

        Ok(fused
            .into_iter()
            .take(n_results)
            .map(|f| f.document)
            .collect())
    }

    async fn clear(&mut self) -> Result<()> {
        self.vector.clear().await?;
        self.graph.clear().await?;
        self.bm25.clear().await?;
        Ok(())
    }

    fn size(&self) -> usize {
        self.vector.size()
    }

    fn name(&self) -> &str {
        "hybrid"
    }
}
