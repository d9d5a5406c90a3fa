pub mod adapters;
pub mod classifiers;
pub mod core;
pub mod embeddings;
pub mod eval;
pub mod stores;
pub mod utils;

pub use utils::{preview, safe_truncate};


pub use adapters::{DataAdapter, PythonDocsAdapter};
pub use classifiers::{QueryIntent, StructuralIntentClassifier, classify_with_rules};
pub use core::config::PolystoreConfig;
pub use core::document::Document;
pub use core::error::{PolystoreError, Result};
pub use core::relationship::{Metadata, Relationship};
pub use embeddings::{EmbeddingProvider, EmbeddingProviderFactory, HashEmbedder, OllamaEmbedder};
pub use stores::{
    Bm25Store, FusedDocument, GraphStore, HybridStore, HybridWeights, MemoryStore, VectorStore,
    weighted_rrf,
};


pub const DEFAULT_N_RESULTS: usize = 5;


pub const DEFAULT_RRF_K: u32 = 60;


pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";


pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";


pub const DEFAULT_CACHE_SIZE: usize = 1000;


pub const DEFAULT_CACHE_TTL: u64 = 300;
