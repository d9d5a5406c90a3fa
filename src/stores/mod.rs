//! Retrieval stores. Every store implements [`MemoryStore`]; the hybrid store
//! composes three of them and fuses their rankings.

pub mod bm25;
pub mod fusion;
pub mod graph;
pub mod hybrid;
pub mod vector;

pub use bm25::{Bm25Params, Bm25Store};
pub use fusion::{FusedDocument, weighted_rrf};
pub use graph::GraphStore;
pub use hybrid::{HybridStore, HybridWeights, StoreSizes};
pub use vector::VectorStore;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::core::document::Document;
use crate::core::error::Result;


#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Replace everything held by the store with `documents`.
    async fn index(&mut self, documents: &[Document]) -> Result<()>;

    /// Up to `n_results` documents, most relevant first. An empty store yields an empty list.
    async fn query(&self, query_text: &str, n_results: usize) -> Result<Vec<Document>>;


    async fn clear(&mut self) -> Result<()>;


    fn size(&self) -> usize;


    fn name(&self) -> &str;
}


/// Lowercase, whitespace split. No stemming, no stopwords.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// One document per id. A repeated id takes the later document's content but
/// keeps the slot where the id first appeared.
pub(crate) fn latest_by_id(documents: &[Document]) -> Vec<&Document> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut unique: Vec<&Document> = Vec::with_capacity(documents.len());

    for doc in documents {
        match positions.get(doc.id()) {
            Some(&pos) => unique[pos] = doc,
            None => {
                positions.insert(doc.id(), unique.len());
                unique.push(doc);
            }
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_splits() {
        assert_eq!(
            tokenize("  Parse JSON\tfrom a\nString "),
            vec!["parse", "json", "from", "a", "string"]
        );
    }

    #[test]
    fn test_tokenize_keeps_punctuation() {
        assert_eq!(tokenize("json.loads(s)"), vec!["json.loads(s)"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_latest_by_id_keeps_first_slot_and_last_content() {
        let docs = vec![
            Document::new("a", "old"),
            Document::new("b", "beta"),
            Document::new("a", "new"),
        ];
        let unique = latest_by_id(&docs);
        let pairs: Vec<_> = unique.iter().map(|d| (d.id(), d.content())).collect();
        assert_eq!(pairs, vec![("a", "new"), ("b", "beta")]);
    }
}
