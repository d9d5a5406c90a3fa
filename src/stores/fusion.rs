//! Weighted Reciprocal Rank Fusion: score = Σ w_i / (k + rank_i)
//!
//! Ranks, not raw scores, are combined, so cosine similarities, BM25 weights
//! and keyword counts never need to be put on a common scale.

use std::collections::HashMap;

use crate::core::document::Document;


#[derive(Debug, Clone)]
pub struct FusedDocument {
    pub document: Document,
    /// Cumulative weighted RRF score (higher = more relevant).
    pub score: f64,
}

/// Fuse ranked lists, each paired with its weight. Ranks are 1-based.
///
/// A document is identified by its id; the first copy met supplies the
/// returned document. Equal scores keep first-encounter order.
pub fn weighted_rrf(ranked_lists: &[(&[Document], f64)], k: u32) -> Vec<FusedDocument> {
    let mut fused: Vec<FusedDocument> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for (documents, weight) in ranked_lists {
        for (rank0, doc) in documents.iter().enumerate() {
            let contribution = weight / (f64::from(k) + (rank0 + 1) as f64);
            match positions.get(doc.id()) {
                Some(&pos) => fused[pos].score += contribution,
                None => {
                    positions.insert(doc.id(), fused.len());
                    fused.push(FusedDocument {
                        document: doc.clone(),
                        score: contribution,
                    });
                }
            }
        }
    }

    fused.sort_by(|a, b| b.score.total_cmp(&a.score));
    fused
}
