use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{MemoryStore, latest_by_id, tokenize};
use crate::core::config::PolystoreConfig;
use crate::core::document::Document;
use crate::core::error::Result;


#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
    /// Floor for common terms, as a fraction of the average idf.
    pub epsilon: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            epsilon: 0.25,
        }
    }
}

impl From<&PolystoreConfig> for Bm25Params {
    fn from(config: &PolystoreConfig) -> Self {
        Self {
            k1: config.bm25_k1,
            b: config.bm25_b,
            epsilon: config.bm25_epsilon,
        }
    }
}


/// Okapi BM25 over lowercase whitespace tokens.
pub struct Bm25Store {
    params: Bm25Params,
    documents: Vec<Document>,
    term_freqs: Vec<HashMap<String, usize>>,
    doc_lens: Vec<usize>,
    avgdl: f64,
    idf: HashMap<String, f64>,
}

impl Bm25Store {
    pub fn new(params: Bm25Params) -> Self {
        Self {
            params,
            documents: Vec::new(),
            term_freqs: Vec::new(),
            doc_lens: Vec::new(),
            avgdl: 0.0,
            idf: HashMap::new(),
        }
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    fn compute_idf(&mut self) {
        let n = self.documents.len() as f64;

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for freqs in &self.term_freqs {
            for term in freqs.keys() {
                *doc_freq.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let mut idf: HashMap<String, f64> = doc_freq
            .into_iter()
            .map(|(term, df)| {
                let df = df as f64;
                (term.to_string(), ((n - df + 0.5) / (df + 0.5)).ln())
            })
            .collect();

        if idf.is_empty() {
            self.idf = idf;
            return;
        }

        // Terms in more than half the corpus go negative; lift them to a small positive floor.
        let average = idf.values().sum::<f64>() / idf.len() as f64;
        let floor = self.params.epsilon * average;
        for value in idf.values_mut() {
            if *value < 0.0 {
                *value = floor;
            }
        }
        self.idf = idf;
    }

    /// Score of every indexed document against `query_text`, in corpus order.
    pub fn scores(&self, query_text: &str) -> Vec<f64> {
        let Bm25Params { k1, b, .. } = self.params;
        let query_terms = tokenize(query_text);

        self.term_freqs
            .iter()
            .zip(&self.doc_lens)
            .map(|(freqs, &len)| {
                let norm = if self.avgdl > 0.0 {
                    1.0 - b + b * len as f64 / self.avgdl
                } else {
                    1.0
                };
                query_terms
                    .iter()
                    .map(|term| {
                        let tf = freqs.get(term).copied().unwrap_or(0) as f64;
                        let idf = self.idf.get(term).copied().unwrap_or(0.0);
                        idf * tf * (k1 + 1.0) / (tf + k1 * norm)
                    })
                    .sum()
            })
            .collect()
    }
}

impl Default for Bm25Store {
    fn default() -> Self {
        Self::new(Bm25Params::default())
    }
}

#[async_trait]
impl MemoryStore for Bm25Store {
    async fn index(&mut self, documents: &[Document]) -> Result<()> {
        self.documents = latest_by_id(documents)
            .into_iter()
            .map(Document::stripped)
            .collect();
        self.term_freqs.clear();
        self.doc_lens.clear();

        for doc in &self.documents {
            let tokens = tokenize(doc.content());
            let mut freqs: HashMap<String, usize> = HashMap::new();
            for token in &tokens {
                *freqs.entry(token.clone()).or_insert(0) += 1;
            }
            self.doc_lens.push(tokens.len());
            self.term_freqs.push(freqs);
        }

        let total: usize = self.doc_lens.iter().sum();
        self.avgdl = if self.documents.is_empty() {
            0.0
        } else {
            total as f64 / self.documents.len() as f64
        };
        self.compute_idf();

        info!(
            "BM25 indexed: {} documents, {} terms, avgdl={:.2}",
            self.documents.len(),
            self.idf.len(),
            self.avgdl
        );
        Ok(())
    }

    async fn query(&self, query_text: &str, n_results: usize) -> Result<Vec<Document>> {
        if self.documents.is_empty() || n_results == 0 {
            return Ok(Vec::new());
        }

        let scores = self.scores(query_text);
        let mut ranked: Vec<usize> = (0..scores.len()).collect();
        ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        ranked.truncate(n_results);

        debug!(
            "BM25 query {:?}: top score {:.4}",
            crate::safe_truncate(query_text, 60),
            ranked.first().map(|&i| scores[i]).unwrap_or(0.0)
        );

        Ok(ranked.into_iter().map(|i| self.documents[i].clone()).collect())
    }

    async fn clear(&mut self) -> Result<()> {
        self.documents.clear();
        self.term_freqs.clear();
        self.doc_lens.clear();
        self.idf.clear();
        self.avgdl = 0.0;
        Ok(())
    }

    fn size(&self) -> usize {
        self.documents.len()
    }

    fn name(&self) -> &str {
        "bm25"
    }
}
