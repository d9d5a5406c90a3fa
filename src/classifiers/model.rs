//! Statistical structural-intent model: TF-IDF features over word unigrams and
//! bigrams feeding a multinomial logistic regression, trained once on the
//! baked-in examples.
//!
//! Training is deterministic (zero initialisation, full-batch gradient
//! descent, fixed iteration count), so the same query always maps to the
//! same label for the lifetime of a fitted model.

use std::collections::HashMap;

use lazy_static::lazy_static;
use ndarray::{Array1, Array2, Axis};
use regex::Regex;
use tracing::debug;

use super::examples::{IntentLabel, QueryIntent, STRUCTURAL_INTENT_EXAMPLES};

const MAX_FEATURES: usize = 500;
const MAX_ITER: usize = 500;
const LEARNING_RATE: f64 = 2.0;
const L2_PENALTY: f64 = 0.005;

lazy_static! {
    static ref TOKEN_PATTERN: Regex = Regex::new(r"\b\w\w+\b").expect("static token pattern");
}


fn analyze(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = TOKEN_PATTERN.find_iter(&lowered).map(|m| m.as_str()).collect();

    let mut terms: Vec<String> = tokens.iter().map(|t| (*t).to_string()).collect();
    terms.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    terms
}


#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Array1<f64>,
}

impl TfidfVectorizer {
    pub fn fit(corpus: &[&str], max_features: usize) -> Self {
        let analyzed: Vec<Vec<String>> = corpus.iter().map(|doc| analyze(doc)).collect();

        let mut term_counts: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for terms in &analyzed {
            for term in terms {
                *term_counts.entry(term.as_str()).or_default() += 1;
            }
            let mut unique: Vec<&str> = terms.iter().map(String::as_str).collect();
            unique.sort_unstable();
            unique.dedup();
            for term in unique {
                *doc_freq.entry(term).or_default() += 1;
            }
        }

        // Most frequent terms first, alphabetical among equals, then index alphabetically.
        let mut selected: Vec<&str> = term_counts.keys().copied().collect();
        selected.sort_by(|a, b| term_counts[b].cmp(&term_counts[a]).then_with(|| a.cmp(b)));
        selected.truncate(max_features);
        selected.sort_unstable();

        let n_docs = corpus.len() as f64;
        let idf = Array1::from_iter(
            selected
                .iter()
                .map(|term| ((1.0 + n_docs) / (1.0 + doc_freq[term] as f64)).ln() + 1.0),
        );
        let vocabulary = selected
            .into_iter()
            .enumerate()
            .map(|(i, term)| (term.to_string(), i))
            .collect();

        Self { vocabulary, idf }
    }

    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn transform(&self, text: &str) -> Array1<f64> {
        let mut row = Array1::zeros(self.n_features());
        for term in analyze(text) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                row[idx] += 1.0;
            }
        }
        row *= &self.idf;

        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row /= norm;
        }
        row
    }

    pub fn transform_batch(&self, texts: &[&str]) -> Array2<f64> {
        let mut matrix = Array2::zeros((texts.len(), self.n_features()));
        for (i, text) in texts.iter().enumerate() {
            matrix.row_mut(i).assign(&self.transform(text));
        }
        matrix
    }
}


#[derive(Debug, Clone)]
pub struct SoftmaxRegression {
    weights: Array2<f64>,
    bias: Array1<f64>,
}

impl SoftmaxRegression {
    pub fn fit(features: &Array2<f64>, labels: &[usize], n_classes: usize) -> Self {
        let (n_samples, n_features) = features.dim();
        let mut weights = Array2::<f64>::zeros((n_features, n_classes));
        let mut bias = Array1::<f64>::zeros(n_classes);
        let scale = 1.0 / n_samples.max(1) as f64;

        for _ in 0..MAX_ITER {
            let mut probs = features.dot(&weights) + &bias;
            softmax_rows(&mut probs);
            for (i, &label) in labels.iter().enumerate() {
                probs[[i, label]] -= 1.0;
            }

            let mut grad_w = features.t().dot(&probs) * scale;
            grad_w.scaled_add(L2_PENALTY, &weights);
            let grad_b = probs.sum_axis(Axis(0)) * scale;

            weights.scaled_add(-LEARNING_RATE, &grad_w);
            bias.scaled_add(-LEARNING_RATE, &grad_b);
        }

        Self { weights, bias }
    }

    /// Index of the highest-scoring class; the lowest index wins ties.
    pub fn predict(&self, row: &Array1<f64>) -> usize {
        let scores = row.dot(&self.weights) + &self.bias;
        let mut best = 0;
        for (class, &score) in scores.iter().enumerate() {
            if score > scores[best] {
                best = class;
            }
        }
        best
    }
}

fn softmax_rows(matrix: &mut Array2<f64>) {
    for mut row in matrix.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |acc, &v| acc.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row /= sum;
    }
}


#[derive(Debug, Clone)]
pub struct TrainedIntentModel {
    vectorizer: TfidfVectorizer,
    model: SoftmaxRegression,
}

impl TrainedIntentModel {
    pub fn fit() -> Option<Self> {
        Self::fit_on(STRUCTURAL_INTENT_EXAMPLES)
    }

    pub fn fit_on(examples: &[(&str, IntentLabel)]) -> Option<Self> {
        if examples.is_empty() {
            return None;
        }

        let queries: Vec<&str> = examples.iter().map(|(q, _)| *q).collect();
        let labels: Vec<usize> = examples.iter().map(|(_, l)| l.index()).collect();

        let vectorizer = TfidfVectorizer::fit(&queries, MAX_FEATURES);
        if vectorizer.n_features() == 0 {
            return None;
        }
        let features = vectorizer.transform_batch(&queries);
        let model = SoftmaxRegression::fit(&features, &labels, IntentLabel::ALL.len());

        debug!(
            "Intent model fitted: {} examples, {} features",
            examples.len(),
            vectorizer.n_features()
        );
        Some(Self { vectorizer, model })
    }

    pub fn predict_label(&self, query: &str) -> IntentLabel {
        let row = self.vectorizer.transform(query);
        IntentLabel::ALL[self.model.predict(&row)]
    }

    pub fn predict(&self, query: &str) -> QueryIntent {
        self.predict_label(query).intent()
    }
}
