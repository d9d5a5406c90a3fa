//! Retrieval benchmark: precision/recall@k and latency per store, broken
//! down by query category.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::error::{PolystoreError, Result};
use crate::stores::MemoryStore;

pub const CATEGORIES: [&str; 3] = ["semantic", "keyword", "structural"];


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkQuery {
    pub id: String,
    pub query: String,
    #[serde(default)]
    pub relevant_ids: Vec<String>,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "semantic".to_string()
}

#[derive(Deserialize)]
struct BenchmarkFile {
    #[serde(default)]
    queries: Vec<BenchmarkQuery>,
}

pub fn load_queries(path: &Path) -> Result<Vec<BenchmarkQuery>> {
    let raw = fs::read_to_string(path)?;
    let file: BenchmarkFile = serde_json::from_str(&raw).map_err(|e| {
        PolystoreError::validation(format!("malformed benchmark file {}: {}", path.display(), e))
    })?;
    Ok(file.queries)
}


#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub query_id: String,
    pub store_name: String,
    pub category: String,
    pub retrieval_time_ms: f64,
    pub retrieved_ids: Vec<String>,
    pub relevant_ids: Vec<String>,
    pub hits: usize,
    pub precision_at_k: f64,
    pub recall_at_k: f64,
}

/// Precision is taken over `k` slots even when fewer results came back.
pub fn precision_recall(retrieved: &[String], relevant: &[String], k: usize) -> (f64, f64, usize) {
    let retrieved: HashSet<&str> = retrieved.iter().take(k).map(String::as_str).collect();
    let relevant: HashSet<&str> = relevant.iter().map(String::as_str).collect();
    let hits = retrieved.intersection(&relevant).count();

    let precision = if k > 0 { hits as f64 / k as f64 } else { 0.0 };
    let recall = if relevant.is_empty() {
        0.0
    } else {
        hits as f64 / relevant.len() as f64
    };
    (precision, recall, hits)
}

pub async fn run_benchmark(
    store: &dyn MemoryStore,
    queries: &[BenchmarkQuery],
    k: usize,
) -> Result<Vec<QueryResult>> {
    let mut results = Vec::with_capacity(queries.len());

    for query in queries {
        let start = Instant::now();
        let documents = store.query(&query.query, k).await?;
        let elapsed = start.elapsed().as_secs_f64() * 1000.0;

        let retrieved_ids: Vec<String> = documents.iter().map(|d| d.id().to_string()).collect();
        let (precision, recall, hits) = precision_recall(&retrieved_ids, &query.relevant_ids, k);
        debug!(
            "[{}] {} -> {} hits in {:.2}ms",
            store.name(),
            query.id,
            hits,
            elapsed
        );

        results.push(QueryResult {
            query_id: query.id.clone(),
            store_name: store.name().to_string(),
            category: query.category.clone(),
            retrieval_time_ms: elapsed,
            retrieved_ids,
            relevant_ids: query.relevant_ids.clone(),
            hits,
            precision_at_k: precision,
            recall_at_k: recall,
        });
    }

    info!("Benchmarked {} queries against {}", results.len(), store.name());
    Ok(results)
}


#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryMetrics {
    pub queries: usize,
    pub precision: f64,
    pub recall: f64,
    pub avg_time_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreMetrics {
    pub store_name: String,
    pub avg_retrieval_time_ms: f64,
    pub median_retrieval_time_ms: f64,
    pub avg_precision_at_k: f64,
    pub avg_recall_at_k: f64,
    pub categories: BTreeMap<String, CategoryMetrics>,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

impl StoreMetrics {
    pub fn from_results(store_name: impl Into<String>, results: &[QueryResult]) -> Self {
        let mut times: Vec<f64> = results.iter().map(|r| r.retrieval_time_ms).collect();
        times.sort_by(f64::total_cmp);
        let median = times.get(times.len() / 2).copied().unwrap_or(0.0);

        let mut categories = BTreeMap::new();
        for category in CATEGORIES {
            let subset: Vec<&QueryResult> =
                results.iter().filter(|r| r.category == category).collect();
            categories.insert(
                category.to_string(),
                CategoryMetrics {
                    queries: subset.len(),
                    precision: mean(subset.iter().map(|r| r.precision_at_k)),
                    recall: mean(subset.iter().map(|r| r.recall_at_k)),
                    avg_time_ms: mean(subset.iter().map(|r| r.retrieval_time_ms)),
                },
            );
        }

        Self {
            store_name: store_name.into(),
            avg_retrieval_time_ms: mean(results.iter().map(|r| r.retrieval_time_ms)),
            median_retrieval_time_ms: median,
            avg_precision_at_k: mean(results.iter().map(|r| r.precision_at_k)),
            avg_recall_at_k: mean(results.iter().map(|r| r.recall_at_k)),
            categories,
        }
    }
}


#[derive(Debug, Clone, Serialize)]
pub struct CategoryWinner {
    pub best_store: String,
    pub wins: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub generated_at: DateTime<Utc>,
    pub k: usize,
    pub query_count: usize,
    pub fastest_store: Option<String>,
    pub most_accurate_store: Option<String>,
    pub stores: Vec<StoreMetrics>,
    pub category_analysis: BTreeMap<String, CategoryWinner>,
}

impl BenchmarkReport {
    /// `results` holds one entry per store, each listing the same queries in the same order.
    pub fn build(k: usize, results: &[(String, Vec<QueryResult>)]) -> Self {
        let stores: Vec<StoreMetrics> = results
            .iter()
            .map(|(name, r)| StoreMetrics::from_results(name.clone(), r))
            .collect();

        let fastest_store = stores
            .iter()
            .min_by(|a, b| a.avg_retrieval_time_ms.total_cmp(&b.avg_retrieval_time_ms))
            .map(|m| m.store_name.clone());
        let most_accurate_store = stores
            .iter()
            .reduce(|best, m| if m.avg_precision_at_k > best.avg_precision_at_k { m } else { best })
            .map(|m| m.store_name.clone());

        let query_count = results.first().map(|(_, r)| r.len()).unwrap_or(0);
        let mut wins: HashMap<&str, BTreeMap<String, usize>> = CATEGORIES
            .iter()
            .map(|c| (*c, results.iter().map(|(name, _)| (name.clone(), 0)).collect()))
            .collect();

        for i in 0..query_count {
            let Some(best) = results
                .iter()
                .filter_map(|(name, r)| r.get(i).map(|q| (name, q)))
                .reduce(|best, cur| if cur.1.precision_at_k > best.1.precision_at_k { cur } else { best })
            else {
                continue;
            };
            if let Some(counts) = wins.get_mut(best.1.category.as_str()) {
                *counts.entry(best.0.clone()).or_insert(0) += 1;
            }
        }

        let category_analysis = CATEGORIES
            .iter()
            .filter_map(|c| wins.remove(c).map(|counts| (*c, counts)))
            .map(|(category, counts)| {
                let best_store = counts
                    .iter()
                    .fold(None::<(&String, usize)>, |best, (name, &n)| match best {
                        Some((_, top)) if top >= n => best,
                        _ => Some((name, n)),
                    })
                    .map(|(name, _)| name.clone())
                    .unwrap_or_default();
                (category.to_string(), CategoryWinner { best_store, wins: counts })
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            k,
            query_count,
            fastest_store,
            most_accurate_store,
            stores,
            category_analysis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::Document;
    use crate::stores::Bm25Store;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn result(store: &str, category: &str, precision: f64, time: f64) -> QueryResult {
        QueryResult {
            query_id: "q".to_string(),
            store_name: store.to_string(),
            category: category.to_string(),
            retrieval_time_ms: time,
            retrieved_ids: Vec::new(),
            relevant_ids: Vec::new(),
            hits: 0,
            precision_at_k: precision,
            recall_at_k: precision,
        }
    }

    #[test]
    fn test_precision_recall() {
        let (p, r, hits) = precision_recall(&ids(&["a", "b", "c"]), &ids(&["a", "c", "z", "y"]), 5);
        assert_eq!(hits, 2);
        assert!((p - 0.4).abs() < 1e-12);
        assert!((r - 0.5).abs() < 1e-12);

        let (p, r, hits) = precision_recall(&ids(&["a"]), &[], 5);
        assert_eq!((p, r, hits), (0.0, 0.0, 0));
    }

    #[test]
    fn test_only_first_k_count() {
        let (_, _, hits) = precision_recall(&ids(&["x", "a"]), &ids(&["a"]), 1);
        assert_eq!(hits, 0);
    }

    #[test]
    fn test_store_metrics_by_category() {
        let results = vec![
            result("bm25", "keyword", 0.4, 1.0),
            result("bm25", "keyword", 0.2, 3.0),
            result("bm25", "structural", 0.0, 2.0),
        ];
        let metrics = StoreMetrics::from_results("bm25", &results);

        assert!((metrics.avg_retrieval_time_ms - 2.0).abs() < 1e-12);
        assert_eq!(metrics.median_retrieval_time_ms, 2.0);
        assert!((metrics.categories["keyword"].precision - 0.3).abs() < 1e-12);
        assert_eq!(metrics.categories["semantic"].queries, 0);
        assert_eq!(metrics.categories["semantic"].precision, 0.0);
    }

    #[test]
    fn test_report_winners() {
        let results = vec![
            (
                "graph".to_string(),
                vec![result("graph", "structural", 0.6, 0.5), result("graph", "keyword", 0.0, 0.5)],
            ),
            (
                "bm25".to_string(),
                vec![result("bm25", "structural", 0.2, 1.0), result("bm25", "keyword", 0.4, 1.0)],
            ),
        ];
        let report = BenchmarkReport::build(5, &results);

        assert_eq!(report.query_count, 2);
        assert_eq!(report.fastest_store.as_deref(), Some("graph"));
        assert_eq!(report.category_analysis["structural"].best_store, "graph");
        assert_eq!(report.category_analysis["keyword"].best_store, "bm25");
        assert_eq!(report.category_analysis["keyword"].wins["bm25"], 1);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["generated_at"].is_string());
    }

    #[tokio::test]
    async fn test_run_benchmark_against_bm25() {
        let mut store = Bm25Store::default();
        store
            .index(&[
                Document::new("re.compile", "compile a regular expression pattern"),
                Document::new("json.loads", "deserialize a json string"),
                Document::new("os.getcwd", "return the current working directory"),
            ])
            .await
            .unwrap();

        let queries = vec![BenchmarkQuery {
            id: "k1".to_string(),
            query: "regular expression".to_string(),
            relevant_ids: ids(&["re.compile"]),
            category: "keyword".to_string(),
        }];
        let results = run_benchmark(&store, &queries, 1).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].retrieved_ids, ids(&["re.compile"]));
        assert_eq!(results[0].hits, 1);
        assert_eq!(results[0].store_name, "bm25");
        assert!((results[0].precision_at_k - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_load_queries() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"queries": [{{"id": "s1", "query": "parse json", "relevant_ids": ["json.loads"]}}]}}"#
        )
        .unwrap();

        let queries = load_queries(file.path()).unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].category, "semantic");
    }
}
