//! Relationship graph store.
//!
//! Documents become nodes and relationships become typed, directed edges.
//! Queries run a priority cascade, each stage only filling slots the earlier
//! ones left open:
//!
//! 0. structural: when the classifier reads the query as a call/inheritance
//!    question, walk one hop from the seed nodes named in it
//! 1. exact id
//! 2. keyword overlap through the inverted index
//! 3. successors of everything found so far

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use regex::Regex;
use tracing::{debug, info};

use super::{MemoryStore, tokenize};
use crate::classifiers::StructuralIntentClassifier;
use crate::core::config::PolystoreConfig;
use crate::core::document::Document;
use crate::core::error::Result;

const DEFAULT_MAX_SEEDS: usize = 5;

lazy_static! {
    static ref DOTTED_IDENTIFIER: Regex =
        Regex::new(r"[A-Za-z_]\w*(?:\.[A-Za-z_]\w*)+").expect("static identifier pattern");
}


struct ResultSet {
    nodes: Vec<NodeIndex>,
    seen: HashSet<NodeIndex>,
    limit: usize,
}

impl ResultSet {
    fn new(limit: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(limit),
            seen: HashSet::new(),
            limit,
        }
    }

    fn is_full(&self) -> bool {
        self.nodes.len() >= self.limit
    }

    /// Returns true once the set is full.
    fn push(&mut self, idx: NodeIndex) -> bool {
        if !self.is_full() && self.seen.insert(idx) {
            self.nodes.push(idx);
        }
        self.is_full()
    }
}


pub struct GraphStore {
    classifier: Arc<StructuralIntentClassifier>,
    graph: DiGraph<Document, String>,
    node_index: HashMap<String, NodeIndex>,
    inverted_index: HashMap<String, Vec<NodeIndex>>,
    max_seeds: usize,
    id_prefixes: Vec<String>,
}

impl GraphStore {
    pub fn new(classifier: Arc<StructuralIntentClassifier>) -> Self {
        Self {
            classifier,
            graph: DiGraph::new(),
            node_index: HashMap::new(),
            inverted_index: HashMap::new(),
            max_seeds: DEFAULT_MAX_SEEDS,
            id_prefixes: vec!["stdlib.".to_string()],
        }
    }

    pub fn with_config(classifier: Arc<StructuralIntentClassifier>, config: &PolystoreConfig) -> Self {
        Self::new(classifier).with_seed_options(config.max_seeds, config.id_prefixes.clone())
    }

    #[must_use]
    pub fn with_seed_options(mut self, max_seeds: usize, id_prefixes: Vec<String>) -> Self {
        self.max_seeds = max_seeds.max(1);
        self.id_prefixes = id_prefixes;
        self
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.node_index.contains_key(node_id)
    }

    pub fn get_document(&self, node_id: &str) -> Option<&Document> {
        self.node_index.get(node_id).map(|&idx| &self.graph[idx])
    }

    /// Documents one outgoing edge away, optionally only over edges of `edge_type`.
    pub fn get_neighbors(&self, node_id: &str, edge_type: Option<&str>) -> Vec<Document> {
        self.adjacent_documents(node_id, edge_type, Direction::Outgoing)
    }

    /// Documents one incoming edge away, optionally only over edges of `edge_type`.
    pub fn get_predecessors(&self, node_id: &str, edge_type: Option<&str>) -> Vec<Document> {
        self.adjacent_documents(node_id, edge_type, Direction::Incoming)
    }

    fn adjacent_documents(
        &self,
        node_id: &str,
        edge_type: Option<&str>,
        direction: Direction,
    ) -> Vec<Document> {
        let Some(&idx) = self.node_index.get(node_id) else {
            return Vec::new();
        };
        self.adjacent(idx, edge_type, direction)
            .into_iter()
            .map(|n| self.graph[n].clone())
            .collect()
    }

    /// Adjacent nodes in edge insertion order, each listed once.
    fn adjacent(&self, idx: NodeIndex, edge_type: Option<&str>, direction: Direction) -> Vec<NodeIndex> {
        // petgraph walks a node's edge list newest first.
        let edges: Vec<_> = self.graph.edges_directed(idx, direction).collect();

        let mut seen = HashSet::new();
        edges
            .into_iter()
            .rev()
            .filter(|edge| edge_type.is_none_or(|t| edge.weight() == t))
            .map(|edge| match direction {
                Direction::Outgoing => edge.target(),
                Direction::Incoming => edge.source(),
            })
            .filter(|n| seen.insert(*n))
            .collect()
    }

    fn index_document(&mut self, idx: NodeIndex, content: &str) {
        for token in tokenize(content) {
            // Nodes are indexed in ascending order, so a repeat can only be the tail.
            let postings = self.inverted_index.entry(token).or_default();
            if postings.last() != Some(&idx) {
                postings.push(idx);
            }
        }
    }

    /// Nodes scored by how many query tokens they contain, best first.
    /// Ties keep the order in which candidates were first met.
    fn keyword_matches(&self, query_text: &str, limit: usize) -> Vec<NodeIndex> {
        let mut scores: HashMap<NodeIndex, usize> = HashMap::new();
        let mut order: Vec<NodeIndex> = Vec::new();

        for token in tokenize(query_text) {
            let Some(postings) = self.inverted_index.get(&token) else { continue };
            for &idx in postings {
                let score = scores.entry(idx).or_insert_with(|| {
                    order.push(idx);
                    0
                });
                *score += 1;
            }
        }

        order.sort_by(|a, b| scores[b].cmp(&scores[a]));
        order.truncate(limit);
        order
    }

    /// Ids named in the query (dotted identifiers, bare or with a known
    /// prefix); keyword matches stand in when none resolve.
    fn resolve_seeds(&self, query_text: &str) -> Vec<NodeIndex> {
        let mut seeds: Vec<NodeIndex> = Vec::new();

        for candidate in DOTTED_IDENTIFIER.find_iter(query_text).map(|m| m.as_str()) {
            let resolved = std::iter::once(candidate.to_string())
                .chain(self.id_prefixes.iter().map(|p| format!("{p}{candidate}")))
                .find_map(|id| self.node_index.get(&id).copied());

            if let Some(idx) = resolved {
                if !seeds.contains(&idx) {
                    seeds.push(idx);
                }
            }
            if seeds.len() >= self.max_seeds {
                return seeds;
            }
        }

        if seeds.is_empty() {
            seeds = self.keyword_matches(query_text, self.max_seeds);
        }
        seeds
    }

    fn structural_stage(&self, query_text: &str, results: &mut ResultSet) {
        let intent = self.classifier.classify(query_text);
        if !intent.is_structural {
            return;
        }

        let direction = if intent.use_successors {
            Direction::Outgoing
        } else {
            Direction::Incoming
        };
        let seeds = self.resolve_seeds(query_text);
        debug!(
            "Structural stage: {} seeds, edge={:?}, direction={:?}",
            seeds.len(),
            intent.edge_type,
            direction
        );

        for seed in seeds {
            for neighbor in self.adjacent(seed, intent.edge_type, direction) {
                if results.push(neighbor) {
                    return;
                }
            }
        }
    }
}

#[async_trait]
impl MemoryStore for GraphStore {
    async fn index(&mut self, documents: &[Document]) -> Result<()> {
        self.graph.clear();
        self.node_index.clear();
        self.inverted_index.clear();

        // Every node must exist before any edge is considered. Edges live in
        // the graph itself, so nodes hold the stripped copy.
        for doc in documents {
            match self.node_index.get(doc.id()) {
                Some(&idx) => self.graph[idx] = doc.stripped(),
                None => {
                    let idx = self.graph.add_node(doc.stripped());
                    self.node_index.insert(doc.id().to_string(), idx);
                }
            }
        }

        for idx in self.graph.node_indices().collect::<Vec<_>>() {
            let content = self.graph[idx].content().to_string();
            self.index_document(idx, &content);
        }

        let mut dropped = 0usize;
        for doc in documents {
            for rel in doc.relationships() {
                let (Some(&source), Some(&target)) = (
                    self.node_index.get(rel.source_id()),
                    self.node_index.get(rel.target_id()),
                ) else {
                    dropped += 1;
                    continue;
                };

                let exists = self
                    .graph
                    .edges_connecting(source, target)
                    .any(|edge| edge.weight() == rel.relationship_type());
                if !exists {
                    self.graph
                        .add_edge(source, target, rel.relationship_type().to_string());
                }
            }
        }

        if dropped > 0 {
            debug!("Dropped {} relationships with a missing endpoint", dropped);
        }
        info!(
            "Graph indexed: {} nodes, {} edges, {} terms",
            self.graph.node_count(),
            self.graph.edge_count(),
            self.inverted_index.len()
        );
        Ok(())
    }

    async fn query(&self, query_text: &str, n_results: usize) -> Result<Vec<Document>> {
        if n_results == 0 || self.graph.node_count() == 0 {
            return Ok(Vec::new());
        }

        let mut results = ResultSet::new(n_results);
        let exact = self.node_index.get(query_text).copied();

        // A query that is itself an id is a lookup, not a question about edges.
        if exact.is_none() {
            self.structural_stage(query_text, &mut results);
        }
        let structural = results.nodes.len();

        if let Some(idx) = exact {
            results.push(idx);
        }

        if !results.is_full() {
            for idx in self.keyword_matches(query_text, n_results * 2) {
                if results.push(idx) {
                    break;
                }
            }
        }
        let before_expansion = results.nodes.len();

        if !results.is_full() {
            let snapshot = results.nodes.clone();
            'expand: for idx in snapshot {
                for neighbor in self.adjacent(idx, None, Direction::Outgoing) {
                    if results.push(neighbor) {
                        break 'expand;
                    }
                }
            }
        }

        debug!(
            "Graph query {:?}: structural={}, direct={}, expanded={}",
            crate::safe_truncate(query_text, 60),
            structural,
            before_expansion - structural,
            results.nodes.len() - before_expansion
        );

        Ok(results
            .nodes
            .into_iter()
            .map(|idx| self.graph[idx].clone())
            .collect())
    }

    async fn clear(&mut self) -> Result<()> {
        self.graph.clear();
        self.node_index.clear();
        self.inverted_index.clear();
        Ok(())
    }

    fn size(&self) -> usize {
        self.graph.node_count()
    }

    fn name(&self) -> &str {
        "graph"
    }
}
