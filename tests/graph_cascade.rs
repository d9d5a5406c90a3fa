use std::sync::{Arc, OnceLock};

use polystore::stores::{GraphStore, MemoryStore};
use polystore::{Document, QueryIntent, Relationship, StructuralIntentClassifier};
use proptest::prelude::*;

fn classifier() -> Arc<StructuralIntentClassifier> {
    static CLASSIFIER: OnceLock<Arc<StructuralIntentClassifier>> = OnceLock::new();
    Arc::clone(CLASSIFIER.get_or_init(|| Arc::new(StructuralIntentClassifier::new())))
}

fn calls(source: &str, target: &str) -> Relationship {
    Relationship::new(source, target, "calls").unwrap()
}

fn json_corpus() -> Vec<Document> {
    vec![
        Document::new("json.load", "load (fp) : Deserialize fp to a Python object")
            .with_relationship(calls("json.load", "json.loads")),
        Document::new("json.loads", "loads (s) : Deserialize s to a Python object"),
        Document::new("json.dumps", "dumps (obj) : Serialize obj to a JSON formatted str"),
    ]
}

fn ids(docs: &[Document]) -> Vec<&str> {
    docs.iter().map(Document::id).collect()
}

#[tokio::test]
async fn exact_id_wins_over_later_stages() {
    let mut store = GraphStore::new(classifier());
    store.index(&json_corpus()).await.unwrap();

    let results = store.query("json.loads", 5).await.unwrap();
    assert_eq!(results[0].id(), "json.loads");
}

#[tokio::test]
async fn callers_question_walks_incoming_calls() {
    let classifier = classifier();
    let intent = classifier.classify("What functions call json.loads?");
    assert_eq!(intent, QueryIntent::structural(Some("calls"), false));

    let mut store = GraphStore::new(classifier);
    store.index(&json_corpus()).await.unwrap();

    let results = store.query("What functions call json.loads?", 5).await.unwrap();
    assert_eq!(results[0].id(), "json.load");
    assert_eq!(ids(&store.get_predecessors("json.loads", Some("calls"))), vec!["json.load"]);
}

#[tokio::test]
async fn rules_fallback_answers_the_same_callers_question() {
    let mut store = GraphStore::new(Arc::new(StructuralIntentClassifier::rules_only()));
    store.index(&json_corpus()).await.unwrap();

    let results = store.query("What functions call json.loads?", 5).await.unwrap();
    assert_eq!(results[0].id(), "json.load");
}

#[tokio::test]
async fn circular_calls_traverse_both_ways() {
    let mut store = GraphStore::new(classifier());
    store
        .index(&[
            Document::new("func1", "first").with_relationship(calls("func1", "func2")),
            Document::new("func2", "second").with_relationship(calls("func2", "func1")),
        ])
        .await
        .unwrap();

    assert_eq!(ids(&store.get_neighbors("func1", None)), vec!["func2"]);
    assert_eq!(ids(&store.get_neighbors("func2", None)), vec!["func1"]);
    assert_eq!(ids(&store.get_predecessors("func1", Some("calls"))), vec!["func2"]);
    assert_eq!(ids(&store.get_predecessors("func2", Some("calls"))), vec!["func1"]);

    let results = store.query("first", 5).await.unwrap();
    assert_eq!(ids(&results), vec!["func1", "func2"]);
}

#[tokio::test]
async fn ghost_edge_leaves_size_untouched() {
    let mut store = GraphStore::new(classifier());
    store
        .index(&[Document::new("a", "alpha").with_relationship(calls("a", "ghost"))])
        .await
        .unwrap();

    assert_eq!(store.size(), 1);
    assert!(store.get_neighbors("a", Some("calls")).is_empty());
    assert!(!store.contains("ghost"));
}

#[tokio::test]
async fn empty_graph_queries_return_nothing() {
    let store = GraphStore::new(classifier());
    assert!(store.query("What functions call json.loads?", 5).await.unwrap().is_empty());
    assert!(store.get_neighbors("json.loads", None).is_empty());
}

fn corpus_strategy() -> impl Strategy<Value = Vec<Document>> {
    let words = prop::sample::select(vec!["parse", "json", "regex", "path", "join", "load"]);
    prop::collection::vec(
        (
            0usize..6,
            prop::collection::vec(words, 1..4),
            prop::collection::vec((0usize..6, prop::bool::ANY), 0..3),
        ),
        1..8,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(id, words, edges)| {
                let source = format!("mod.f{id}");
                let rels = edges
                    .into_iter()
                    .filter(|(target, _)| *target != id)
                    .map(|(target, inherit)| {
                        let kind = if inherit { "base_class" } else { "calls" };
                        Relationship::new(source.clone(), format!("mod.f{target}"), kind).unwrap()
                    })
                    .collect();
                Document::new(source.clone(), words.join(" ")).with_relationships(rels)
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn reindexing_is_idempotent(docs in corpus_strategy(), query in "(parse|json|path) (join|load)") {
        let classifier = Arc::new(StructuralIntentClassifier::rules_only());

        let mut once = GraphStore::new(Arc::clone(&classifier));
        tokio_test::block_on(once.index(&docs)).unwrap();

        let mut twice = GraphStore::new(classifier);
        tokio_test::block_on(twice.index(&docs)).unwrap();
        tokio_test::block_on(twice.index(&docs)).unwrap();

        prop_assert_eq!(once.size(), twice.size());
        prop_assert_eq!(once.edge_count(), twice.edge_count());

        let a = tokio_test::block_on(once.query(&query, 5)).unwrap();
        let b = tokio_test::block_on(twice.query(&query, 5)).unwrap();
        prop_assert_eq!(ids(&a), ids(&b));
    }
}
