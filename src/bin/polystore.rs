use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use polystore::adapters::{DataAdapter, PythonDocsAdapter};
use polystore::eval::{BenchmarkReport, load_queries, run_benchmark};
use polystore::stores::{Bm25Params, Bm25Store, GraphStore, HybridStore, MemoryStore, VectorStore};
use polystore::{Document, EmbeddingProviderFactory, PolystoreConfig, StructuralIntentClassifier};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const STORE_TYPES: [&str; 4] = ["vector", "graph", "bm25", "hybrid"];


struct CliArgs {
    command: String,
    text: Vec<String>,
    store: String,
    data: PathBuf,
    top_k: Option<usize>,
    config: Option<PathBuf>,
    queries: PathBuf,
}

impl CliArgs {
    fn parse(args: &[String]) -> anyhow::Result<Option<Self>> {
        let mut parsed = Self {
            command: String::new(),
            text: Vec::new(),
            store: "vector".to_string(),
            data: PathBuf::from("data/python_docs.json"),
            top_k: None,
            config: None,
            queries: PathBuf::from("data/python_benchmarks.json"),
        };

        let mut i = 1;
        while i < args.len() {
            let value = args.get(i + 1);
            match (args[i].as_str(), value) {
                ("--store" | "-s", Some(v)) => {
                    parsed.store = v.to_lowercase();
                    i += 1;
                }
                ("--data" | "-d", Some(v)) => {
                    parsed.data = PathBuf::from(v);
                    i += 1;
                }
                ("--top-k" | "-k", Some(v)) => {
                    parsed.top_k = Some(v.parse().with_context(|| format!("invalid --top-k: {v}"))?);
                    i += 1;
                }
                ("--config" | "-c", Some(v)) => {
                    parsed.config = Some(PathBuf::from(v));
                    i += 1;
                }
                ("--queries" | "-q", Some(v)) => {
                    parsed.queries = PathBuf::from(v);
                    i += 1;
                }
                ("--help" | "-h", _) => return Ok(None),
                (flag, None) if flag.starts_with('-') => bail!("missing value for {flag}"),
                (word, _) if parsed.command.is_empty() => parsed.command = word.to_string(),
                (word, _) => parsed.text.push(word.to_string()),
            }
            i += 1;
        }

        if parsed.command.is_empty() {
            return Ok(None);
        }
        Ok(Some(parsed))
    }
}


fn create_store(
    store_type: &str,
    config: &PolystoreConfig,
    classifier: &Arc<StructuralIntentClassifier>,
) -> anyhow::Result<Box<dyn MemoryStore>> {
    let store: Box<dyn MemoryStore> = match store_type {
        "vector" => Box::new(VectorStore::new(EmbeddingProviderFactory::from_config(config)?)),
        "graph" => Box::new(GraphStore::with_config(Arc::clone(classifier), config)),
        "bm25" => Box::new(Bm25Store::new(Bm25Params::from(config))),
        "hybrid" => Box::new(HybridStore::from_config(config, Arc::clone(classifier))?),
        other => bail!("unknown store type '{other}'. Available: {}", STORE_TYPES.join(", ")),
    };
    Ok(store)
}

fn load_documents(path: &Path) -> anyhow::Result<Vec<Document>> {
    let adapter = PythonDocsAdapter::new(path)?;
    let docs = adapter.load_documents()?;
    eprintln!("✓ Loaded {} documents from {}", docs.len(), path.display());
    Ok(docs)
}

fn print_results(results: &[Document]) {
    if results.is_empty() {
        println!("No results found");
        return;
    }

    println!("{:<5} {:<40} {:<16} {:<10} PREVIEW", "RANK", "ID", "MODULE", "TYPE");
    for (rank, doc) in results.iter().enumerate() {
        println!(
            "{:<5} {:<40} {:<16} {:<10} {}",
            rank + 1,
            doc.id(),
            doc.metadata_str("module").unwrap_or("N/A"),
            doc.metadata_str("type").unwrap_or("N/A"),
            polystore::preview(doc.content(), 100)
        );
    }
}

fn print_info(args: &CliArgs, docs: &[Document]) {
    let modules: HashSet<&str> = docs
        .iter()
        .map(|d| d.metadata_str("module").unwrap_or("unknown"))
        .collect();
    let count_type = |t: &str| docs.iter().filter(|d| d.metadata_str("type") == Some(t)).count();

    println!("Dataset Information");
    println!("  Data source:      {}", args.data.display());
    println!("  Total documents:  {}", docs.len());
    println!("  Unique modules:   {}", modules.len());
    println!("  Functions:        {}", count_type("function"));
    println!("  Classes:          {}", count_type("class"));
    println!("  Store type:       {}", args.store);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("polystore=warn")))
        .init();

    let argv: Vec<String> = env::args().collect();
    let Some(args) = CliArgs::parse(&argv)? else {
        print_help();
        return Ok(());
    };

    let config = PolystoreConfig::load(args.config.as_deref())?;
    config.validate()?;
    let top_k = args.top_k.unwrap_or(config.default_n_results);

    match args.command.as_str() {
        "query" => {
            if args.text.is_empty() {
                bail!("query requires text, e.g. polystore query \"parse json\"");
            }
            let query_text = args.text.join(" ");
            let docs = load_documents(&args.data)?;

            let classifier = Arc::new(StructuralIntentClassifier::new());
            let mut store = create_store(&args.store, &config, &classifier)?;
            store.index(&docs).await?;
            eprintln!("✓ Indexed {} documents into {} store", store.size(), store.name());

            println!("Searching for: {query_text}\n");
            let results = store.query(&query_text, top_k).await?;
            print_results(&results);
        }
        "index" => {
            let docs = load_documents(&args.data)?;
            let classifier = Arc::new(StructuralIntentClassifier::new());
            let mut store = create_store(&args.store, &config, &classifier)?;
            store.index(&docs).await?;
            println!("✓ Successfully indexed {} documents", store.size());
            println!("Note: stores are in-memory; nothing is persisted after exit.");
        }
        "info" => {
            let docs = load_documents(&args.data)?;
            print_info(&args, &docs);
        }
        "bench" => {
            let docs = load_documents(&args.data)?;
            let queries = load_queries(&args.queries)
                .with_context(|| format!("loading {}", args.queries.display()))?;
            eprintln!("✓ Loaded {} benchmark queries", queries.len());

            let classifier = Arc::new(StructuralIntentClassifier::new());
            let store_types: Vec<&str> = if args.store == "all" {
                STORE_TYPES.to_vec()
            } else {
                vec![args.store.as_str()]
            };

            let mut results = Vec::with_capacity(store_types.len());
            for store_type in store_types {
                let mut store = create_store(store_type, &config, &classifier)?;
                store.index(&docs).await?;
                eprintln!("✓ {} store indexed: {} documents", store.name(), store.size());
                results.push((store.name().to_string(), run_benchmark(store.as_ref(), &queries, top_k).await?));
            }

            let report = BenchmarkReport::build(top_k, &results);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        other => {
            eprintln!("❌ Unknown command: {other}");
            print_help();
            std::process::exit(2);
        }
    }

    Ok(())
}

fn print_help() {
    println!(r#"
Polystore retrieval CLI

USAGE:
    polystore <COMMAND> [OPTIONS]

COMMANDS:
    query <TEXT>    Index the dataset and print the top results for TEXT
    index           Index the dataset and report the store size
    info            Print dataset statistics
    bench           Run benchmark queries and print a JSON report

OPTIONS:
    -s, --store <TYPE>      vector | graph | bm25 | hybrid (bench also takes "all"; default: vector)
    -d, --data <PATH>       Documentation JSON (default: data/python_docs.json)
    -k, --top-k <N>         Results per query (default: 5)
    -c, --config <PATH>     Config file (TOML/JSON/YAML)
    -q, --queries <PATH>    Benchmark queries (default: data/python_benchmarks.json)
    -h, --help              Print this help

ENVIRONMENT:
    POLYSTORE_*             Override any config field, e.g. POLYSTORE_EMBEDDING_PROVIDER=ollama
    RUST_LOG                Log filter, e.g. RUST_LOG=polystore=debug
"#);
}
