

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{PolystoreError, Result};
use crate::stores::HybridWeights;


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolystoreConfig {

    pub vector_weight: f64,
    pub graph_weight: f64,
    pub bm25_weight: f64,
    pub rrf_k: u32,


    pub default_n_results: usize,
    pub max_seeds: usize,
    pub id_prefixes: Vec<String>,


    pub embedding_provider: String,
    pub embedding_model: String,
    pub embedding_url: String,
    pub embedding_dimensions: usize,
    pub embedding_timeout_secs: u64,
    pub embedding_cache_size: usize,


    pub bm25_k1: f64,
    pub bm25_b: f64,
    pub bm25_epsilon: f64,
}

impl Default for PolystoreConfig {
    fn default() -> Self {
        Self {
            vector_weight: 0.4,
            graph_weight: 0.3,
            bm25_weight: 0.3,
            rrf_k: crate::DEFAULT_RRF_K,

            default_n_results: crate::DEFAULT_N_RESULTS,
            max_seeds: 5,
            id_prefixes: vec!["stdlib.".to_string()],

            embedding_provider: "hash".to_string(),
            embedding_model: crate::DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_url: crate::DEFAULT_OLLAMA_URL.to_string(),
            embedding_dimensions: 384,
            embedding_timeout_secs: 30,
            embedding_cache_size: crate::DEFAULT_CACHE_SIZE,

            bm25_k1: 1.5,
            bm25_b: 0.75,
            bm25_epsilon: 0.25,
        }
    }
}

impl PolystoreConfig {
    /// Defaults, then the optional file (format picked from its extension),
    /// then `POLYSTORE_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            if !path.exists() {
                return Err(PolystoreError::config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("POLYSTORE")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("id_prefixes"),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }


    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    pub fn validate(&self) -> Result<()> {
        self.hybrid_weights()?;
        if self.rrf_k == 0 {
            return Err(PolystoreError::config("rrf_k must be greater than zero"));
        }
        if self.max_seeds == 0 {
            return Err(PolystoreError::config("max_seeds must be greater than zero"));
        }
        Ok(())
    }

    pub fn hybrid_weights(&self) -> Result<HybridWeights> {
        HybridWeights::new(self.vector_weight, self.graph_weight, self.bm25_weight)
    }
}
