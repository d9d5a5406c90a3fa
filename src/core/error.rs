

use thiserror::Error;

use crate::embeddings::EmbeddingError;


#[derive(Error, Debug)]
pub enum PolystoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Adapter error: {0}")]
    Adapter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl PolystoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<EmbeddingError> for PolystoreError {
    fn from(err: EmbeddingError) -> Self {
        Self::Embedding(err.to_string())
    }
}

impl From<config::ConfigError> for PolystoreError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}


pub type Result<T> = std::result::Result<T, PolystoreError>;
