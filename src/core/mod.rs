

pub mod config;
pub mod document;
pub mod error;
pub mod relationship;

pub use config::PolystoreConfig;
pub use document::Document;
pub use error::{PolystoreError, Result};
pub use relationship::{Metadata, Relationship};
