//! Source adapters turn a domain's raw data into [`Document`]s ready for indexing.

pub mod python_docs;

pub use python_docs::PythonDocsAdapter;

use crate::core::document::Document;
use crate::core::error::Result;
use crate::core::relationship::Metadata;


pub trait DataAdapter {
    /// Documents with their relationships; embeddings are left to the stores.
    fn load_documents(&self) -> Result<Vec<Document>>;

    fn validate_source(&self) -> bool {
        true
    }

    /// Dataset description (version, counts, provenance).
    fn metadata(&self) -> Metadata {
        Metadata::new()
    }
}
