use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use super::DataAdapter;
use crate::core::document::Document;
use crate::core::error::{PolystoreError, Result};
use crate::core::relationship::{Metadata, Relationship};


#[derive(Debug, Deserialize)]
struct PythonDocsFile {
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    data: Vec<PythonDocEntry>,
}

#[derive(Debug, Deserialize)]
struct PythonDocEntry {
    id: String,
    name: String,
    module: String,
    #[serde(rename = "type")]
    kind: String,
    signature: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    relationships: Vec<PythonDocRelationship>,
}

#[derive(Debug, Deserialize)]
struct PythonDocRelationship {
    target: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    metadata: Metadata,
}

impl PythonDocEntry {
    fn content(&self) -> String {
        match self.description.as_deref().filter(|d| !d.is_empty()) {
            Some(description) => format!("{} {} : {}", self.name, self.signature, description),
            None => format!("{} {}", self.name, self.signature),
        }
    }

    fn into_document(self) -> Result<Document> {
        let content = self.content();

        let mut relationships = Vec::with_capacity(self.relationships.len());
        for rel in self.relationships {
            // Recursive functions list themselves; such edges carry nothing.
            if rel.target == self.id {
                continue;
            }
            relationships.push(Relationship::new(&self.id, rel.target, rel.kind)?.with_metadata(rel.metadata));
        }

        Ok(Document::new(self.id, content)
            .with_metadata_value("name", self.name)
            .with_metadata_value("module", self.module)
            .with_metadata_value("type", self.kind)
            .with_metadata_value("signature", self.signature)
            .with_relationships(relationships))
    }
}


/// Python standard library documentation extracted to JSON:
/// `{ "metadata": {...}, "data": [ {id, name, module, type, signature, description, relationships} ] }`.
#[derive(Debug, Clone)]
pub struct PythonDocsAdapter {
    data_path: PathBuf,
}

impl PythonDocsAdapter {
    pub fn new(data_path: impl AsRef<Path>) -> Result<Self> {
        let data_path = data_path.as_ref().to_path_buf();
        if !data_path.exists() {
            return Err(PolystoreError::Adapter(format!(
                "data path {} does not exist",
                data_path.display()
            )));
        }
        Ok(Self { data_path })
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    fn read(&self) -> Result<PythonDocsFile> {
        let raw = fs::read_to_string(&self.data_path)?;
        serde_json::from_str(&raw).map_err(|e| {
            PolystoreError::Adapter(format!("malformed {}: {}", self.data_path.display(), e))
        })
    }
}

impl DataAdapter for PythonDocsAdapter {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let file = self.read()?;
        let total = file.data.len();

        let documents = file
            .data
            .into_iter()
            .map(PythonDocEntry::into_document)
            .collect::<Result<Vec<_>>>()?;

        let edges: usize = documents.iter().map(|d| d.relationships().len()).sum();
        debug!("Converted {} entries ({} relationships)", total, edges);
        info!(
            "Loaded {} documents from {}",
            documents.len(),
            self.data_path.display()
        );
        Ok(documents)
    }

    fn validate_source(&self) -> bool {
        self.data_path.is_file()
    }

    fn metadata(&self) -> Metadata {
        self.read().map(|file| file.metadata).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "metadata": {"source": "python-3.12", "count": 2},
        "data": [
            {
                "id": "stdlib.json.load",
                "name": "load",
                "module": "json",
                "type": "function",
                "signature": "(fp, *, cls=None)",
                "description": "Deserialize fp to a Python object.",
                "relationships": [
                    {"target": "stdlib.json.loads", "type": "calls"},
                    {"target": "stdlib.json.load", "type": "calls"}
                ]
            },
            {
                "id": "stdlib.json.loads",
                "name": "loads",
                "module": "json",
                "type": "function",
                "signature": "(s)",
                "relationships": []
            }
        ]
    }"#;

    fn write_sample(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_path_is_rejected() {
        let err = PythonDocsAdapter::new("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, PolystoreError::Adapter(_)));
    }

    #[test]
    fn test_load_documents() {
        let file = write_sample(SAMPLE);
        let adapter = PythonDocsAdapter::new(file.path()).unwrap();
        assert!(adapter.validate_source());

        let docs = adapter.load_documents().unwrap();
        assert_eq!(docs.len(), 2);

        let load = &docs[0];
        assert_eq!(load.id(), "stdlib.json.load");
        assert_eq!(
            load.content(),
            "load (fp, *, cls=None) : Deserialize fp to a Python object."
        );
        assert_eq!(load.metadata_str("module"), Some("json"));
        assert_eq!(load.metadata_str("type"), Some("function"));
        assert!(load.embedding().is_none());

        // The self-reference is dropped, the real call is kept.
        assert_eq!(load.relationships().len(), 1);
        assert_eq!(load.relationships()[0].target_id(), "stdlib.json.loads");

        assert_eq!(docs[1].content(), "loads (s)");
    }

    #[test]
    fn test_dataset_metadata() {
        let file = write_sample(SAMPLE);
        let adapter = PythonDocsAdapter::new(file.path()).unwrap();
        let metadata = adapter.metadata();
        assert_eq!(metadata.get("source").and_then(|v| v.as_str()), Some("python-3.12"));
    }

    #[test]
    fn test_malformed_json() {
        let file = write_sample("{ not json");
        let adapter = PythonDocsAdapter::new(file.path()).unwrap();
        assert!(matches!(adapter.load_documents(), Err(PolystoreError::Adapter(_))));
        assert!(adapter.metadata().is_empty());
    }

    #[test]
    fn test_missing_required_field() {
        let file = write_sample(r#"{"data": [{"id": "x", "name": "x"}]}"#);
        let adapter = PythonDocsAdapter::new(file.path()).unwrap();
        assert!(adapter.load_documents().is_err());
    }
}
