use serde::{Deserialize, Serialize};

use super::error::{PolystoreError, Result};
use super::relationship::{Metadata, Relationship};


/// A retrievable unit: identity, searchable text, free-form metadata,
/// an optional embedding and the outgoing relationships it owns.
///
/// ```
/// use polystore::{Document, Relationship};
///
/// let doc = Document::new("stdlib.json.load", "load (fp, *, cls=None) : Deserialize fp")
///     .with_metadata_value("module", "json")
///     .with_relationship(Relationship::new("stdlib.json.load", "stdlib.json.loads", "calls")?);
/// assert_eq!(doc.relationships().len(), 1);
/// # Ok::<(), polystore::PolystoreError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDocument")]
pub struct Document {
    id: String,
    content: String,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    relationships: Vec<Relationship>,
}

#[derive(Deserialize)]
struct RawDocument {
    id: String,
    content: String,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    relationships: Vec<Relationship>,
}

impl TryFrom<RawDocument> for Document {
    type Error = PolystoreError;

    fn try_from(raw: RawDocument) -> Result<Self> {
        let mut doc = Self::new(raw.id, raw.content)
            .with_metadata(raw.metadata)
            .with_relationships(raw.relationships);
        doc.set_embedding(raw.embedding)?;
        Ok(doc)
    }
}

fn validate_embedding(embedding: &[f32]) -> Result<()> {
    if embedding.is_empty() {
        return Err(PolystoreError::validation("embedding cannot be an empty list"));
    }
    if let Some(pos) = embedding.iter().position(|v| !v.is_finite()) {
        return Err(PolystoreError::validation(format!(
            "embedding elements must be finite numbers (index {pos})"
        )));
    }
    Ok(())
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: Metadata::new(),
            embedding: None,
            relationships: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    #[must_use]
    pub fn with_metadata_value(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    #[must_use]
    pub fn with_relationships(mut self, relationships: Vec<Relationship>) -> Self {
        self.relationships = relationships;
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Result<Self> {
        self.set_embedding(Some(embedding))?;
        Ok(self)
    }

    /// Replace the embedding, validating it first. On error the document is unchanged.
    pub fn set_embedding(&mut self, embedding: Option<Vec<f32>>) -> Result<()> {
        if let Some(values) = &embedding {
            validate_embedding(values)?;
        }
        self.embedding = embedding;
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Copy carrying only identity, content and metadata, as stores return
    /// it from a query.
    #[must_use]
    pub fn stripped(&self) -> Self {
        Self {
            id: self.id.clone(),
            content: self.content.clone(),
            metadata: self.metadata.clone(),
            embedding: None,
            relationships: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_minimal_document() {
        let doc = Document::new("test", "test content");
        assert_eq!(doc.id(), "test");
        assert_eq!(doc.content(), "test content");
        assert!(doc.metadata().is_empty());
        assert!(doc.embedding().is_none());
        assert!(doc.relationships().is_empty());
    }

    #[test]
    fn test_document_with_all_fields() {
        let rel = Relationship::new("test", "other", "calls").unwrap();
        let doc = Document::new("test", "content")
            .with_metadata_value("key", "value")
            .with_relationship(rel.clone())
            .with_embedding(vec![1.0, 2.0, 3.0])
            .unwrap();

        assert_eq!(doc.metadata_str("key"), Some("value"));
        assert_eq!(doc.embedding(), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(doc.relationships(), &[rel]);
    }

    #[test]
    fn test_empty_embedding_is_rejected() {
        let err = Document::new("test", "content").with_embedding(vec![]).unwrap_err();
        assert!(err.to_string().contains("embedding cannot be an empty list"));
    }

    #[test]
    fn test_non_finite_embedding_is_rejected() {
        assert!(Document::new("t", "c").with_embedding(vec![1.0, f32::NAN]).is_err());
        assert!(Document::new("t", "c").with_embedding(vec![f32::INFINITY]).is_err());
    }

    #[test]
    fn test_failed_assignment_keeps_previous_embedding() {
        let mut doc = Document::new("t", "c").with_embedding(vec![0.5]).unwrap();
        assert!(doc.set_embedding(Some(vec![])).is_err());
        assert_eq!(doc.embedding(), Some(&[0.5][..]));

        doc.set_embedding(None).unwrap();
        assert!(doc.embedding().is_none());
    }

    #[test]
    fn test_deserialize_rejects_bad_embedding() {
        let raw = json!({"id": "t", "content": "c", "embedding": []});
        assert!(serde_json::from_value::<Document>(raw).is_err());

        let raw = json!({"id": "t", "content": "c", "embedding": [1.0, "bad"]});
        assert!(serde_json::from_value::<Document>(raw).is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let original = Document::new("test", "content")
            .with_metadata_value("key", "value")
            .with_relationship(Relationship::new("test", "other", "calls").unwrap())
            .with_embedding(vec![1.0, 2.0])
            .unwrap();

        let encoded = serde_json::to_string(&original).unwrap();
        let decoded: Document = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_stripped_drops_derived_fields() {
        let doc = Document::new("a", "text")
            .with_relationship(Relationship::new("a", "b", "calls").unwrap())
            .with_embedding(vec![0.1])
            .unwrap();

        let stripped = doc.stripped();
        assert_eq!(stripped.id(), "a");
        assert_eq!(stripped.content(), "text");
        assert!(stripped.embedding().is_none());
        assert!(stripped.relationships().is_empty());
    }
}
