use serde::{Deserialize, Serialize};

use super::error::{PolystoreError, Result};


pub type Metadata = serde_json::Map<String, serde_json::Value>;


/// Directed, typed edge between two documents.
///
/// A relationship can never point at its own source: construction fails
/// with a validation error, and deserialization goes through the same check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRelationship")]
pub struct Relationship {
    source_id: String,
    target_id: String,
    relationship_type: String,
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Deserialize)]
struct RawRelationship {
    source_id: String,
    target_id: String,
    relationship_type: String,
    #[serde(default)]
    metadata: Metadata,
}

impl TryFrom<RawRelationship> for Relationship {
    type Error = PolystoreError;

    fn try_from(raw: RawRelationship) -> Result<Self> {
        Ok(Self::new(raw.source_id, raw.target_id, raw.relationship_type)?.with_metadata(raw.metadata))
    }
}

impl Relationship {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relationship_type: impl Into<String>,
    ) -> Result<Self> {
        let source_id = source_id.into();
        let target_id = target_id.into();

        if source_id == target_id {
            return Err(PolystoreError::validation(format!(
                "source and target ids cannot be the same (self-loop detected on '{source_id}')"
            )));
        }

        Ok(Self {
            source_id,
            target_id,
            relationship_type: relationship_type.into(),
            metadata: Metadata::new(),
        })
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn relationship_type(&self) -> &str {
        &self.relationship_type
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}
