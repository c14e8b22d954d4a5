//! Documents flowing through ingestion and search.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Metadata key holding the source file name.
pub const FILE_KEY: &str = "file";

/// String metadata attached to every index entry.
pub type Metadata = BTreeMap<String, String>;

/// A source file read during one ingestion pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// File name; the document identity inside the index.
    pub name: String,
    pub path: PathBuf,
    pub content: String,
}

/// A persisted record: one per file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
}

impl IndexEntry {
    /// Build the entry for a source document: `id` and `metadata.file` are the
    /// file name, the document is the full text.
    #[must_use]
    pub fn for_document(doc: &SourceDocument, embedding: Vec<f32>) -> Self {
        Self {
            id: doc.name.clone(),
            document: doc.content.clone(),
            metadata: file_metadata(&doc.name),
            embedding,
        }
    }
}

#[must_use]
pub fn file_metadata(name: &str) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(FILE_KEY.to_owned(), name.to_owned());
    metadata
}

/// A nearest-neighbour hit returned by a [`crate::store::VectorIndex`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchMatch {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
    /// Cosine similarity to the query vector.
    pub score: f32,
    /// 0-based position in the result list.
    pub rank: usize,
}
