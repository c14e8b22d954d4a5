//! Persisted vector index keyed by file name.
//!
//! Every backend stores the embedding it is handed; none of them embeds text
//! on its own. Queries pass a vector produced by the same embedding model.

mod memory;
mod qdrant;
mod sqlite;

use std::future::Future;
use std::pin::Pin;

pub use memory::InMemoryIndex;
pub use qdrant::{DEFAULT_COLLECTION, QdrantIndex};
pub use sqlite::SqliteIndex;

use crate::document::{IndexEntry, Metadata, SearchMatch};
use crate::error::Result;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait VectorIndex: Send + Sync {
    /// Insert or replace the entry with the same id.
    fn upsert(&self, entry: IndexEntry) -> BoxFuture<'_, Result<()>>;

    /// Top `limit` entries by cosine similarity to `vector`, best first.
    fn search(&self, vector: Vec<f32>, limit: usize) -> BoxFuture<'_, Result<Vec<SearchMatch>>>;

    /// All stored ids, sorted.
    fn ids(&self) -> BoxFuture<'_, Result<Vec<String>>>;

    fn count(&self) -> BoxFuture<'_, Result<usize>>;

    /// Remove every entry.
    fn clear(&self) -> BoxFuture<'_, Result<()>>;

    fn name(&self) -> &'static str;
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// A stored entry scored against a query vector, before ranking.
pub(crate) struct Candidate {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
    pub score: f32,
}

/// Sort by descending score (ties by id), keep `limit`, assign ranks.
pub(crate) fn rank(mut candidates: Vec<Candidate>, limit: usize) -> Vec<SearchMatch> {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    candidates.truncate(limit);
    candidates
        .into_iter()
        .enumerate()
        .map(|(rank, c)| SearchMatch {
            id: c.id,
            document: c.document,
            metadata: c.metadata,
            score: c.score,
            rank,
        })
        .collect()
}
