use std::collections::HashMap;
use std::sync::RwLock;

use super::{BoxFuture, Candidate, VectorIndex, cosine_similarity, rank};
use crate::document::{IndexEntry, SearchMatch};
use crate::error::{IndexError, Result};

/// Non-persistent index for tests and throwaway sessions.
pub struct InMemoryIndex {
    entries: RwLock<HashMap<String, IndexEntry>>,
}

impl InMemoryIndex {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryIndex").finish_non_exhaustive()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> IndexError {
    IndexError::Other(format!("index lock poisoned: {e}"))
}

impl VectorIndex for InMemoryIndex {
    fn upsert(&self, entry: IndexEntry) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut entries = self.entries.write().map_err(poisoned)?;
            entries.insert(entry.id.clone(), entry);
            Ok(())
        })
    }

    fn search(&self, vector: Vec<f32>, limit: usize) -> BoxFuture<'_, Result<Vec<SearchMatch>>> {
        Box::pin(async move {
            let entries = self.entries.read().map_err(poisoned)?;
            let candidates = entries
                .values()
                .filter(|e| e.embedding.len() == vector.len())
                .map(|e| Candidate {
                    id: e.id.clone(),
                    document: e.document.clone(),
                    metadata: e.metadata.clone(),
                    score: cosine_similarity(&vector, &e.embedding),
                })
                .collect();
            Ok(rank(candidates, limit))
        })
    }

    fn ids(&self) -> BoxFuture<'_, Result<Vec<String>>> {
        Box::pin(async move {
            let entries = self.entries.read().map_err(poisoned)?;
            let mut ids: Vec<String> = entries.keys().cloned().collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn count(&self) -> BoxFuture<'_, Result<usize>> {
        Box::pin(async move { Ok(self.entries.read().map_err(poisoned)?.len()) })
    }

    fn clear(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.entries.write().map_err(poisoned)?.clear();
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
