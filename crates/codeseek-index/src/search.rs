//! Query pipeline: embed the question, fetch the nearest files, explain each.

use std::sync::Arc;

use codeseek_llm::LlmProvider;
use futures::StreamExt;

use crate::document::{FILE_KEY, Metadata, SearchMatch};
use crate::embedder::EmbeddingClient;
use crate::error::{IndexError, Result};
use crate::explainer::GenerativeExplainer;
use crate::store::VectorIndex;

pub const DEFAULT_TOP_K: usize = 3;

const UNKNOWN_FILE: &str = "Unknown file";

#[derive(Debug, Clone, Copy)]
pub struct QueryConfig {
    /// Number of matches fetched per query.
    pub top_k: usize,
    /// Explanation requests in flight at once; 1 keeps them sequential.
    pub explain_concurrency: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            explain_concurrency: 1,
        }
    }
}

/// Parallel sequences: `explanations[i]` belongs to `documents[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub documents: Vec<String>,
    pub metadatas: Vec<Metadata>,
    pub explanations: Vec<String>,
}

/// One rendered row of [`SearchResults`].
#[derive(Debug, Clone, Copy)]
pub struct ResultItem<'a> {
    pub file_name: &'a str,
    pub document: &'a str,
    pub explanation: &'a str,
}

impl SearchResults {
    fn from_parts(matches: Vec<SearchMatch>, explanations: Vec<String>) -> Self {
        let (documents, metadatas) = matches.into_iter().map(|m| (m.document, m.metadata)).unzip();
        Self {
            documents,
            metadatas,
            explanations,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ResultItem<'_>> {
        self.documents
            .iter()
            .zip(&self.explanations)
            .enumerate()
            .map(|(i, (document, explanation))| ResultItem {
                file_name: self
                    .metadatas
                    .get(i)
                    .and_then(|m| m.get(FILE_KEY))
                    .map_or(UNKNOWN_FILE, String::as_str),
                document,
                explanation,
            })
    }
}

pub struct QueryPipeline<P> {
    index: Arc<dyn VectorIndex>,
    embedder: EmbeddingClient<P>,
    explainer: GenerativeExplainer<P>,
    config: QueryConfig,
}

impl<P: LlmProvider> QueryPipeline<P> {
    #[must_use]
    pub fn new(
        index: Arc<dyn VectorIndex>,
        embedder: EmbeddingClient<P>,
        explainer: GenerativeExplainer<P>,
        config: QueryConfig,
    ) -> Self {
        Self {
            index,
            embedder,
            explainer,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> QueryConfig {
        self.config
    }

    /// Top-`k` stored documents for a free-text query.
    ///
    /// The query is embedded with the same model used at ingestion time.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Search`] if the query cannot be embedded or the
    /// index lookup fails.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SearchMatch>> {
        let vector = self
            .embedder
            .try_embed(query)
            .await
            .map_err(|e| IndexError::Search(format!("could not embed query: {e}")))?;
        if vector.is_empty() {
            return Err(IndexError::Search("query embedding is empty".into()));
        }

        self.index
            .search(vector, k)
            .await
            .map_err(|e| IndexError::Search(e.to_string()))
    }

    /// Retrieve the nearest documents and explain each of them.
    ///
    /// Explanation failures never fail the search; their slot holds
    /// [`crate::explainer::EXPLANATION_FALLBACK`].
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Search`] if retrieval fails.
    pub async fn search(&self, query: &str) -> Result<SearchResults> {
        let matches = self.retrieve(query, self.config.top_k).await?;
        tracing::debug!(query, hits = matches.len(), "retrieved matches");

        let explanations: Vec<String> =
            futures::stream::iter(matches.iter().map(|m| self.explainer.explain(&m.document)))
                .buffered(self.config.explain_concurrency.max(1))
                .collect()
                .await;

        Ok(SearchResults::from_parts(matches, explanations))
    }

    /// [`Self::search`] with errors logged and turned into empty results.
    pub async fn search_or_empty(&self, query: &str) -> SearchResults {
        match self.search(query).await {
            Ok(results) => results,
            Err(e) => {
                tracing::error!("error searching codebase: {e}");
                SearchResults::default()
            }
        }
    }
}
