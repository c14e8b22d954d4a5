//! Wiring: provider, vector index and pipelines built from [`Config`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use codeseek_index::collector::{CollectorConfig, FileCollector};
use codeseek_index::embedder::EmbeddingClient;
use codeseek_index::explainer::GenerativeExplainer;
use codeseek_index::ingest::IngestionPipeline;
use codeseek_index::search::{QueryConfig, QueryPipeline};
use codeseek_index::store::{InMemoryIndex, QdrantIndex, SqliteIndex, VectorIndex};
use codeseek_llm::ollama::OllamaProvider;
use codeseek_llm::{LlmProvider, RetryPolicy};

use crate::config::{Backend, Config, IndexConfig};

/// Ingestion and query pipelines sharing one provider and one index.
pub struct App<P> {
    pub ingest: IngestionPipeline<P>,
    pub query: QueryPipeline<P>,
    pub index: Arc<dyn VectorIndex>,
}

impl<P: LlmProvider> App<P> {
    #[must_use]
    pub fn new(config: &Config, provider: Arc<P>, index: Arc<dyn VectorIndex>) -> Self {
        let embedder = EmbeddingClient::new(Arc::clone(&provider));
        let ingest = IngestionPipeline::new(
            FileCollector::new(collector_config(&config.index)),
            embedder.clone(),
            Arc::clone(&index),
        );
        let explainer =
            GenerativeExplainer::new(provider).with_template(config.index.explain_prompt.clone());
        let query = QueryPipeline::new(
            Arc::clone(&index),
            embedder,
            explainer,
            QueryConfig {
                top_k: config.index.top_k,
                explain_concurrency: config.index.explain_concurrency,
            },
        );
        Self {
            ingest,
            query,
            index,
        }
    }
}

/// Build the full application against a local Ollama service.
///
/// # Errors
///
/// Returns an error if the configured index backend cannot be opened.
pub async fn build_app(config: &Config) -> anyhow::Result<App<OllamaProvider>> {
    let provider = Arc::new(create_provider(config));
    let index = open_index(&config.index).await?;
    tracing::info!(
        backend = index.name(),
        model = provider.model(),
        embedding_model = provider.embedding_model(),
        "codeseek ready"
    );
    Ok(App::new(config, provider, index))
}

#[must_use]
pub fn create_provider(config: &Config) -> OllamaProvider {
    let t = &config.timeouts;
    let base = RetryPolicy::default().with_max_retries(t.max_retries);
    OllamaProvider::new(
        &config.llm.base_url,
        config.llm.model.clone(),
        config.llm.embedding_model.clone(),
    )
    .with_chat_policy(base.with_timeout(Duration::from_secs(t.llm_seconds)))
    .with_embed_policy(base.with_timeout(Duration::from_secs(t.embedding_seconds)))
    .with_probe_timeout(Duration::from_secs(t.probe_seconds))
}

/// Open the vector index selected by `index.backend`.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrated, or the
/// Qdrant client cannot be created.
pub async fn open_index(config: &IndexConfig) -> anyhow::Result<Arc<dyn VectorIndex>> {
    let index: Arc<dyn VectorIndex> = match config.backend {
        Backend::Sqlite => Arc::new(
            SqliteIndex::open(&config.sqlite_path)
                .await
                .with_context(|| format!("failed to open index at {}", config.sqlite_path))?,
        ),
        Backend::Memory => Arc::new(InMemoryIndex::new()),
        Backend::Qdrant => Arc::new(
            QdrantIndex::new(&config.qdrant_url, &config.collection)
                .with_context(|| format!("failed to connect to Qdrant at {}", config.qdrant_url))?,
        ),
    };
    Ok(index)
}

fn collector_config(config: &IndexConfig) -> CollectorConfig {
    CollectorConfig {
        extensions: config.extensions.clone(),
        respect_gitignore: config.respect_gitignore,
        include_hidden: config.include_hidden,
    }
}
