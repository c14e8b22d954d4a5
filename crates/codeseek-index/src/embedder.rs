//! Embedding generation guarded by a liveness probe.

use std::sync::Arc;

use codeseek_llm::LlmProvider;

use crate::error::{IndexError, Result};

/// Turns text into embedding vectors through a model provider.
pub struct EmbeddingClient<P> {
    provider: Arc<P>,
}

impl<P> Clone for EmbeddingClient<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<P: LlmProvider> EmbeddingClient<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Probe the service, then embed `text`.
    ///
    /// Empty text still issues a request. An empty vector from the service is
    /// returned as-is; callers treat it as "no embedding".
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::ServiceUnavailable`] if the liveness probe fails or
    /// the service cannot be reached, [`IndexError::Llm`] for other model errors.
    pub async fn try_embed(&self, text: &str) -> Result<Vec<f32>> {
        self.provider
            .health_check()
            .await
            .map_err(|e| IndexError::ServiceUnavailable(e.to_string()))?;

        self.provider.embed(text).await.map_err(|e| {
            if e.is_unavailable() {
                IndexError::ServiceUnavailable(e.to_string())
            } else {
                IndexError::Llm(e)
            }
        })
    }

    /// Soft-failing variant of [`Self::try_embed`]: errors are logged and
    /// surface as an empty vector.
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        match self.try_embed(text).await {
            Ok(vector) => vector,
            Err(e) => {
                tracing::error!("error generating embedding: {e}");
                Vec::new()
            }
        }
    }
}
