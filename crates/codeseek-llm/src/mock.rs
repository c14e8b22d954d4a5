//! Test-only mock model provider.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message};

#[derive(Debug, Clone)]
pub struct MockProvider {
    pub responses: Arc<Mutex<Vec<String>>>,
    pub prompts: Arc<Mutex<Vec<String>>>,
    pub embed_calls: Arc<Mutex<usize>>,
    pub default_response: String,
    /// Returned for texts without an entry in `embeddings`.
    pub default_embedding: Vec<f32>,
    /// Per-text embeddings, keyed by the exact text.
    pub embeddings: HashMap<String, Vec<f32>>,
    pub healthy: bool,
    pub fail_chat: bool,
    pub fail_embed: bool,
    /// Fail chat requests whose prompt contains this marker.
    pub fail_chat_containing: Option<String>,
    /// Milliseconds to sleep before returning a chat response.
    pub delay_ms: u64,
    /// Per-marker sleep overriding `delay_ms` for prompts containing the marker.
    pub chat_delays: Vec<(String, u64)>,
    /// Answer every chat with the prompt it received instead of a canned reply.
    pub echo: bool,
    /// Embedding calls fail as if the server refused the connection.
    pub embed_unreachable: bool,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            embed_calls: Arc::new(Mutex::new(0)),
            default_response: "mock response".into(),
            default_embedding: vec![0.5; 4],
            embeddings: HashMap::new(),
            healthy: true,
            fail_chat: false,
            fail_embed: false,
            fail_chat_containing: None,
            delay_ms: 0,
            chat_delays: Vec::new(),
            echo: false,
            embed_unreachable: false,
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            fail_embed: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_embedding(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.embeddings.insert(text.into(), vector);
        self
    }

    #[must_use]
    pub fn with_chat_failure_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_chat_containing = Some(marker.into());
        self
    }

    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    #[must_use]
    pub fn with_delay_on(mut self, marker: impl Into<String>, ms: u64) -> Self {
        self.chat_delays.push((marker.into(), ms));
        self
    }

    #[must_use]
    pub fn echoing(mut self) -> Self {
        self.echo = true;
        self
    }

    #[must_use]
    pub fn with_unreachable_embeddings(mut self) -> Self {
        self.embed_unreachable = true;
        self
    }

    /// Prompts received by `chat`, in call order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    #[must_use]
    pub fn embed_calls(&self) -> usize {
        *self.embed_calls.lock().unwrap()
    }
}

impl LlmProvider for MockProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let prompt = messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let delay_ms = self
            .chat_delays
            .iter()
            .find(|(marker, _)| prompt.contains(marker.as_str()))
            .map_or(self.delay_ms, |(_, ms)| *ms);
        if delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
        }
        self.prompts.lock().unwrap().push(prompt.clone());

        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        if let Some(marker) = &self.fail_chat_containing
            && prompt.contains(marker.as_str())
        {
            return Err(LlmError::Other(format!("mock LLM error on {marker}")));
        }

        if self.echo {
            return Ok(format!("re: {prompt}"));
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        *self.embed_calls.lock().unwrap() += 1;
        if self.embed_unreachable {
            return Err(LlmError::Unavailable(crate::ollama::CONNECT_FAILED.into()));
        }
        if self.fail_embed {
            return Err(LlmError::Other("mock embedding error".into()));
        }
        Ok(self
            .embeddings
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.default_embedding.clone()))
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        if self.healthy {
            Ok(())
        } else {
            Err(LlmError::Unavailable(crate::ollama::NOT_RESPONDING.into()))
        }
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}
