use std::time::Duration;

use ollama_rs::Ollama;
use ollama_rs::error::OllamaError;
use ollama_rs::generation::chat::ChatMessage;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message, Role};
use crate::retry::RetryPolicy;

const DEFAULT_PORT: u16 = 11434;
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub const NOT_RESPONDING: &str =
    "Ollama server is not responding. Ensure it is running with 'ollama serve'.";
pub const CONNECT_FAILED: &str =
    "Failed to connect to Ollama. Ensure it is running with 'ollama serve'.";

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Ollama,
    http: reqwest::Client,
    base_url: String,
    model: String,
    embedding_model: String,
    chat_policy: RetryPolicy,
    embed_policy: RetryPolicy,
    probe_timeout: Duration,
}

impl OllamaProvider {
    #[must_use]
    pub fn new(base_url: &str, model: String, embedding_model: String) -> Self {
        let (host, port) = parse_host_port(base_url);
        Self {
            client: Ollama::new(host, port),
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            model,
            embedding_model,
            chat_policy: RetryPolicy::default().with_timeout(Duration::from_secs(120)),
            embed_policy: RetryPolicy::default(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_chat_policy(mut self, policy: RetryPolicy) -> Self {
        self.chat_policy = policy;
        self
    }

    #[must_use]
    pub fn with_embed_policy(mut self, policy: RetryPolicy) -> Self {
        self.embed_policy = policy;
        self
    }

    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }
}

impl LlmProvider for OllamaProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let ollama_messages: Vec<ChatMessage> = messages.iter().map(convert_message).collect();

        let response = self
            .chat_policy
            .run("chat", || {
                let client = self.client.clone();
                let request = ChatMessageRequest::new(self.model.clone(), ollama_messages.clone());
                async move {
                    client
                        .send_chat_messages(request)
                        .await
                        .map_err(|e| request_error("chat", e))
                }
            })
            .await?;

        if response.message.content.is_empty() {
            return Err(LlmError::EmptyResponse { provider: "ollama" });
        }
        Ok(response.message.content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let response = self
            .embed_policy
            .run("embed", || {
                let client = self.client.clone();
                let request = GenerateEmbeddingsRequest::new(
                    self.embedding_model.clone(),
                    EmbeddingsInput::from(text),
                );
                async move {
                    client
                        .generate_embeddings(request)
                        .await
                        .map_err(|e| request_error("embedding", e))
                }
            })
            .await?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse { provider: "ollama" })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        let response = self
            .http
            .get(&self.base_url)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!("Ollama liveness probe failed: {e}");
                LlmError::Unavailable(CONNECT_FAILED.into())
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            tracing::debug!(status = %response.status(), "Ollama liveness probe rejected");
            Err(LlmError::Unavailable(NOT_RESPONDING.into()))
        }
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ollama"
    }
}

fn convert_message(msg: &Message) -> ChatMessage {
    let text = msg.content.clone();
    match msg.role {
        Role::System => ChatMessage::system(text),
        Role::Assistant => ChatMessage::assistant(text),
        Role::User => ChatMessage::user(text),
    }
}

/// Refused connections and transport timeouts mean the server is down, not
/// that the request was bad.
fn request_error(operation: &str, err: OllamaError) -> LlmError {
    match err {
        OllamaError::ReqwestError(e) if e.is_connect() || e.is_timeout() => {
            tracing::debug!("Ollama {operation} request could not reach the server: {e}");
            LlmError::Unavailable(CONNECT_FAILED.into())
        }
        OllamaError::ReqwestError(e) => {
            LlmError::Other(format!("Ollama {operation} request failed: {e}"))
        }
        other => LlmError::Other(format!("Ollama {operation} request failed: {other}")),
    }
}

fn parse_host_port(url: &str) -> (String, u16) {
    let url = url.trim_end_matches('/');
    if let Some(colon_pos) = url.rfind(':') {
        let port_str = &url[colon_pos + 1..];
        if let Ok(port) = port_str.parse::<u16>() {
            let host = url[..colon_pos].to_string();
            return (host, port);
        }
    }
    (url.to_string(), DEFAULT_PORT)
}
