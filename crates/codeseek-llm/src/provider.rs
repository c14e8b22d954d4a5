use std::future::Future;

use crate::error::LlmError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

pub trait LlmProvider: Send + Sync {
    /// Send messages to the model and return the assistant response.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to communicate or the response is invalid.
    fn chat(&self, messages: &[Message]) -> impl Future<Output = Result<String, LlmError>> + Send;

    /// Turn text into an embedding vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedding request fails.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send;

    /// Liveness probe against the model service.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Unavailable` if the service is unreachable or unhealthy.
    fn health_check(&self) -> impl Future<Output = Result<(), LlmError>> + Send;

    fn name(&self) -> &str;
}
