#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("{0}")]
    Unavailable(String),

    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },

    #[error("empty response from {provider}")]
    EmptyResponse { provider: &'static str },

    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// Whether the failure means the model service could not be reached at all.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
