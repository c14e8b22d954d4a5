//! Model backend abstraction for codeseek: embeddings, chat and liveness
//! probing against a locally running Ollama service.

pub mod error;
#[cfg(feature = "mock")]
pub mod mock;
pub mod ollama;
pub mod provider;
pub mod retry;

pub use error::LlmError;
pub use provider::{LlmProvider, Message, Role};
pub use retry::RetryPolicy;
