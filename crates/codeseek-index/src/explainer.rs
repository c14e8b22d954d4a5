//! Natural-language explanations of retrieved snippets.

use std::sync::Arc;

use codeseek_llm::{LlmError, LlmProvider, Message};

use crate::error::{IndexError, Result};

/// Returned in place of an explanation when generation fails.
pub const EXPLANATION_FALLBACK: &str = "Failed to generate an explanation.";

/// Default instruction; `{snippet}` is replaced by the code.
pub const DEFAULT_EXPLAIN_PROMPT: &str = "Explain this code: {snippet}";

const SNIPPET_PLACEHOLDER: &str = "{snippet}";

pub struct GenerativeExplainer<P> {
    provider: Arc<P>,
    template: String,
}

impl<P> Clone for GenerativeExplainer<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            template: self.template.clone(),
        }
    }
}

impl<P: LlmProvider> GenerativeExplainer<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            template: DEFAULT_EXPLAIN_PROMPT.to_owned(),
        }
    }

    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    #[must_use]
    pub fn prompt_for(&self, snippet: &str) -> String {
        self.template.replace(SNIPPET_PLACEHOLDER, snippet)
    }

    /// Ask the model for an explanation of `snippet`.
    ///
    /// # Errors
    ///
    /// Returns an error if the chat request fails or the reply is blank.
    pub async fn try_explain(&self, snippet: &str) -> Result<String> {
        let reply = self
            .provider
            .chat(&[Message::user(self.prompt_for(snippet))])
            .await?;
        if reply.trim().is_empty() {
            return Err(IndexError::Llm(LlmError::EmptyResponse { provider: "chat" }));
        }
        Ok(reply)
    }

    /// Explanation or [`EXPLANATION_FALLBACK`]; never fails.
    pub async fn explain(&self, snippet: &str) -> String {
        match self.try_explain(snippet).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("error querying {}: {e}", self.provider.name());
                EXPLANATION_FALLBACK.to_owned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use codeseek_llm::mock::MockProvider;

    use super::*;

    #[tokio::test]
    async fn sends_templated_prompt() {
        let provider = Arc::new(MockProvider::with_responses(vec![
            "It prints one.".into(),
        ]));
        let explainer = GenerativeExplainer::new(Arc::clone(&provider));

        assert_eq!(explainer.explain("print(1)").await, "It prints one.");
        assert_eq!(provider.prompts(), ["Explain this code: print(1)"]);
    }

    #[tokio::test]
    async fn custom_template() {
        let provider = Arc::new(MockProvider::default());
        let explainer = GenerativeExplainer::new(Arc::clone(&provider))
            .with_template("Explain this Python code: {snippet}");
        explainer.explain("x = 1").await;
        assert_eq!(provider.prompts(), ["Explain this Python code: x = 1"]);
    }

    #[tokio::test]
    async fn failure_returns_fallback() {
        let explainer = GenerativeExplainer::new(Arc::new(MockProvider::failing()));
        assert_eq!(explainer.explain("print(1)").await, EXPLANATION_FALLBACK);
    }

    #[tokio::test]
    async fn blank_reply_is_an_error() {
        let explainer =
            GenerativeExplainer::new(Arc::new(MockProvider::with_responses(vec!["  \n".into()])));
        assert!(explainer.try_explain("print(1)").await.is_err());
    }
}
