mod env;
mod types;


pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

const SNIPPET_PLACEHOLDER: &str = "{snippet}";

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error naming the first setting that cannot work.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.llm.base_url.trim().is_empty() {
            bail!("llm.base_url must not be empty");
        }
        if self.llm.model.trim().is_empty() {
            bail!("llm.model must not be empty");
        }
        if self.llm.embedding_model.trim().is_empty() {
            bail!("llm.embedding_model must not be empty");
        }
        if self.index.top_k == 0 {
            bail!("index.top_k must be at least 1");
        }
        if self.index.explain_concurrency == 0 {
            bail!("index.explain_concurrency must be at least 1");
        }
        if self.index.extensions.iter().all(|e| e.trim().is_empty()) {
            bail!("index.extensions must list at least one file suffix");
        }
        if !self.index.explain_prompt.contains(SNIPPET_PLACEHOLDER) {
            bail!("index.explain_prompt must contain {SNIPPET_PLACEHOLDER}");
        }
        Ok(())
    }
}
