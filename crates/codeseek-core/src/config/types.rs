use codeseek_index::explainer::DEFAULT_EXPLAIN_PROMPT;
use codeseek_index::search::DEFAULT_TOP_K;
use codeseek_index::store::DEFAULT_COLLECTION;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_model")]
    pub embedding_model: String,
}

fn default_base_url() -> String {
    "http://localhost:11434".into()
}

fn default_model() -> String {
    "mistral".into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            embedding_model: default_model(),
        }
    }
}

/// Vector index storage backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Memory,
    Qdrant,
}

impl Backend {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
            Self::Qdrant => "qdrant",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub respect_gitignore: bool,
    #[serde(default = "default_true")]
    pub include_hidden: bool,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_explain_concurrency")]
    pub explain_concurrency: usize,
    #[serde(default = "default_explain_prompt")]
    pub explain_prompt: String,
}

fn default_sqlite_path() -> String {
    ".codeseek/index.db".into()
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".into()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.into()
}

fn default_extensions() -> Vec<String> {
    vec![".py".into()]
}

fn default_true() -> bool {
    true
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_explain_concurrency() -> usize {
    1
}

fn default_explain_prompt() -> String {
    DEFAULT_EXPLAIN_PROMPT.into()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            sqlite_path: default_sqlite_path(),
            qdrant_url: default_qdrant_url(),
            collection: default_collection(),
            extensions: default_extensions(),
            respect_gitignore: false,
            include_hidden: true,
            top_k: default_top_k(),
            explain_concurrency: default_explain_concurrency(),
            explain_prompt: default_explain_prompt(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_embedding_timeout")]
    pub embedding_seconds: u64,
    #[serde(default = "default_llm_timeout")]
    pub llm_seconds: u64,
    #[serde(default = "default_probe_timeout")]
    pub probe_seconds: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_embedding_timeout() -> u64 {
    30
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    2
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            embedding_seconds: default_embedding_timeout(),
            llm_seconds: default_llm_timeout(),
            probe_seconds: default_probe_timeout(),
            max_retries: default_max_retries(),
        }
    }
}
