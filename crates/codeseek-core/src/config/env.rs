use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CODESEEK_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("CODESEEK_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("CODESEEK_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("CODESEEK_INDEX_BACKEND") {
            if let Ok(backend) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.index.backend = backend;
            } else {
                tracing::warn!("ignoring invalid CODESEEK_INDEX_BACKEND value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CODESEEK_SQLITE_PATH") {
            self.index.sqlite_path = v;
        }
        if let Ok(v) = std::env::var("CODESEEK_QDRANT_URL") {
            self.index.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("CODESEEK_INDEX_TOP_K") {
            if let Ok(k) = v.parse::<usize>() {
                self.index.top_k = k;
            } else {
                tracing::warn!("ignoring invalid CODESEEK_INDEX_TOP_K value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CODESEEK_INDEX_EXTENSIONS") {
            let extensions: Vec<String> = v
                .split(',')
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty())
                .collect();
            if extensions.is_empty() {
                tracing::warn!("ignoring empty CODESEEK_INDEX_EXTENSIONS value");
            } else {
                self.index.extensions = extensions;
            }
        }
        if let Ok(v) = std::env::var("CODESEEK_INDEX_EXPLAIN_CONCURRENCY") {
            if let Ok(n) = v.parse::<usize>() {
                self.index.explain_concurrency = n;
            } else {
                tracing::warn!("ignoring invalid CODESEEK_INDEX_EXPLAIN_CONCURRENCY value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CODESEEK_TIMEOUT_LLM") {
            if let Ok(secs) = v.parse::<u64>() {
                self.timeouts.llm_seconds = secs;
            } else {
                tracing::warn!("ignoring invalid CODESEEK_TIMEOUT_LLM value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CODESEEK_TIMEOUT_EMBEDDING") {
            if let Ok(secs) = v.parse::<u64>() {
                self.timeouts.embedding_seconds = secs;
            } else {
                tracing::warn!("ignoring invalid CODESEEK_TIMEOUT_EMBEDDING value: {v}");
            }
        }
        if let Ok(v) = std::env::var("CODESEEK_MAX_RETRIES") {
            if let Ok(n) = v.parse::<u32>() {
                self.timeouts.max_retries = n;
            } else {
                tracing::warn!("ignoring invalid CODESEEK_MAX_RETRIES value: {v}");
            }
        }
    }
}
