//! Error types for codeseek-index.

use std::num::TryFromIntError;
use std::path::PathBuf;

/// Errors that can occur while ingesting or searching source files.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The folder given for ingestion does not exist.
    #[error("folder path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    /// A single source file could not be read as UTF-8 text.
    #[error("could not read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The model service is not reachable.
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Model provider error (embedding or generation).
    #[error("LLM error: {0}")]
    Llm(#[from] codeseek_llm::LlmError),

    /// Retrieval failed; the caller sees no results.
    #[error("search failed: {0}")]
    Search(String),

    /// `SQLite` database error.
    #[error("database error: {0}")]
    Sqlite(#[from] sqlx::Error),

    /// `SQLite` schema migration error.
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Qdrant vector store error.
    #[error("Qdrant error: {0}")]
    Qdrant(#[from] Box<qdrant_client::QdrantError>),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error outside of per-file reads.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Integer conversion error.
    #[error("integer conversion failed: {0}")]
    IntConversion(#[from] TryFromIntError),

    /// Generic catch-all error.
    #[error("{0}")]
    Other(String),
}

/// Coarse classification the presentation layer renders from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// User input problem; reprompt.
    PathNotFound,
    /// One file skipped; the run continues.
    FileRead,
    /// Model backend down or failing; soft-fail with an empty result.
    ServiceUnavailable,
    /// Retrieval failed; render as "no relevant code found".
    Search,
    /// Vector index or local I/O failure.
    Storage,
}

impl IndexError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PathNotFound(_) => ErrorKind::PathNotFound,
            Self::FileRead { .. } => ErrorKind::FileRead,
            Self::ServiceUnavailable(_) | Self::Llm(_) => ErrorKind::ServiceUnavailable,
            Self::Search(_) => ErrorKind::Search,
            Self::Sqlite(_)
            | Self::Migration(_)
            | Self::Qdrant(_)
            | Self::Json(_)
            | Self::Io(_)
            | Self::IntConversion(_)
            | Self::Other(_) => ErrorKind::Storage,
        }
    }
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
