//! Folder ingestion and explained semantic search over local source files.
//!
//! Ingestion walks a folder, embeds every matching file through a local model
//! and upserts it into a persisted vector index keyed by file name. Queries
//! embed the question with the same model, fetch the nearest files and ask a
//! generative model to explain each one.

pub mod collector;
pub mod document;
pub mod embedder;
pub mod error;
pub mod explainer;
pub mod ingest;
pub mod search;
pub mod store;

pub use error::{ErrorKind, IndexError, Result};
