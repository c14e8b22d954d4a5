use std::path::Path;
use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use super::{BoxFuture, Candidate, VectorIndex, cosine_similarity, rank};
use crate::document::{IndexEntry, Metadata, SearchMatch};
use crate::error::Result;

/// On-disk index: one `SQLite` row per file, exact cosine scan on query.
#[derive(Debug, Clone)]
pub struct SqliteIndex {
    pool: SqlitePool,
}

impl SqliteIndex {
    /// Open (or create) the database at `path` and run migrations.
    ///
    /// Missing parent directories are created. `:memory:` opens a private
    /// in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory, database or schema cannot be created.
    pub async fn open(path: &str) -> Result<Self> {
        let in_memory = path == ":memory:";
        let url = if in_memory {
            "sqlite::memory:".to_string()
        } else {
            if let Some(parent) = Path::new(path).parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            format!("sqlite:{path}?mode=rwc")
        };

        let opts = SqliteConnectOptions::from_str(&url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        // Every in-memory connection is its own database.
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 4 })
            .connect_with(opts)
            .await?;

        sqlx::migrate!().run(&pool).await?;
        tracing::debug!(path, "sqlite index opened");

        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn upsert_entry(&self, entry: IndexEntry) -> Result<()> {
        let metadata = serde_json::to_string(&entry.metadata)?;
        let dimension = i64::try_from(entry.embedding.len())?;

        sqlx::query(
            "INSERT INTO documents (id, document, metadata, embedding, dimension, updated_at) \
             VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP) \
             ON CONFLICT(id) DO UPDATE SET \
             document = excluded.document, \
             metadata = excluded.metadata, \
             embedding = excluded.embedding, \
             dimension = excluded.dimension, \
             updated_at = excluded.updated_at",
        )
        .bind(&entry.id)
        .bind(&entry.document)
        .bind(metadata)
        .bind(encode_embedding(&entry.embedding))
        .bind(dimension)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn search_entries(&self, vector: Vec<f32>, limit: usize) -> Result<Vec<SearchMatch>> {
        let dimension = i64::try_from(vector.len())?;
        let rows: Vec<(String, String, String, Vec<u8>)> = sqlx::query_as(
            "SELECT id, document, metadata, embedding FROM documents WHERE dimension = ?",
        )
        .bind(dimension)
        .fetch_all(&self.pool)
        .await?;

        let mut candidates = Vec::with_capacity(rows.len());
        for (id, document, metadata, blob) in rows {
            let metadata: Metadata = serde_json::from_str(&metadata)?;
            let stored = decode_embedding(&blob);
            candidates.push(Candidate {
                score: cosine_similarity(&vector, &stored),
                id,
                document,
                metadata,
            });
        }

        Ok(rank(candidates, limit))
    }
}

impl VectorIndex for SqliteIndex {
    fn upsert(&self, entry: IndexEntry) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.upsert_entry(entry))
    }

    fn search(&self, vector: Vec<f32>, limit: usize) -> BoxFuture<'_, Result<Vec<SearchMatch>>> {
        Box::pin(self.search_entries(vector, limit))
    }

    fn ids(&self) -> BoxFuture<'_, Result<Vec<String>>> {
        Box::pin(async move {
            let rows: Vec<(String,)> = sqlx::query_as("SELECT id FROM documents ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
            Ok(rows.into_iter().map(|(id,)| id).collect())
        })
    }

    fn count(&self) -> BoxFuture<'_, Result<usize>> {
        Box::pin(async move {
            let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents")
                .fetch_one(&self.pool)
                .await?;
            Ok(usize::try_from(n)?)
        })
    }

    fn clear(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            sqlx::query("DELETE FROM documents")
                .execute(&self.pool)
                .await?;
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

/// Little-endian `f32` packing used for the `embedding` column.
fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::document::{SourceDocument, file_metadata};

    fn entry(name: &str, content: &str, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry::for_document(
            &SourceDocument {
                name: name.into(),
                path: name.into(),
                content: content.into(),
            },
            embedding,
        )
    }

    #[tokio::test]
    async fn upsert_is_idempotent_per_id() {
        let index = SqliteIndex::open(":memory:").await.unwrap();
        index.upsert(entry("a.py", "print(1)", vec![1.0, 0.0])).await.unwrap();
        index.upsert(entry("a.py", "print(1)", vec![1.0, 0.0])).await.unwrap();
        index.upsert(entry("b.py", "print(2)", vec![0.0, 1.0])).await.unwrap();

        assert_eq!(index.count().await.unwrap(), 2);
        assert_eq!(index.ids().await.unwrap(), ["a.py", "b.py"]);
    }

    #[tokio::test]
    async fn upsert_overwrites_document_and_vector() {
        let index = SqliteIndex::open(":memory:").await.unwrap();
        index.upsert(entry("a.py", "old", vec![1.0, 0.0])).await.unwrap();
        index.upsert(entry("a.py", "new", vec![0.0, 1.0])).await.unwrap();

        let hits = index.search(vec![0.0, 1.0], 3).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document, "new");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn search_ranks_by_similarity_and_keeps_metadata() {
        let index = SqliteIndex::open(":memory:").await.unwrap();
        index.upsert(entry("a.py", "print(1)", vec![1.0, 0.0, 0.0])).await.unwrap();
        index.upsert(entry("b.py", "print(2)", vec![0.0, 1.0, 0.0])).await.unwrap();
        index.upsert(entry("c.py", "print(3)", vec![0.7, 0.7, 0.0])).await.unwrap();
        index.upsert(entry("d.py", "print(4)", vec![0.0, 0.0, 1.0])).await.unwrap();

        let hits = index.search(vec![1.0, 0.1, 0.0], 3).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, ["a.py", "c.py", "b.py"]);
        assert_eq!(hits[0].metadata, file_metadata("a.py"));
        assert_eq!(hits[0].rank, 0);
        assert_eq!(hits[2].rank, 2);
    }

    #[tokio::test]
    async fn search_on_empty_index_is_empty() {
        let index = SqliteIndex::open(":memory:").await.unwrap();
        assert!(index.search(vec![1.0], 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/index.db");
        let path = path.to_str().unwrap();

        {
            let index = SqliteIndex::open(path).await.unwrap();
            index.upsert(entry("a.py", "print(1)", vec![1.0, 0.0])).await.unwrap();
            index.pool().close().await;
        }

        let reopened = SqliteIndex::open(path).await.unwrap();
        assert_eq!(reopened.ids().await.unwrap(), ["a.py"]);
        let hits = reopened.search(vec![1.0, 0.0], 1).await.unwrap();
        assert_eq!(hits[0].document, "print(1)");
    }

    #[tokio::test]
    async fn clear_removes_all_rows() {
        let index = SqliteIndex::open(":memory:").await.unwrap();
        index.upsert(entry("a.py", "x", vec![1.0])).await.unwrap();
        index.clear().await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[test]
    fn embedding_blob_layout_is_little_endian() {
        let blob = encode_embedding(&[1.0]);
        assert_eq!(blob, 1.0f32.to_le_bytes());
        assert!(decode_embedding(&[0, 0]).is_empty());
    }

    proptest! {
        #[test]
        fn embedding_blob_preserves_values(v in proptest::collection::vec(-1.0e6f32..1.0e6, 0..64)) {
            prop_assert_eq!(decode_embedding(&encode_embedding(&v)), v);
        }
    }
}
