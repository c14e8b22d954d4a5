use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointId, PointStruct, ScoredPoint, ScrollPointsBuilder,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder, value::Kind,
};

use super::{BoxFuture, Candidate, VectorIndex, rank};
use crate::document::{IndexEntry, Metadata, SearchMatch};
use crate::error::{IndexError, Result};

pub const DEFAULT_COLLECTION: &str = "codebase";

/// Qdrant-backed index. Point ids are UUIDv5 of the file name so that
/// re-ingesting a file replaces its point.
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
    ready: AtomicBool,
}

impl std::fmt::Debug for QdrantIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantIndex")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

fn boxed(e: qdrant_client::QdrantError) -> IndexError {
    IndexError::Qdrant(Box::new(e))
}

impl QdrantIndex {
    /// # Errors
    ///
    /// Returns an error if the Qdrant client cannot be created.
    pub fn new(url: &str, collection: &str) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(boxed)?;
        Ok(Self {
            client,
            collection: collection.to_owned(),
            ready: AtomicBool::new(false),
        })
    }

    /// Create the collection with cosine distance if it does not exist yet.
    async fn ensure_collection(&self, vector_size: u64) -> Result<()> {
        if self.ready.load(Ordering::Acquire) {
            return Ok(());
        }
        if !self.collection_exists().await? {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection)
                        .vectors_config(VectorParamsBuilder::new(vector_size, Distance::Cosine)),
                )
                .await
                .map_err(boxed)?;
            tracing::info!(collection = %self.collection, vector_size, "created Qdrant collection");
        }
        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    async fn collection_exists(&self) -> Result<bool> {
        self.client
            .collection_exists(&self.collection)
            .await
            .map_err(boxed)
    }

    async fn upsert_entry(&self, entry: IndexEntry) -> Result<()> {
        self.ensure_collection(u64::try_from(entry.embedding.len())?)
            .await?;

        let payload: HashMap<String, qdrant_client::qdrant::Value> =
            serde_json::from_value(serde_json::json!({
                "id": entry.id,
                "document": entry.document,
                "metadata": serde_json::to_string(&entry.metadata)?,
            }))?;

        self.client
            .upsert_points(
                UpsertPointsBuilder::new(
                    &self.collection,
                    vec![PointStruct::new(point_id(&entry.id), entry.embedding, payload)],
                )
                .wait(true),
            )
            .await
            .map_err(boxed)?;
        Ok(())
    }

    async fn search_entries(&self, vector: Vec<f32>, limit: usize) -> Result<Vec<SearchMatch>> {
        if !self.collection_exists().await? {
            return Ok(Vec::new());
        }
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, vector, u64::try_from(limit)?)
                    .with_payload(true),
            )
            .await
            .map_err(boxed)?;

        let candidates = response
            .result
            .iter()
            .filter_map(candidate_from_scored_point)
            .collect();
        Ok(rank(candidates, limit))
    }

    async fn all_ids(&self) -> Result<Vec<String>> {
        if !self.collection_exists().await? {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        let mut offset: Option<PointId> = None;

        loop {
            let mut builder = ScrollPointsBuilder::new(&self.collection)
                .with_payload(true)
                .with_vectors(false)
                .limit(100);
            if let Some(ref off) = offset {
                builder = builder.offset(off.clone());
            }

            let response = self.client.scroll(builder).await.map_err(boxed)?;
            for point in &response.result {
                if let Some(Kind::StringValue(id)) =
                    point.payload.get("id").and_then(|v| v.kind.as_ref())
                {
                    ids.push(id.clone());
                }
            }

            match response.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        ids.sort();
        Ok(ids)
    }

    async fn drop_collection(&self) -> Result<()> {
        if self.collection_exists().await? {
            self.client
                .delete_collection(&self.collection)
                .await
                .map_err(boxed)?;
        }
        self.ready.store(false, Ordering::Release);
        Ok(())
    }
}

impl VectorIndex for QdrantIndex {
    fn upsert(&self, entry: IndexEntry) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.upsert_entry(entry))
    }

    fn search(&self, vector: Vec<f32>, limit: usize) -> BoxFuture<'_, Result<Vec<SearchMatch>>> {
        Box::pin(self.search_entries(vector, limit))
    }

    fn ids(&self) -> BoxFuture<'_, Result<Vec<String>>> {
        Box::pin(self.all_ids())
    }

    fn count(&self) -> BoxFuture<'_, Result<usize>> {
        Box::pin(async move { Ok(self.all_ids().await?.len()) })
    }

    fn clear(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.drop_collection())
    }

    fn name(&self) -> &'static str {
        "qdrant"
    }
}

fn point_id(id: &str) -> String {
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, id.as_bytes()).to_string()
}

fn candidate_from_scored_point(point: &ScoredPoint) -> Option<Candidate> {
    let get_str = |key: &str| {
        point
            .payload
            .get(key)
            .and_then(qdrant_client::qdrant::Value::as_str)
            .cloned()
    };

    let metadata: Metadata = get_str("metadata")
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default();

    Some(Candidate {
        id: get_str("id")?,
        document: get_str("document")?,
        metadata,
        score: point.score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_id_is_stable_per_file_name() {
        assert_eq!(point_id("a.py"), point_id("a.py"));
        assert_ne!(point_id("a.py"), point_id("b.py"));
        assert!(uuid::Uuid::parse_str(&point_id("a.py")).is_ok());
    }

    #[test]
    fn new_accepts_url_without_connecting() {
        let index = QdrantIndex::new("http://127.0.0.1:6334", DEFAULT_COLLECTION).unwrap();
        assert_eq!(index.name(), "qdrant");
        assert!(format!("{index:?}").contains("codebase"));
    }
}
