//! Ingestion orchestrator: collect → embed → upsert.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use codeseek_llm::{LlmError, LlmProvider};
use tokio::sync::mpsc::UnboundedSender;

use crate::collector::FileCollector;
use crate::document::{IndexEntry, SourceDocument};
use crate::embedder::EmbeddingClient;
use crate::error::{ErrorKind, IndexError, Result};
use crate::store::VectorIndex;

/// Where an ingestion run currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestPhase {
    Collecting,
    Indexing {
        current: usize,
        total: usize,
        file: String,
    },
    Done,
}

pub type PhaseTx = UnboundedSender<IngestPhase>;

/// A document that did not make it into the index.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub name: String,
    pub kind: ErrorKind,
    pub reason: String,
}

/// Summary of an ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Readable files matching the suffix filter.
    pub files_found: usize,
    pub files_indexed: usize,
    pub skipped: Vec<SkippedFile>,
    /// Matching files that could not be read.
    pub read_warnings: Vec<String>,
    pub duration_ms: u64,
}

impl IngestReport {
    /// Nothing qualified for indexing.
    #[must_use]
    pub fn no_files(&self) -> bool {
        self.files_found == 0
    }
}

pub struct IngestionPipeline<P> {
    collector: FileCollector,
    embedder: EmbeddingClient<P>,
    index: Arc<dyn VectorIndex>,
    phase_tx: Option<PhaseTx>,
}

impl<P: LlmProvider> IngestionPipeline<P> {
    #[must_use]
    pub fn new(
        collector: FileCollector,
        embedder: EmbeddingClient<P>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            collector,
            embedder,
            index,
            phase_tx: None,
        }
    }

    pub fn set_phase_tx(&mut self, tx: PhaseTx) {
        self.phase_tx = Some(tx);
    }

    fn emit(&self, phase: IngestPhase) {
        if let Some(tx) = &self.phase_tx {
            let _ = tx.send(phase);
        }
    }

    /// Index every matching file under `root`.
    ///
    /// Documents whose embedding fails or comes back empty are skipped and
    /// listed in the report; the run itself still succeeds. Entries written
    /// before a failure stay in the index.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::PathNotFound`] if `root` is not an existing directory.
    pub async fn run(&self, root: &Path) -> Result<IngestReport> {
        let start = std::time::Instant::now();
        let mut report = IngestReport::default();

        self.emit(IngestPhase::Collecting);
        let collection = self.collector.collect(root).await?;
        report.read_warnings = collection.warnings.iter().map(ToString::to_string).collect();
        report.files_found = collection.documents.len();

        if collection.is_empty() {
            tracing::warn!(root = %root.display(), "no source files found");
            self.emit(IngestPhase::Done);
            report.duration_ms = elapsed_ms(start);
            return Ok(report);
        }

        let total = collection.documents.len();
        tracing::info!(total, backend = self.index.name(), "indexing started");

        let mut seen: HashSet<&str> = HashSet::new();
        for (i, doc) in collection.documents.iter().enumerate() {
            if !seen.insert(doc.name.as_str()) {
                tracing::warn!(
                    file = %doc.path.display(),
                    "duplicate file name {}, replacing the earlier entry",
                    doc.name
                );
            }
            self.emit(IngestPhase::Indexing {
                current: i + 1,
                total,
                file: doc.name.clone(),
            });

            match self.index_document(doc).await {
                Ok(()) => {
                    report.files_indexed += 1;
                    tracing::info!(
                        file = %doc.name,
                        progress = format_args!("{}/{total}", i + 1),
                        "indexed"
                    );
                }
                Err(e) => {
                    tracing::warn!(file = %doc.name, "skipped: {e}");
                    report.skipped.push(SkippedFile {
                        name: doc.name.clone(),
                        kind: e.kind(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.emit(IngestPhase::Done);
        report.duration_ms = elapsed_ms(start);
        tracing::info!(
            indexed = report.files_indexed,
            skipped = report.skipped.len(),
            duration_ms = report.duration_ms,
            "indexing finished"
        );
        Ok(report)
    }

    async fn index_document(&self, doc: &SourceDocument) -> Result<()> {
        let embedding = self.embedder.try_embed(&doc.content).await?;
        if embedding.is_empty() {
            return Err(IndexError::Llm(LlmError::EmptyResponse {
                provider: "embedding service",
            }));
        }
        self.index
            .upsert(IndexEntry::for_document(doc, embedding))
            .await
    }
}

fn elapsed_ms(start: std::time::Instant) -> u64 {
    start.elapsed().as_millis().try_into().unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use codeseek_llm::mock::MockProvider;

    use super::*;
    use crate::collector::CollectorConfig;
    use crate::store::InMemoryIndex;

    fn pipeline(provider: MockProvider, index: Arc<InMemoryIndex>) -> IngestionPipeline<MockProvider> {
        IngestionPipeline::new(
            FileCollector::new(CollectorConfig::default()),
            EmbeddingClient::new(Arc::new(provider)),
            index,
        )
    }

    #[test]
    fn report_defaults() {
        let report = IngestReport::default();
        assert!(report.no_files());
        assert!(report.skipped.is_empty());
    }

    #[tokio::test]
    async fn empty_folder_leaves_index_untouched() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "not code").unwrap();
        let index = Arc::new(InMemoryIndex::new());
        let provider = MockProvider::default();

        let report = pipeline(provider.clone(), Arc::clone(&index))
            .run(dir.path())
            .await
            .unwrap();

        assert!(report.no_files());
        assert_eq!(index.count().await.unwrap(), 0);
        assert_eq!(provider.embed_calls(), 0);
    }

    #[tokio::test]
    async fn empty_embedding_skips_document() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "print(1)").unwrap();
        fs::write(dir.path().join("b.py"), "print(2)").unwrap();
        let provider = MockProvider::default()
            .with_embedding("print(1)", vec![1.0, 0.0])
            .with_embedding("print(2)", vec![]);
        let index = Arc::new(InMemoryIndex::new());

        let report = pipeline(provider, Arc::clone(&index))
            .run(dir.path())
            .await
            .unwrap();

        assert_eq!(report.files_found, 2);
        assert_eq!(report.files_indexed, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].name, "b.py");
        assert_eq!(report.skipped[0].kind, ErrorKind::ServiceUnavailable);
        assert_eq!(index.ids().await.unwrap(), ["a.py"]);
    }

    #[tokio::test]
    async fn missing_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(InMemoryIndex::new());
        let err = pipeline(MockProvider::default(), index)
            .run(&dir.path().join("gone"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathNotFound);
    }

    #[tokio::test]
    async fn phases_are_reported_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "print(1)").unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut p = pipeline(MockProvider::default(), Arc::new(InMemoryIndex::new()));
        p.set_phase_tx(tx);

        p.run(dir.path()).await.unwrap();
        drop(p);

        let mut phases = Vec::new();
        while let Some(phase) = rx.recv().await {
            phases.push(phase);
        }
        assert_eq!(
            phases,
            [
                IngestPhase::Collecting,
                IngestPhase::Indexing {
                    current: 1,
                    total: 1,
                    file: "a.py".into(),
                },
                IngestPhase::Done,
            ]
        );
    }

    #[tokio::test]
    async fn unreadable_files_become_warnings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ok.py"), "x = 1").unwrap();
        fs::write(dir.path().join("bad.py"), [0xff, 0xfe]).unwrap();
        let index = Arc::new(InMemoryIndex::new());

        let report = pipeline(MockProvider::default(), Arc::clone(&index))
            .run(dir.path())
            .await
            .unwrap();

        assert_eq!(report.files_found, 1);
        assert_eq!(report.read_warnings.len(), 1);
        assert!(report.read_warnings[0].contains("bad.py"));
        assert_eq!(index.ids().await.unwrap(), ["ok.py"]);
    }
}
