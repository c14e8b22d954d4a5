//! Folder traversal: select source files by suffix and read them as text.

use std::io;
use std::path::Path;

use crate::document::SourceDocument;
use crate::error::{IndexError, Result};

/// Which files the collector picks up and how it walks.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// File name suffixes to accept, e.g. `.py`.
    pub extensions: Vec<String>,
    /// Skip files ignored by `.gitignore` / `.ignore`.
    pub respect_gitignore: bool,
    /// Descend into hidden files and directories.
    pub include_hidden: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            extensions: vec![".py".into()],
            respect_gitignore: false,
            include_hidden: true,
        }
    }
}

/// Output of one collection pass.
#[derive(Debug, Default)]
pub struct Collection {
    /// Readable files, sorted by path.
    pub documents: Vec<SourceDocument>,
    /// Files that matched but could not be read, and directories the walk
    /// could not enter.
    pub warnings: Vec<IndexError>,
}

impl Collection {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }
}

#[derive(Debug, Clone)]
pub struct FileCollector {
    config: CollectorConfig,
}

impl FileCollector {
    #[must_use]
    pub fn new(mut config: CollectorConfig) -> Self {
        config.extensions = config
            .extensions
            .iter()
            .map(|e| normalize_extension(e))
            .filter(|e| e.len() > 1)
            .collect();
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Whether a file name passes the suffix filter.
    #[must_use]
    pub fn matches(&self, file_name: &str) -> bool {
        self.config
            .extensions
            .iter()
            .any(|ext| file_name.ends_with(ext.as_str()))
    }

    /// Walk `root` recursively and read every matching file.
    ///
    /// Symlinks to files are read through the link. Unreadable files and
    /// directories are skipped and reported in [`Collection::warnings`].
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::PathNotFound`] if `root` does not exist or is not a directory.
    pub async fn collect(&self, root: &Path) -> Result<Collection> {
        if !root.is_dir() {
            return Err(IndexError::PathNotFound(root.to_path_buf()));
        }

        let walker = ignore::WalkBuilder::new(root)
            .hidden(!self.config.include_hidden)
            .git_ignore(self.config.respect_gitignore)
            .git_global(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore)
            .ignore(self.config.respect_gitignore)
            .parents(self.config.respect_gitignore)
            .build();

        let mut collection = Collection::default();
        let mut candidates = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping unreadable entry: {e}");
                    collection.warnings.push(walk_warning(root, &e));
                    continue;
                }
            };
            let is_dir = entry.file_type().is_none_or(|ft| ft.is_dir());
            if !is_dir
                && entry.path().is_file()
                && self.matches(&entry.file_name().to_string_lossy())
            {
                candidates.push(entry.into_path());
            }
        }
        candidates.sort();

        for path in candidates {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            match tokio::fs::read_to_string(&path).await {
                Ok(content) => collection.documents.push(SourceDocument {
                    name,
                    path,
                    content,
                }),
                Err(source) => {
                    tracing::warn!(file = %path.display(), "could not read {name}: {source}");
                    collection
                        .warnings
                        .push(IndexError::FileRead { path, source });
                }
            }
        }

        tracing::debug!(
            root = %root.display(),
            found = collection.documents.len(),
            unreadable = collection.warnings.len(),
            "collection finished"
        );
        Ok(collection)
    }
}

fn walk_warning(root: &Path, err: &ignore::Error) -> IndexError {
    let (path, leaf) = walk_error_parts(err);
    let kind = leaf.io_error().map_or(io::ErrorKind::Other, io::Error::kind);
    IndexError::FileRead {
        path: path.unwrap_or(root).to_path_buf(),
        source: io::Error::new(kind, leaf.to_string()),
    }
}

/// Innermost path and error of a walk error, skipping depth and line wrappers.
fn walk_error_parts(err: &ignore::Error) -> (Option<&Path>, &ignore::Error) {
    match err {
        ignore::Error::WithPath { path, err } => {
            let (inner, leaf) = walk_error_parts(err);
            (inner.or(Some(path.as_path())), leaf)
        }
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            walk_error_parts(err)
        }
        other => (None, other),
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim();
    if ext.starts_with('.') {
        ext.to_owned()
    } else {
        format!(".{ext}")
    }
}
