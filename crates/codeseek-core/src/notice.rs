//! User-facing notices derived from pipeline outcomes.
//!
//! Pipelines return `Result`s and reports; this module decides how each
//! outcome reads to the person at the terminal.

use codeseek_index::ingest::IngestReport;
use codeseek_index::search::SearchResults;
use codeseek_index::{ErrorKind, IndexError};

pub const PATH_NOT_FOUND: &str = "Folder path does not exist!";
pub const NO_FILES: &str = "No source files found!";
pub const INDEXED: &str = "Code files successfully indexed!";
pub const NO_RESULTS: &str = "No relevant code found!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Warning,
    Error,
}

impl Level {
    #[must_use]
    pub fn for_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::FileRead => Self::Warning,
            ErrorKind::PathNotFound
            | ErrorKind::ServiceUnavailable
            | ErrorKind::Search
            | ErrorKind::Storage => Self::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Level::Success, message)
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    #[must_use]
    pub fn from_error(err: &IndexError) -> Self {
        let level = Level::for_kind(err.kind());
        match err {
            IndexError::PathNotFound(_) => Self::new(level, PATH_NOT_FOUND),
            other => Self::new(level, other.to_string()),
        }
    }

    /// Notices for a finished ingestion run, in display order.
    ///
    /// Skipped files sharing the same failure are folded into one notice.
    #[must_use]
    pub fn for_ingest(report: &IngestReport) -> Vec<Self> {
        let mut notices: Vec<Self> = report
            .read_warnings
            .iter()
            .map(|w| Self::warning(w.clone()))
            .collect();

        if report.no_files() {
            notices.push(Self::warning(NO_FILES));
            return notices;
        }

        let mut groups: Vec<(&str, ErrorKind, Vec<&str>)> = Vec::new();
        for skipped in &report.skipped {
            if let Some(group) = groups.iter_mut().find(|g| g.0 == skipped.reason) {
                group.2.push(skipped.name.as_str());
            } else {
                groups.push((
                    skipped.reason.as_str(),
                    skipped.kind,
                    vec![skipped.name.as_str()],
                ));
            }
        }
        for (reason, kind, names) in groups {
            notices.push(Self::new(
                Level::for_kind(kind),
                format!("{reason} (skipped: {})", names.join(", ")),
            ));
        }

        notices.push(Self::success(INDEXED));
        notices
    }

    /// Warning shown instead of results when a search found nothing.
    #[must_use]
    pub fn for_search(results: &SearchResults) -> Option<Self> {
        results.is_empty().then(|| Self::warning(NO_RESULTS))
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
