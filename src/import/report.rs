//! Per-file import outcomes and the batch report.

use std::fmt;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use chrono::{DateTime, Utc};
use serde::Serialize;
use yansi::Paint;

use crate::scanner::ContentKey;

/// Why a source file was not copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Sidecar or metadata format; never hashed.
    IgnoredExtension,
    /// Content was accepted in an earlier review.
    AlreadyAccepted,
    /// Content was rejected in an earlier review.
    AlreadyRejected,
    /// Identical content is already waiting in the inbox.
    AlreadyStaged,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::IgnoredExtension => "ignored extension",
            Self::AlreadyAccepted => "already accepted",
            Self::AlreadyRejected => "already rejected",
            Self::AlreadyStaged => "already staged",
        };
        f.write_str(text)
    }
}

/// What happened to one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportOutcome {
    /// Copied into the inbox.
    Copied {
        key: ContentKey,
        target: PathBuf,
        bytes: u64,
    },
    /// Skipped without copying.
    Ignored {
        reason: IgnoreReason,
        #[serde(skip_serializing_if = "Option::is_none")]
        key: Option<ContentKey>,
    },
    /// Could not be read or copied.
    Failed { error: String },
}

/// One line of the import report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportEntry {
    pub source: PathBuf,
    #[serde(flatten)]
    pub outcome: ImportOutcome,
}

impl ImportEntry {
    #[must_use]
    pub fn new(source: &Path, outcome: ImportOutcome) -> Self {
        Self {
            source: source.to_path_buf(),
            outcome,
        }
    }

    /// Console form, e.g. `+ Copied:  a.jpg -> .airlock/<key>.jpg`.
    #[must_use]
    pub fn console_line(&self) -> String {
        let source = self.source.display();
        match &self.outcome {
            ImportOutcome::Copied { target, .. } => {
                format!("{} {} -> {}", "+ Copied: ".green(), source, target.display())
            }
            ImportOutcome::Ignored { reason, .. } => {
                format!("{} {} ({})", "- Ignored:".yellow(), source, reason)
            }
            ImportOutcome::Failed { error } => {
                format!("{} {}: {}", "! Failed: ".red(), source, error)
            }
        }
    }
}

/// Result of importing one source tree.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub source: PathBuf,
    pub started_at: DateTime<Utc>,
    pub entries: Vec<ImportEntry>,
}

impl ImportReport {
    #[must_use]
    pub fn new(source: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            started_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: ImportEntry) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn copied_count(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::Copied { .. }))
    }

    #[must_use]
    pub fn ignored_count(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::Ignored { .. }))
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, ImportOutcome::Failed { .. }))
    }

    /// Total bytes written into the inbox.
    #[must_use]
    pub fn bytes_copied(&self) -> u64 {
        self.entries
            .iter()
            .filter_map(|e| match e.outcome {
                ImportOutcome::Copied { bytes, .. } => Some(bytes),
                _ => None,
            })
            .sum()
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }

    /// Human-readable summary of the batch.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} copied ({}), {} ignored, {} failed",
            self.copied_count(),
            ByteSize::b(self.bytes_copied()),
            self.ignored_count(),
            self.failed_count()
        )
    }

    fn count(&self, pred: impl Fn(&ImportOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}
