//! Per-importer result type.
//!
//! Every importer returns an [`ImportResult`]. Per-record problems are
//! converted into [`ImportIssue`] entries identified by the record's
//! backward-compatibility key and never escape the per-record loop.

use serde::{Deserialize, Serialize};

/// A warning or error attached to an import run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportIssue {
    /// Backward-compatibility key of the affected record, if any.
    pub key: Option<String>,
    /// Human-readable description.
    pub message: String,
}

impl ImportIssue {
    /// Creates a new issue.
    pub fn new(key: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            key: key.map(ToOwned::to_owned),
            message: message.into(),
        }
    }
}

/// Outcome counters and issues for one importer invocation.
///
/// # Examples
///
/// ```
/// use im_core::ImportResult;
///
/// let mut result = ImportResult::new();
/// result.record_imported();
/// result.warn(Some("mwnf3:projects:P1"), "launch date unparseable");
/// assert!(result.success);
/// assert_eq!(result.imported, 1);
///
/// result.error(Some("mwnf3:projects:P2"), "rejected by target");
/// assert!(!result.success);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    /// `false` as soon as one error is recorded.
    pub success: bool,
    /// Records written to the target in this run.
    pub imported: u64,
    /// Records already present or skipped for a missing dependency.
    pub skipped: u64,
    /// Errors, one per failed record or importer-level failure.
    pub errors: Vec<ImportIssue>,
    /// Non-fatal data-quality and dependency warnings.
    pub warnings: Vec<ImportIssue>,
}

impl Default for ImportResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportResult {
    /// Creates an empty, successful result.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            success: true,
            imported: 0,
            skipped: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Creates a failed result carrying a single importer-level error.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        let mut result = Self::new();
        result.error(None, message);
        result
    }

    /// Counts one written record.
    #[inline]
    pub fn record_imported(&mut self) {
        self.imported += 1;
    }

    /// Counts one skipped record.
    #[inline]
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Records a warning.
    pub fn warn(&mut self, key: Option<&str>, message: impl Into<String>) {
        self.warnings.push(ImportIssue::new(key, message));
    }

    /// Records an error and marks the result unsuccessful.
    pub fn error(&mut self, key: Option<&str>, message: impl Into<String>) {
        self.errors.push(ImportIssue::new(key, message));
        self.success = false;
    }

    /// Returns `true` if any error was recorded.
    #[inline]
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Total number of records seen (imported plus skipped).
    #[inline]
    #[must_use]
    pub const fn processed(&self) -> u64 {
        self.imported + self.skipped
    }

    /// Folds another result into this one.
    pub fn merge(&mut self, other: Self) {
        self.success &= other.success;
        self.imported += other.imported;
        self.skipped += other.skipped;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}
