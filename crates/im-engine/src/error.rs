//! Error types for the im-engine crate.
//!
//! [`EngineError`] is what an importer returns when it cannot continue.
//! Per-record problems never become an `EngineError`; they are recorded in
//! the importer's [`ImportResult`](im_core::ImportResult) instead.

use im_core::TrackerError;
use im_legacy::SourceError;
use im_target::WriteError;

/// Importer-level and run-level failures.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The legacy source failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The target writer failed.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// The tracker refused a registration.
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    /// The run was configured incorrectly (unknown importer, bad
    /// selection).
    #[error("configuration error: {0}")]
    Config(String),

    /// The sample store could not be prepared.
    #[error("failed to prepare sample store {path}: {detail}")]
    Samples {
        /// Sample database path.
        path: String,
        /// What went wrong.
        detail: String,
    },
}

impl EngineError {
    /// Creates a new [`EngineError::Config`] error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` for configuration errors, which are raised before
    /// any importer runs.
    #[inline]
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
