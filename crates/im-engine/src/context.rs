//! The per-run import context.
//!
//! One [`ImportContext`] is built per run and passed by `&mut` to every
//! importer and find-or-create helper. It owns the legacy source, the
//! target writer, the tracker and the optional sample collector, so there
//! is no global state and exactly one writer of the tracker.

use im_core::{BackwardCompatibilityKey, EntityKind, Tracker};
use im_legacy::LegacySource;
use im_target::{TargetWriter, WriteOutcome};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::samples::{self, Condition, SampleCollector};

/// Run-wide settings the importers read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    /// Legacy schema name, the first key component.
    pub schema: String,
    /// ISO 639-3 code of the default language.
    pub default_language: String,
    /// Writes are suppressed.
    pub dry_run: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            schema: "mwnf3".to_owned(),
            default_language: "eng".to_owned(),
            dry_run: false,
        }
    }
}

/// How a write attempt ended once conflicts are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The record was written in this run.
    Created(Uuid),
    /// The record already existed in the target.
    Existing(Uuid),
    /// The target rejected the record.
    Failed(String),
}

impl Resolution {
    /// Target identifier, unless the write failed.
    #[must_use]
    pub const fn uuid(&self) -> Option<Uuid> {
        match self {
            Self::Created(uuid) | Self::Existing(uuid) => Some(*uuid),
            Self::Failed(_) => None,
        }
    }
}

/// Everything an importer needs for one run.
pub struct ImportContext {
    /// Read-only legacy database.
    pub source: Box<dyn LegacySource>,
    /// Target persistence strategy.
    pub writer: Box<dyn TargetWriter>,
    /// Backward-compatibility registry for this run.
    pub tracker: Tracker,
    /// Run settings.
    pub settings: ImportSettings,
    samples: Option<SampleCollector>,
}

impl std::fmt::Debug for ImportContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportContext")
            .field("writer", &self.writer.mode())
            .field("tracked", &self.tracker.len())
            .field("settings", &self.settings)
            .field("samples", &self.samples.is_some())
            .finish_non_exhaustive()
    }
}

impl ImportContext {
    /// Creates a context with an empty tracker.
    #[must_use]
    pub fn new(
        source: Box<dyn LegacySource>,
        writer: Box<dyn TargetWriter>,
        settings: ImportSettings,
    ) -> Self {
        Self {
            source,
            writer,
            tracker: Tracker::new(),
            settings,
            samples: None,
        }
    }

    /// Enables sample collection.
    #[must_use]
    pub fn with_samples(mut self, samples: SampleCollector) -> Self {
        self.samples = Some(samples);
        self
    }

    /// Target identifier of an already imported record.
    #[must_use]
    pub fn resolve(&self, kind: EntityKind, key: &BackwardCompatibilityKey) -> Option<Uuid> {
        self.tracker.get_uuid(key, kind)
    }

    /// Records a legacy row in the sample store, when collecting.
    pub async fn sample<T: Serialize + ?Sized + Sync>(
        &mut self,
        entity: &str,
        condition: Option<Condition>,
        source_table: &str,
        key: &BackwardCompatibilityKey,
        row: &T,
    ) {
        if let Some(collector) = self.samples.as_mut() {
            let category = samples::category(entity, condition);
            collector
                .record(&category, source_table, key.as_str(), row)
                .await;
        }
    }

    /// Detaches the sample collector so it can be closed.
    pub fn take_samples(&mut self) -> Option<SampleCollector> {
        self.samples.take()
    }

    /// Turns a write outcome into a resolution, registering the key.
    ///
    /// A conflict means the record exists in the target from an earlier
    /// run: it is looked up by backward-compatibility value and, for
    /// name-based kinds, by a case-insensitive scan of every record when
    /// the filtered lookup finds nothing.
    pub async fn settle(
        &mut self,
        kind: EntityKind,
        key: &BackwardCompatibilityKey,
        outcome: WriteOutcome,
    ) -> Result<Resolution, EngineError> {
        match outcome {
            WriteOutcome::Created(uuid) => {
                self.tracker.register(key, kind, uuid)?;
                Ok(Resolution::Created(uuid))
            }
            WriteOutcome::Conflict => match self.recover(kind, key).await? {
                Some(uuid) => {
                    debug!(%kind, key = %key, %uuid, "conflict resolved to existing record");
                    self.tracker.register(key, kind, uuid)?;
                    Ok(Resolution::Existing(uuid))
                }
                None => {
                    warn!(%kind, key = %key, "conflict reported but no matching record found");
                    Ok(Resolution::Failed(format!(
                        "target reported a conflict for {key} but no {kind} carries it"
                    )))
                }
            },
            WriteOutcome::Error(detail) => Ok(Resolution::Failed(detail)),
        }
    }

    async fn recover(
        &self,
        kind: EntityKind,
        key: &BackwardCompatibilityKey,
    ) -> Result<Option<Uuid>, EngineError> {
        if let Some(uuid) = self
            .writer
            .find_by_backward_compatibility(kind, key.as_str())
            .await?
        {
            return Ok(Some(uuid));
        }
        if !kind.is_name_based() {
            return Ok(None);
        }

        let wanted = key.as_str().to_lowercase();
        let found = self
            .writer
            .list_backward_compatibility(kind)
            .await?
            .into_iter()
            .find_map(|(stored, uuid)| (stored.as_str().to_lowercase() == wanted).then_some(uuid));
        Ok(found)
    }
}
