//! The importers, in declared order.
//!
//! Every importer follows the same per-record discipline:
//!
//! 1. transform the legacy group into a plan (pure)
//! 2. resolve its dependencies from the tracker, skipping with a warning
//!    when one was never imported
//! 3. write it and settle the outcome (conflicts become lookups), or count
//!    it as skipped when the tracker already knows its key
//! 4. write its children, each guarded by its own key, whether the record
//!    was just created or came from an earlier run
//!
//! A rejected record is an error in the result and the loop moves on.
//! Only infrastructure failures leave the loop.

mod item;
mod link;
mod partner;
mod picture;
mod project;

use im_core::{BackwardCompatibilityKey, EntityKind, ImportResult};
use im_target::{WriteError, WriteOutcome};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

pub use item::{MonumentImporter, ObjectImporter};
pub use link::LinkImporter;
pub use partner::{InstitutionImporter, MuseumImporter};
pub use picture::PictureImporter;
pub use project::ProjectImporter;

use crate::context::{ImportContext, Resolution};
use crate::error::EngineError;
use crate::importer::Importer;
use crate::samples::Condition;
use crate::transform::{Notes, Skip};

/// Every importer, in the order they must run.
#[must_use]
pub fn registry() -> Vec<Box<dyn Importer>> {
    use im_legacy::{LinkTable, PictureTable};

    vec![
        Box::new(ProjectImporter),
        Box::new(MuseumImporter),
        Box::new(InstitutionImporter),
        Box::new(ObjectImporter),
        Box::new(MonumentImporter),
        Box::new(PictureImporter::new(PictureTable::Objects)),
        Box::new(PictureImporter::new(PictureTable::Monuments)),
        Box::new(LinkImporter::new(LinkTable::ObjectObject)),
        Box::new(LinkImporter::new(LinkTable::ObjectMonument)),
    ]
}

/// Copies transformer notes into the result and the sample store.
async fn absorb<T: Serialize + ?Sized + Sync>(
    ctx: &mut ImportContext,
    result: &mut ImportResult,
    entity: &str,
    table: &str,
    key: &BackwardCompatibilityKey,
    rows: &T,
    notes: &Notes,
) {
    for warning in &notes.warnings {
        result.warn(Some(key.as_str()), warning.as_str());
    }
    for condition in &notes.conditions {
        ctx.sample(entity, Some(*condition), table, key, rows).await;
    }
}

/// Counts a group the transformer refused.
async fn skip_group<T: Serialize + ?Sized + Sync>(
    ctx: &mut ImportContext,
    result: &mut ImportResult,
    entity: &str,
    table: &str,
    key: &BackwardCompatibilityKey,
    rows: &T,
    skip: Skip,
) {
    warn!(importer = entity, key = %key, reason = %skip.0, "record skipped");
    result.warn(Some(key.as_str()), skip.0);
    result.record_skipped();
    ctx.sample(entity, Some(Condition::MissingDependency), table, key, rows)
        .await;
}

/// Resolves a dependency or explains why it is missing.
fn require(
    ctx: &ImportContext,
    kind: EntityKind,
    key: &BackwardCompatibilityKey,
) -> Result<Uuid, Skip> {
    ctx.resolve(kind, key)
        .ok_or_else(|| Skip(format!("missing {kind} {key}")))
}

/// Counts the outcome of a top-level write. Returns the identifier when
/// children should be written.
fn count(
    result: &mut ImportResult,
    key: &BackwardCompatibilityKey,
    resolution: Resolution,
) -> Option<Uuid> {
    match resolution {
        Resolution::Created(uuid) => {
            result.record_imported();
            Some(uuid)
        }
        Resolution::Existing(uuid) => {
            debug!(key = %key, "record already in target");
            result.record_skipped();
            Some(uuid)
        }
        Resolution::Failed(detail) => {
            warn!(key = %key, %detail, "record rejected");
            result.error(Some(key.as_str()), detail);
            None
        }
    }
}

/// Settles the outcome of a child write, recording a rejection as an error.
async fn settle_child(
    ctx: &mut ImportContext,
    result: &mut ImportResult,
    kind: EntityKind,
    key: &BackwardCompatibilityKey,
    outcome: WriteOutcome,
) -> Result<Option<Uuid>, EngineError> {
    let resolution = ctx.settle(kind, key, outcome).await?;
    if let Resolution::Failed(detail) = &resolution {
        warn!(%kind, key = %key, %detail, "child record rejected");
        result.error(Some(key.as_str()), format!("{kind}: {detail}"));
    }
    Ok(resolution.uuid())
}

/// Records a recoverable writer error against a record and propagates the
/// rest.
fn recover(
    result: &mut ImportResult,
    key: &BackwardCompatibilityKey,
    error: WriteError,
) -> Result<(), EngineError> {
    if error.is_recoverable() {
        result.error(Some(key.as_str()), error.to_string());
        Ok(())
    } else {
        Err(error.into())
    }
}
