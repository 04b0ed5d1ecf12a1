//! The importer seam.

use async_trait::async_trait;
use im_core::{EntityKind, ImportResult};

use crate::context::ImportContext;
use crate::error::EngineError;

/// One phase of the migration, responsible for one legacy table or entity
/// family.
///
/// `import` returns `Err` only for failures that leave the tracker in
/// doubt, such as an unreachable source or target. Everything that
/// concerns a single record ends up in the returned [`ImportResult`].
#[async_trait]
pub trait Importer: Send + Sync {
    /// Key used by `--only`, `--start-at` and `--stop-at`.
    fn key(&self) -> &'static str;

    /// One-line description for `--list-importers`.
    fn description(&self) -> &'static str;

    /// Kinds created by earlier phases that this importer resolves.
    fn dependencies(&self) -> &'static [EntityKind];

    /// Kinds this importer writes. Existing records of these kinds are
    /// loaded before the importer runs so that a rerun skips them without
    /// a round trip.
    fn creates(&self) -> &'static [EntityKind];

    /// Imports every record.
    async fn import(&self, ctx: &mut ImportContext) -> Result<ImportResult, EngineError>;
}
