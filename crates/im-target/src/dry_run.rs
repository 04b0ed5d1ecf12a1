//! Dry-run decorator.
//!
//! Wraps a real writer: reads go through so dependency preloading and
//! conflict lookups see the real target, writes are counted and answered
//! with a placeholder identifier. The placeholder is a UUIDv5 of the
//! backward-compatibility value, so repeated dry runs agree with each
//! other.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use im_core::{BackwardCompatibilityKey, EntityKind};
use tracing::trace;
use uuid::Uuid;

use crate::error::WriteError;
use crate::fields::{
    FieldSet, NewArtist, NewAuthor, NewCollection, NewCollectionTranslation, NewContext, NewItem,
    NewItemImage, NewItemItemLink, NewItemTranslation, NewPartner, NewPartnerLogo,
    NewPartnerTranslation, NewProject, NewTag,
};
use crate::outcome::{WriteOutcome, WriteResult};
use crate::writer::TargetWriter;

/// Namespace for dry-run placeholder identifiers.
pub const PLACEHOLDER_NAMESPACE: Uuid = Uuid::from_u128(0x8f3c_1d2e_4b5a_5c6d_9e0f_a1b2_c3d4_e5f6);

/// Returns the placeholder identifier for a backward-compatibility value.
#[must_use]
pub fn placeholder(backward_compatibility: &str) -> Uuid {
    Uuid::new_v5(&PLACEHOLDER_NAMESPACE, backward_compatibility.as_bytes())
}

/// A writer that never writes.
pub struct DryRunWriter {
    inner: Box<dyn TargetWriter>,
    suppressed: AtomicU64,
}

impl DryRunWriter {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Box<dyn TargetWriter>) -> Self {
        Self {
            inner,
            suppressed: AtomicU64::new(0),
        }
    }

    fn suppress<F: FieldSet>(&self, fields: &F) -> WriteResult {
        self.suppressed.fetch_add(1, Ordering::Relaxed);
        trace!(
            kind = %F::KIND,
            backward_compatibility = fields.backward_compatibility(),
            "dry run: write suppressed"
        );
        Ok(WriteOutcome::Created(placeholder(fields.backward_compatibility())))
    }
}

impl std::fmt::Debug for DryRunWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DryRunWriter")
            .field("inner", &self.inner.mode())
            .field("suppressed", &self.suppressed.load(Ordering::Relaxed))
            .finish()
    }
}

#[async_trait]
impl TargetWriter for DryRunWriter {
    fn mode(&self) -> &'static str {
        "dry-run"
    }

    async fn ping(&self) -> Result<(), WriteError> {
        self.inner.ping().await
    }

    async fn write_context(&self, fields: &NewContext) -> WriteResult {
        self.suppress(fields)
    }

    async fn write_collection(&self, fields: &NewCollection) -> WriteResult {
        self.suppress(fields)
    }

    async fn write_collection_translation(&self, fields: &NewCollectionTranslation) -> WriteResult {
        self.suppress(fields)
    }

    async fn write_project(&self, fields: &NewProject) -> WriteResult {
        self.suppress(fields)
    }

    async fn write_partner(&self, fields: &NewPartner) -> WriteResult {
        self.suppress(fields)
    }

    async fn write_partner_translation(&self, fields: &NewPartnerTranslation) -> WriteResult {
        self.suppress(fields)
    }

    async fn write_partner_logo(&self, fields: &NewPartnerLogo) -> WriteResult {
        self.suppress(fields)
    }

    async fn write_item(&self, fields: &NewItem) -> WriteResult {
        self.suppress(fields)
    }

    async fn write_item_translation(&self, fields: &NewItemTranslation) -> WriteResult {
        self.suppress(fields)
    }

    async fn write_item_image(&self, fields: &NewItemImage) -> WriteResult {
        self.suppress(fields)
    }

    async fn write_item_item_link(&self, fields: &NewItemItemLink) -> WriteResult {
        self.suppress(fields)
    }

    async fn write_tag(&self, fields: &NewTag) -> WriteResult {
        self.suppress(fields)
    }

    async fn write_author(&self, fields: &NewAuthor) -> WriteResult {
        self.suppress(fields)
    }

    async fn write_artist(&self, fields: &NewArtist) -> WriteResult {
        self.suppress(fields)
    }

    async fn attach_item_tags(&self, _item: Uuid, tags: &[Uuid]) -> Result<(), WriteError> {
        if !tags.is_empty() {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    async fn attach_item_artists(&self, _item: Uuid, artists: &[Uuid]) -> Result<(), WriteError> {
        if !artists.is_empty() {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    async fn find_by_backward_compatibility(
        &self,
        kind: EntityKind,
        backward_compatibility: &str,
    ) -> Result<Option<Uuid>, WriteError> {
        self.inner
            .find_by_backward_compatibility(kind, backward_compatibility)
            .await
    }

    async fn list_backward_compatibility(
        &self,
        kind: EntityKind,
    ) -> Result<Vec<(BackwardCompatibilityKey, Uuid)>, WriteError> {
        self.inner.list_backward_compatibility(kind).await
    }

    fn suppressed_writes(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }
}
