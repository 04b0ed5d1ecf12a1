//! The target writer seam.

use async_trait::async_trait;
use im_core::{BackwardCompatibilityKey, EntityKind};
use uuid::Uuid;

use crate::error::WriteError;
use crate::fields::{
    NewArtist, NewAuthor, NewCollection, NewCollectionTranslation, NewContext, NewItem,
    NewItemImage, NewItemItemLink, NewItemTranslation, NewPartner, NewPartnerLogo,
    NewPartnerTranslation, NewProject, NewTag,
};
use crate::outcome::{WriteOutcome, WriteResult};

/// Persistence strategy for target entities.
///
/// Write operations take fully resolved field sets and report
/// [`WriteOutcome::Conflict`] when the record already exists, leaving the
/// lookup to the caller. Infrastructure failures are returned as
/// [`WriteError`].
#[async_trait]
pub trait TargetWriter: Send + Sync {
    /// Short strategy name for logs (`api`, `database`, `dry-run`).
    fn mode(&self) -> &'static str;

    /// Checks that the target is reachable.
    async fn ping(&self) -> Result<(), WriteError>;

    /// Creates a context.
    async fn write_context(&self, fields: &NewContext) -> WriteResult;

    /// Creates a collection.
    async fn write_collection(&self, fields: &NewCollection) -> WriteResult;

    /// Creates a collection translation.
    async fn write_collection_translation(&self, fields: &NewCollectionTranslation) -> WriteResult;

    /// Creates a project.
    async fn write_project(&self, fields: &NewProject) -> WriteResult;

    /// Creates a partner.
    async fn write_partner(&self, fields: &NewPartner) -> WriteResult;

    /// Creates a partner translation.
    async fn write_partner_translation(&self, fields: &NewPartnerTranslation) -> WriteResult;

    /// Creates a partner logo.
    async fn write_partner_logo(&self, fields: &NewPartnerLogo) -> WriteResult;

    /// Creates an item.
    async fn write_item(&self, fields: &NewItem) -> WriteResult;

    /// Creates an item translation.
    async fn write_item_translation(&self, fields: &NewItemTranslation) -> WriteResult;

    /// Creates several item translations, returning one outcome per input
    /// in input order.
    ///
    /// The default writes them one at a time.
    async fn write_item_translations(
        &self,
        fields: &[NewItemTranslation],
    ) -> Result<Vec<WriteOutcome>, WriteError> {
        let mut outcomes = Vec::with_capacity(fields.len());
        for translation in fields {
            outcomes.push(self.write_item_translation(translation).await?);
        }
        Ok(outcomes)
    }

    /// Creates an item image.
    async fn write_item_image(&self, fields: &NewItemImage) -> WriteResult;

    /// Creates an item-to-item link.
    async fn write_item_item_link(&self, fields: &NewItemItemLink) -> WriteResult;

    /// Creates a tag.
    async fn write_tag(&self, fields: &NewTag) -> WriteResult;

    /// Creates an author.
    async fn write_author(&self, fields: &NewAuthor) -> WriteResult;

    /// Creates an artist.
    async fn write_artist(&self, fields: &NewArtist) -> WriteResult;

    /// Associates tags with an item. Already associated tags are ignored.
    async fn attach_item_tags(&self, item: Uuid, tags: &[Uuid]) -> Result<(), WriteError>;

    /// Associates artists with an item. Already associated artists are
    /// ignored.
    async fn attach_item_artists(&self, item: Uuid, artists: &[Uuid]) -> Result<(), WriteError>;

    /// Looks up a record by backward-compatibility value, compared
    /// case-insensitively.
    async fn find_by_backward_compatibility(
        &self,
        kind: EntityKind,
        backward_compatibility: &str,
    ) -> Result<Option<Uuid>, WriteError>;

    /// Lists every record of a kind that carries a backward-compatibility
    /// value.
    async fn list_backward_compatibility(
        &self,
        kind: EntityKind,
    ) -> Result<Vec<(BackwardCompatibilityKey, Uuid)>, WriteError>;

    /// Number of writes this writer did not forward. Zero unless the writer
    /// is a dry run.
    fn suppressed_writes(&self) -> u64 {
        0
    }
}
