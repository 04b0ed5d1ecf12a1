//! Find-or-create helpers for shared reference entities.
//!
//! Tags, authors, artists and partners named in free text have no legacy
//! identifier. They are keyed by a normalised name, so two values that
//! differ only in letter case or spacing resolve to the same record, and
//! each is created at most once per run. The stored display name keeps the
//! casing of the first occurrence.

use im_core::normalize::display_name;
use im_core::{BackwardCompatibilityKey, EntityKind};
use im_target::{
    NewArtist, NewAuthor, NewPartner, NewTag, PartnerType, TagCategory, WriteResult,
};
use tracing::trace;
use uuid::Uuid;

use crate::context::{ImportContext, Resolution};
use crate::error::EngineError;
use crate::transform::ArtistPlan;

/// A shared record to create when the tracker does not know it.
enum NewReference {
    Tag(NewTag),
    Author(NewAuthor),
    Artist(NewArtist),
    Partner(NewPartner),
}

impl NewReference {
    async fn write(&self, ctx: &ImportContext) -> WriteResult {
        match self {
            Self::Tag(fields) => ctx.writer.write_tag(fields).await,
            Self::Author(fields) => ctx.writer.write_author(fields).await,
            Self::Artist(fields) => ctx.writer.write_artist(fields).await,
            Self::Partner(fields) => ctx.writer.write_partner(fields).await,
        }
    }
}

async fn find_or_create(
    ctx: &mut ImportContext,
    kind: EntityKind,
    key: &BackwardCompatibilityKey,
    build: impl FnOnce(String) -> NewReference,
) -> Result<Resolution, EngineError> {
    if let Some(uuid) = ctx.resolve(kind, key) {
        trace!(%kind, key = %key, "reference already known");
        return Ok(Resolution::Existing(uuid));
    }
    let outcome = build(key.to_string()).write(ctx).await?;
    ctx.settle(kind, key, outcome).await
}

/// Finds or creates a tag in a category and language.
///
/// Key: `{schema}:tags:{category}:{language}:{normalised name}`.
pub async fn tag(
    ctx: &mut ImportContext,
    category: TagCategory,
    language: &str,
    name: &str,
) -> Result<Resolution, EngineError> {
    let key = BackwardCompatibilityKey::for_name(
        &ctx.settings.schema,
        "tags",
        [category.as_str(), language],
        name,
    );
    let display = display_name(name);
    find_or_create(ctx, EntityKind::Tag, &key, |backward_compatibility| {
        NewReference::Tag(NewTag {
            internal_name: display.clone(),
            category,
            language_id: language.to_owned(),
            description: display,
            backward_compatibility,
        })
    })
    .await
}

/// Finds or creates an author. Key: `{schema}:authors:{normalised name}`.
pub async fn author(ctx: &mut ImportContext, name: &str) -> Result<Resolution, EngineError> {
    let key =
        BackwardCompatibilityKey::for_name(&ctx.settings.schema, "authors", [] as [&str; 0], name);
    find_or_create(ctx, EntityKind::Author, &key, |backward_compatibility| {
        NewReference::Author(NewAuthor {
            name: display_name(name),
            backward_compatibility,
        })
    })
    .await
}

/// Finds or creates an artist. Key: `{schema}:artists:{normalised name}`.
///
/// Biographical fields are only written with the first creation.
pub async fn artist(
    ctx: &mut ImportContext,
    plan: &ArtistPlan,
) -> Result<Resolution, EngineError> {
    let key = BackwardCompatibilityKey::for_name(
        &ctx.settings.schema,
        "artists",
        [] as [&str; 0],
        &plan.name,
    );
    find_or_create(ctx, EntityKind::Artist, &key, |backward_compatibility| {
        NewReference::Artist(NewArtist {
            name: display_name(&plan.name),
            place_of_birth: plan.place_of_birth.clone(),
            date_of_birth: plan.date_of_birth.clone(),
            place_of_death: plan.place_of_death.clone(),
            date_of_death: plan.date_of_death.clone(),
            backward_compatibility,
        })
    })
    .await
}

/// Finds or creates a partner known only by name, such as the holding
/// museum of an object. Key: `{schema}:partners:{type}:{normalised name}`.
pub async fn partner(
    ctx: &mut ImportContext,
    partner_type: PartnerType,
    name: &str,
) -> Result<Resolution, EngineError> {
    let key = BackwardCompatibilityKey::for_name(
        &ctx.settings.schema,
        "partners",
        [partner_type.as_str()],
        name,
    );
    find_or_create(ctx, EntityKind::Partner, &key, |backward_compatibility| {
        NewReference::Partner(NewPartner {
            internal_name: display_name(name),
            partner_type,
            country_id: None,
            backward_compatibility,
        })
    })
    .await
}

/// Adds the resolved identifier to `ids` unless the write failed or the
/// identifier is already there.
pub(crate) fn collect_unique(ids: &mut Vec<Uuid>, resolution: &Resolution) {
    if let Some(uuid) = resolution.uuid() {
        if !ids.contains(&uuid) {
            ids.push(uuid);
        }
    }
}
