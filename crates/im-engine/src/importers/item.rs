use async_trait::async_trait;
use im_core::{group_rows, EntityKind, ImportResult};
use im_legacy::{MonumentRow, ObjectRow};
use im_target::{NewItem, NewItemTranslation, PartnerType};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{absorb, count, recover, require, settle_child, skip_group};
use crate::context::{ImportContext, Resolution};
use crate::error::EngineError;
use crate::importer::Importer;
use crate::lookup::{self, collect_unique};
use crate::transform::item::item_key;
use crate::transform::{self, ItemPlan, ItemRecord, ItemTranslationPlan};

/// Legacy objects become items of type object.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectImporter;

/// Legacy monuments become items of type monument.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonumentImporter;

#[async_trait]
impl Importer for ObjectImporter {
    fn key(&self) -> &'static str {
        "objects"
    }

    fn description(&self) -> &'static str {
        "Objects with translations, tags, authors and artists"
    }

    fn dependencies(&self) -> &'static [EntityKind] {
        &[
            EntityKind::Context,
            EntityKind::Collection,
            EntityKind::Project,
            EntityKind::Partner,
            EntityKind::Tag,
            EntityKind::Author,
            EntityKind::Artist,
        ]
    }

    fn creates(&self) -> &'static [EntityKind] {
        &[EntityKind::Item, EntityKind::ItemTranslation]
    }

    async fn import(&self, ctx: &mut ImportContext) -> Result<ImportResult, EngineError> {
        let rows = ctx.source.objects().await?;
        import_items(ctx, self.key(), rows, ObjectRow::natural_key).await
    }
}

#[async_trait]
impl Importer for MonumentImporter {
    fn key(&self) -> &'static str {
        "monuments"
    }

    fn description(&self) -> &'static str {
        "Monuments with translations, tags and authors"
    }

    fn dependencies(&self) -> &'static [EntityKind] {
        &[
            EntityKind::Context,
            EntityKind::Collection,
            EntityKind::Project,
            EntityKind::Partner,
            EntityKind::Tag,
            EntityKind::Author,
        ]
    }

    fn creates(&self) -> &'static [EntityKind] {
        &[EntityKind::Item, EntityKind::ItemTranslation]
    }

    async fn import(&self, ctx: &mut ImportContext) -> Result<ImportResult, EngineError> {
        let rows = ctx.source.monuments().await?;
        import_items(ctx, self.key(), rows, MonumentRow::natural_key).await
    }
}

/// Foreign keys of an item, resolved from the tracker.
struct Parents {
    context_id: Uuid,
    collection_id: Uuid,
    project_id: Uuid,
    partner_id: Uuid,
}

fn parents(ctx: &ImportContext, plan: &ItemPlan) -> Result<Parents, transform::Skip> {
    Ok(Parents {
        context_id: require(ctx, EntityKind::Context, &plan.project_key)?,
        collection_id: require(ctx, EntityKind::Collection, &plan.project_key)?,
        project_id: require(ctx, EntityKind::Project, &plan.project_key)?,
        partner_id: require(ctx, EntityKind::Partner, &plan.owner_key)?,
    })
}

async fn import_items<R>(
    ctx: &mut ImportContext,
    importer: &'static str,
    rows: Vec<R>,
    natural_key: fn(&R) -> [String; 4],
) -> Result<ImportResult, EngineError>
where
    R: ItemRecord + Serialize + Send + Sync,
{
    let groups = group_rows(rows, natural_key);
    info!(importer, items = groups.len(), "importing items");

    let mut result = ImportResult::new();
    for group in &groups {
        let rows = group.translations();
        let [project, country, owner, number] = group.key();
        let key = item_key(
            &ctx.settings.schema,
            R::TABLE,
            [project.as_str(), country.as_str(), owner.as_str(), number.as_str()],
        );
        ctx.sample(importer, None, R::TABLE, &key, rows).await;

        let existing = ctx.resolve(EntityKind::Item, &key);
        let planned = transform::item(&ctx.settings.schema, &ctx.settings.default_language, group)
            .and_then(|plan| parents(ctx, &plan).map(|parents| (plan, parents)));
        let (plan, parents) = match planned {
            Ok(planned) => planned,
            Err(skip) if existing.is_some() => {
                debug!(key = %key, reason = %skip.0, "existing item, children not revisited");
                result.record_skipped();
                continue;
            }
            Err(skip) => {
                skip_group(ctx, &mut result, importer, R::TABLE, &key, rows, skip).await;
                continue;
            }
        };

        // An existing item still gets whatever children an earlier run left out.
        let item_id = match existing {
            Some(item_id) => {
                result.record_skipped();
                item_id
            }
            None => {
                absorb(ctx, &mut result, importer, R::TABLE, &plan.key, rows, &plan.notes).await;
                match write_item(ctx, &mut result, &plan, &parents).await? {
                    Some(item_id) => item_id,
                    None => continue,
                }
            }
        };

        write_translations(ctx, &mut result, &plan, item_id, parents.context_id).await?;
        attach_tags(ctx, &mut result, &plan, item_id).await?;
        attach_artists(ctx, &mut result, &plan, item_id).await?;
    }

    info!(
        importer,
        imported = result.imported,
        skipped = result.skipped,
        errors = result.errors.len(),
        "items done"
    );
    Ok(result)
}

/// Writes the item itself, finding or creating its holder partner first.
async fn write_item(
    ctx: &mut ImportContext,
    result: &mut ImportResult,
    plan: &ItemPlan,
    parents: &Parents,
) -> Result<Option<Uuid>, EngineError> {
    let holder_partner_id = match &plan.holder {
        Some(name) => match lookup::partner(ctx, PartnerType::Museum, name).await? {
            Resolution::Failed(detail) => {
                warn!(key = %plan.key, holder = %name, %detail, "holder partner rejected");
                result.warn(Some(plan.key.as_str()), format!("holder '{name}' not created: {detail}"));
                None
            }
            resolution => resolution.uuid(),
        },
        None => None,
    };

    let outcome = ctx
        .writer
        .write_item(&NewItem {
            internal_name: plan.internal_name.clone(),
            item_type: plan.item_type,
            partner_id: parents.partner_id,
            holder_partner_id,
            country_id: plan.country_id.clone(),
            project_id: parents.project_id,
            collection_id: parents.collection_id,
            owner_reference: plan.owner_reference.clone(),
            mwnf_reference: plan.mwnf_reference.clone(),
            backward_compatibility: plan.key.to_string(),
        })
        .await?;
    let resolution = ctx.settle(EntityKind::Item, &plan.key, outcome).await?;
    Ok(count(result, &plan.key, resolution))
}

async fn credit(
    ctx: &mut ImportContext,
    result: &mut ImportResult,
    translation: &ItemTranslationPlan,
    name: Option<&str>,
) -> Result<Option<Uuid>, EngineError> {
    let Some(name) = name else {
        return Ok(None);
    };
    match lookup::author(ctx, name).await? {
        Resolution::Failed(detail) => {
            result.error(
                Some(translation.key.as_str()),
                format!("author '{name}': {detail}"),
            );
            Ok(None)
        }
        resolution => Ok(resolution.uuid()),
    }
}

async fn write_translations(
    ctx: &mut ImportContext,
    result: &mut ImportResult,
    plan: &ItemPlan,
    item_id: Uuid,
    context_id: Uuid,
) -> Result<(), EngineError> {
    let mut keys = Vec::with_capacity(plan.translations.len());
    let mut pending = Vec::with_capacity(plan.translations.len());
    for translation in &plan.translations {
        if ctx.resolve(EntityKind::ItemTranslation, &translation.key).is_some() {
            continue;
        }
        let credits = &translation.credits;
        let author_id = credit(ctx, result, translation, credits.author.as_deref()).await?;
        let text_copy_editor_id =
            credit(ctx, result, translation, credits.copy_editor.as_deref()).await?;
        let translator_id = credit(ctx, result, translation, credits.translator.as_deref()).await?;
        let translation_copy_editor_id =
            credit(ctx, result, translation, credits.translation_copy_editor.as_deref()).await?;

        keys.push(&translation.key);
        pending.push(NewItemTranslation {
            item_id,
            language_id: translation.language.to_owned(),
            context_id,
            name: translation.name.clone(),
            alternate_name: translation.alternate_name.clone(),
            description: translation.description.clone(),
            type_description: translation.type_description.clone(),
            holder: translation.holder.clone(),
            location: translation.location.clone(),
            date_description: translation.date_description.clone(),
            dimensions: translation.dimensions.clone(),
            place_of_production: translation.place_of_production.clone(),
            method_for_datation: translation.method_for_datation.clone(),
            provenance: translation.provenance.clone(),
            bibliography: translation.bibliography.clone(),
            author_id,
            text_copy_editor_id,
            translator_id,
            translation_copy_editor_id,
            extra: translation.extra.clone(),
            backward_compatibility: translation.key.to_string(),
        });
    }
    if pending.is_empty() {
        return Ok(());
    }

    let outcomes = ctx.writer.write_item_translations(&pending).await?;
    if outcomes.len() != keys.len() {
        warn!(
            key = %plan.key,
            expected = keys.len(),
            received = outcomes.len(),
            "translation batch outcome count mismatch"
        );
    }
    let mut outcomes = outcomes.into_iter();
    for key in keys {
        match outcomes.next() {
            Some(outcome) => {
                settle_child(ctx, result, EntityKind::ItemTranslation, key, outcome).await?;
            }
            None => result.error(
                Some(key.as_str()),
                "item_translation: writer returned no outcome",
            ),
        }
    }
    Ok(())
}

async fn attach_tags(
    ctx: &mut ImportContext,
    result: &mut ImportResult,
    plan: &ItemPlan,
    item_id: Uuid,
) -> Result<(), EngineError> {
    let mut tag_ids = Vec::with_capacity(plan.tags.len());
    for tag in &plan.tags {
        let resolution = lookup::tag(ctx, tag.category, tag.language, &tag.name).await?;
        if let Resolution::Failed(detail) = &resolution {
            result.error(
                Some(plan.key.as_str()),
                format!("{} tag '{}': {detail}", tag.category.as_str(), tag.name),
            );
        }
        collect_unique(&mut tag_ids, &resolution);
    }
    if tag_ids.is_empty() {
        return Ok(());
    }
    if let Err(err) = ctx.writer.attach_item_tags(item_id, &tag_ids).await {
        recover(result, &plan.key, err)?;
    }
    Ok(())
}

async fn attach_artists(
    ctx: &mut ImportContext,
    result: &mut ImportResult,
    plan: &ItemPlan,
    item_id: Uuid,
) -> Result<(), EngineError> {
    let mut artist_ids = Vec::with_capacity(plan.artists.len());
    for artist in &plan.artists {
        let resolution = lookup::artist(ctx, artist).await?;
        if let Resolution::Failed(detail) = &resolution {
            result.error(
                Some(plan.key.as_str()),
                format!("artist '{}': {detail}", artist.name),
            );
        }
        collect_unique(&mut artist_ids, &resolution);
    }
    if artist_ids.is_empty() {
        return Ok(());
    }
    if let Err(err) = ctx.writer.attach_item_artists(item_id, &artist_ids).await {
        recover(result, &plan.key, err)?;
    }
    Ok(())
}
