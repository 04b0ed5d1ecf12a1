use async_trait::async_trait;
use im_core::{group_rows, BackwardCompatibilityKey, EntityKind, ImportResult};
use im_legacy::{PictureRow, PictureTable};
use im_target::NewItemImage;
use rustc_hash::FxHashMap;
use tracing::info;

use super::{absorb, count, require, skip_group};
use crate::context::ImportContext;
use crate::error::EngineError;
use crate::importer::Importer;
use crate::transform;

/// Legacy pictures become item images.
#[derive(Debug, Clone, Copy)]
pub struct PictureImporter {
    table: PictureTable,
}

impl PictureImporter {
    /// Imports one of the two picture tables.
    #[must_use]
    pub const fn new(table: PictureTable) -> Self {
        Self { table }
    }
}

#[async_trait]
impl Importer for PictureImporter {
    fn key(&self) -> &'static str {
        match self.table {
            PictureTable::Objects => "object-pictures",
            PictureTable::Monuments => "monument-pictures",
        }
    }

    fn description(&self) -> &'static str {
        match self.table {
            PictureTable::Objects => "Object pictures as item images",
            PictureTable::Monuments => "Monument pictures as item images",
        }
    }

    fn dependencies(&self) -> &'static [EntityKind] {
        &[EntityKind::Item]
    }

    fn creates(&self) -> &'static [EntityKind] {
        &[EntityKind::ItemImage]
    }

    async fn import(&self, ctx: &mut ImportContext) -> Result<ImportResult, EngineError> {
        let table = self.table;
        let importer = self.key();
        let groups = group_rows(ctx.source.pictures(table).await?, PictureRow::natural_key);
        info!(importer, pictures = groups.len(), "importing pictures");

        let mut result = ImportResult::new();
        let mut positions: FxHashMap<BackwardCompatibilityKey, usize> = FxHashMap::default();
        for group in &groups {
            let rows = group.translations();
            let key = BackwardCompatibilityKey::new(&ctx.settings.schema, table.table(), group.key());
            let parent_key = BackwardCompatibilityKey::new(
                &ctx.settings.schema,
                table.parent_table(),
                group.first().parent_key(),
            );
            let position = positions.entry(parent_key.clone()).or_insert(0);
            *position += 1;
            let position = *position;
            ctx.sample(importer, None, table.table(), &key, rows).await;

            if ctx.resolve(EntityKind::ItemImage, &key).is_some() {
                result.record_skipped();
                continue;
            }
            let planned = require(ctx, EntityKind::Item, &parent_key).and_then(|item_id| {
                transform::picture(
                    &ctx.settings.schema,
                    &ctx.settings.default_language,
                    table,
                    group,
                    position,
                )
                .map(|plan| (item_id, plan))
            });
            let (item_id, plan) = match planned {
                Ok(planned) => planned,
                Err(skip) => {
                    skip_group(ctx, &mut result, importer, table.table(), &key, rows, skip).await;
                    continue;
                }
            };
            absorb(ctx, &mut result, importer, table.table(), &plan.key, rows, &plan.notes).await;

            let outcome = ctx
                .writer
                .write_item_image(&NewItemImage {
                    item_id,
                    path: plan.path.clone(),
                    original_name: plan.original_name.clone(),
                    alt_text: plan.alt_text.clone(),
                    display_order: plan.display_order,
                    backward_compatibility: plan.key.to_string(),
                })
                .await?;
            let resolution = ctx.settle(EntityKind::ItemImage, &plan.key, outcome).await?;
            count(&mut result, &plan.key, resolution);
        }

        info!(
            importer,
            imported = result.imported,
            skipped = result.skipped,
            errors = result.errors.len(),
            "pictures done"
        );
        Ok(result)
    }
}
