use async_trait::async_trait;
use im_core::{EntityKind, ImportResult};
use im_legacy::LinkTable;
use im_target::NewItemItemLink;
use tracing::info;

use super::{count, require, skip_group};
use crate::context::ImportContext;
use crate::error::EngineError;
use crate::importer::Importer;
use crate::transform;

/// Legacy object links become directed item-to-item links.
#[derive(Debug, Clone, Copy)]
pub struct LinkImporter {
    table: LinkTable,
}

impl LinkImporter {
    /// Imports one of the two link tables.
    #[must_use]
    pub const fn new(table: LinkTable) -> Self {
        Self { table }
    }
}

#[async_trait]
impl Importer for LinkImporter {
    fn key(&self) -> &'static str {
        match self.table {
            LinkTable::ObjectObject => "object-links",
            LinkTable::ObjectMonument => "object-monument-links",
        }
    }

    fn description(&self) -> &'static str {
        match self.table {
            LinkTable::ObjectObject => "Links between objects",
            LinkTable::ObjectMonument => "Links from objects to monuments",
        }
    }

    fn dependencies(&self) -> &'static [EntityKind] {
        &[EntityKind::Item, EntityKind::Context]
    }

    fn creates(&self) -> &'static [EntityKind] {
        &[EntityKind::ItemItemLink]
    }

    async fn import(&self, ctx: &mut ImportContext) -> Result<ImportResult, EngineError> {
        let table = self.table;
        let importer = self.key();
        let rows = ctx.source.links(table).await?;
        info!(importer, links = rows.len(), "importing links");

        let mut result = ImportResult::new();
        for row in &rows {
            let plan = transform::link(&ctx.settings.schema, table, row);
            ctx.sample(importer, None, table.table(), &plan.key, row).await;

            if ctx.resolve(EntityKind::ItemItemLink, &plan.key).is_some() {
                result.record_skipped();
                continue;
            }
            let resolved = require(ctx, EntityKind::Item, &plan.source_key).and_then(|source_id| {
                let target_id = require(ctx, EntityKind::Item, &plan.target_key)?;
                let context_id = require(ctx, EntityKind::Context, &plan.context_key)?;
                Ok((source_id, target_id, context_id))
            });
            let (source_id, target_id, context_id) = match resolved {
                Ok(ids) => ids,
                Err(skip) => {
                    skip_group(ctx, &mut result, importer, table.table(), &plan.key, row, skip)
                        .await;
                    continue;
                }
            };

            let outcome = ctx
                .writer
                .write_item_item_link(&NewItemItemLink {
                    source_id,
                    target_id,
                    context_id,
                    backward_compatibility: plan.key.to_string(),
                })
                .await?;
            let resolution = ctx.settle(EntityKind::ItemItemLink, &plan.key, outcome).await?;
            count(&mut result, &plan.key, resolution);
        }

        info!(
            importer,
            imported = result.imported,
            skipped = result.skipped,
            errors = result.errors.len(),
            "links done"
        );
        Ok(result)
    }
}
