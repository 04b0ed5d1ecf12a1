use async_trait::async_trait;
use im_core::{group_rows, EntityKind, ImportResult};
use im_legacy::ProjectNameRow;
use im_target::{NewCollection, NewCollectionTranslation, NewContext, NewProject};
use rustc_hash::FxHashMap;
use tracing::info;

use super::{absorb, count, settle_child};
use crate::context::ImportContext;
use crate::error::EngineError;
use crate::importer::Importer;
use crate::transform;

/// Legacy projects become a context, a collection with titles, and a
/// project.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectImporter;

#[async_trait]
impl Importer for ProjectImporter {
    fn key(&self) -> &'static str {
        "projects"
    }

    fn description(&self) -> &'static str {
        "Projects with their context and collection"
    }

    fn dependencies(&self) -> &'static [EntityKind] {
        &[]
    }

    fn creates(&self) -> &'static [EntityKind] {
        &[
            EntityKind::Context,
            EntityKind::Collection,
            EntityKind::CollectionTranslation,
            EntityKind::Project,
        ]
    }

    async fn import(&self, ctx: &mut ImportContext) -> Result<ImportResult, EngineError> {
        let projects = ctx.source.projects().await?;
        let names = group_rows(ctx.source.project_names().await?, ProjectNameRow::natural_key);
        let names: FxHashMap<&str, _> = names.iter().map(|group| (group.key().as_str(), group)).collect();
        info!(projects = projects.len(), "importing projects");

        let mut result = ImportResult::new();
        for row in &projects {
            let group = names.get(row.project_id.as_str()).copied();
            let plan = transform::project(
                &ctx.settings.schema,
                &ctx.settings.default_language,
                row,
                group,
            );
            ctx.sample(self.key(), None, "projects", &plan.key, row).await;

            // Context, collection and titles are each guarded by their own
            // key, so an existing project still gets what an earlier run missed.
            let existing = ctx.resolve(EntityKind::Project, &plan.key);
            if existing.is_none() {
                absorb(ctx, &mut result, self.key(), "projects", &plan.key, row, &plan.notes).await;
            }

            let context_id = match ctx.resolve(EntityKind::Context, &plan.key) {
                Some(uuid) => uuid,
                None => {
                    let outcome = ctx
                        .writer
                        .write_context(&NewContext {
                            internal_name: plan.internal_name.clone(),
                            backward_compatibility: plan.key.to_string(),
                        })
                        .await?;
                    match settle_child(ctx, &mut result, EntityKind::Context, &plan.key, outcome).await? {
                        Some(uuid) => uuid,
                        None => continue,
                    }
                }
            };

            let collection_id = match ctx.resolve(EntityKind::Collection, &plan.key) {
                Some(uuid) => uuid,
                None => {
                    let outcome = ctx
                        .writer
                        .write_collection(&NewCollection {
                            internal_name: plan.internal_name.clone(),
                            language_id: ctx.settings.default_language.clone(),
                            context_id,
                            backward_compatibility: plan.key.to_string(),
                        })
                        .await?;
                    match settle_child(ctx, &mut result, EntityKind::Collection, &plan.key, outcome)
                        .await?
                    {
                        Some(uuid) => uuid,
                        None => continue,
                    }
                }
            };

            for title in &plan.titles {
                if ctx.resolve(EntityKind::CollectionTranslation, &title.key).is_some() {
                    continue;
                }
                let outcome = ctx
                    .writer
                    .write_collection_translation(&NewCollectionTranslation {
                        collection_id,
                        language_id: title.language.to_owned(),
                        context_id,
                        title: title.title.clone(),
                        description: None,
                        backward_compatibility: title.key.to_string(),
                    })
                    .await?;
                settle_child(ctx, &mut result, EntityKind::CollectionTranslation, &title.key, outcome)
                    .await?;
            }

            if existing.is_some() {
                result.record_skipped();
                continue;
            }
            let outcome = ctx
                .writer
                .write_project(&NewProject {
                    internal_name: plan.internal_name.clone(),
                    launch_date: plan.launch_date,
                    is_launched: plan.is_launched,
                    is_enabled: plan.is_enabled,
                    context_id,
                    language_id: ctx.settings.default_language.clone(),
                    backward_compatibility: plan.key.to_string(),
                })
                .await?;
            let resolution = ctx.settle(EntityKind::Project, &plan.key, outcome).await?;
            count(&mut result, &plan.key, resolution);
        }

        info!(
            imported = result.imported,
            skipped = result.skipped,
            errors = result.errors.len(),
            "projects done"
        );
        Ok(result)
    }
}
