use async_trait::async_trait;
use im_core::{group_rows, BackwardCompatibilityKey, EntityKind, ImportResult};
use im_legacy::{InstitutionRow, MuseumRow};
use im_target::{NewPartner, NewPartnerLogo, NewPartnerTranslation};
use serde::Serialize;
use tracing::{debug, info};

use super::{absorb, count, settle_child, skip_group};
use crate::context::ImportContext;
use crate::error::EngineError;
use crate::importer::Importer;
use crate::transform::partner::partner_key;
use crate::transform::{self, PartnerRecord};

const CREATES: &[EntityKind] = &[
    EntityKind::Partner,
    EntityKind::PartnerTranslation,
    EntityKind::PartnerLogo,
];

/// Legacy museums become partners of type museum.
#[derive(Debug, Clone, Copy, Default)]
pub struct MuseumImporter;

/// Legacy institutions become partners of type institution.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstitutionImporter;

#[async_trait]
impl Importer for MuseumImporter {
    fn key(&self) -> &'static str {
        "museums"
    }

    fn description(&self) -> &'static str {
        "Museums with translations and logos"
    }

    fn dependencies(&self) -> &'static [EntityKind] {
        &[]
    }

    fn creates(&self) -> &'static [EntityKind] {
        CREATES
    }

    async fn import(&self, ctx: &mut ImportContext) -> Result<ImportResult, EngineError> {
        let rows = ctx.source.museums().await?;
        import_partners(ctx, self.key(), rows, MuseumRow::natural_key).await
    }
}

#[async_trait]
impl Importer for InstitutionImporter {
    fn key(&self) -> &'static str {
        "institutions"
    }

    fn description(&self) -> &'static str {
        "Institutions with translations and logos"
    }

    fn dependencies(&self) -> &'static [EntityKind] {
        &[]
    }

    fn creates(&self) -> &'static [EntityKind] {
        CREATES
    }

    async fn import(&self, ctx: &mut ImportContext) -> Result<ImportResult, EngineError> {
        let rows = ctx.source.institutions().await?;
        import_partners(ctx, self.key(), rows, InstitutionRow::natural_key).await
    }
}

async fn import_partners<R>(
    ctx: &mut ImportContext,
    importer: &'static str,
    rows: Vec<R>,
    natural_key: fn(&R) -> [String; 2],
) -> Result<ImportResult, EngineError>
where
    R: PartnerRecord + Serialize + Send + Sync,
{
    let groups = group_rows(rows, natural_key);
    info!(importer, partners = groups.len(), "importing partners");

    let mut result = ImportResult::new();
    for group in &groups {
        let rows = group.translations();
        let [id, country] = group.key();
        let key = partner_key(&ctx.settings.schema, R::TABLE, id, country);
        ctx.sample(importer, None, R::TABLE, &key, rows).await;

        let existing = ctx.resolve(EntityKind::Partner, &key);
        let plan = match transform::partner(&ctx.settings.schema, &ctx.settings.default_language, group) {
            Ok(plan) => plan,
            Err(skip) if existing.is_some() => {
                debug!(key = %key, reason = %skip.0, "existing partner, children not revisited");
                result.record_skipped();
                continue;
            }
            Err(skip) => {
                skip_group(ctx, &mut result, importer, R::TABLE, &key, rows, skip).await;
                continue;
            }
        };

        // Translations and logos are revisited for existing partners too.
        let partner_id = match existing {
            Some(partner_id) => {
                result.record_skipped();
                partner_id
            }
            None => {
                absorb(ctx, &mut result, importer, R::TABLE, &plan.key, rows, &plan.notes).await;
                let outcome = ctx
                    .writer
                    .write_partner(&NewPartner {
                        internal_name: plan.internal_name.clone(),
                        partner_type: plan.partner_type,
                        country_id: plan.country_id.clone(),
                        backward_compatibility: plan.key.to_string(),
                    })
                    .await?;
                let resolution = ctx.settle(EntityKind::Partner, &plan.key, outcome).await?;
                let Some(partner_id) = count(&mut result, &plan.key, resolution) else {
                    continue;
                };
                partner_id
            }
        };

        for translation in &plan.translations {
            if ctx.resolve(EntityKind::PartnerTranslation, &translation.key).is_some() {
                continue;
            }
            let outcome = ctx
                .writer
                .write_partner_translation(&NewPartnerTranslation {
                    partner_id,
                    language_id: translation.language.to_owned(),
                    name: translation.name.clone(),
                    description: translation.description.clone(),
                    city: translation.city.clone(),
                    address: translation.address.clone(),
                    phone: translation.phone.clone(),
                    email: translation.email.clone(),
                    url: translation.url.clone(),
                    backward_compatibility: translation.key.to_string(),
                })
                .await?;
            settle_child(ctx, &mut result, EntityKind::PartnerTranslation, &translation.key, outcome)
                .await?;
        }

        for logo in &plan.logos {
            write_logo(ctx, &mut result, partner_id, &logo.key, &logo.path, logo.display_order).await?;
        }
    }

    info!(
        importer,
        imported = result.imported,
        skipped = result.skipped,
        errors = result.errors.len(),
        "partners done"
    );
    Ok(result)
}

async fn write_logo(
    ctx: &mut ImportContext,
    result: &mut ImportResult,
    partner_id: uuid::Uuid,
    key: &BackwardCompatibilityKey,
    path: &str,
    display_order: i32,
) -> Result<(), EngineError> {
    if ctx.resolve(EntityKind::PartnerLogo, key).is_some() {
        return Ok(());
    }
    let outcome = ctx
        .writer
        .write_partner_logo(&NewPartnerLogo {
            partner_id,
            path: path.to_owned(),
            display_order,
            backward_compatibility: key.to_string(),
        })
        .await?;
    settle_child(ctx, result, EntityKind::PartnerLogo, key, outcome).await?;
    Ok(())
}
