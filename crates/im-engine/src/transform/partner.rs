//! Partners: museums and institutions, with translations and logos.

use im_core::codes::country_code;
use im_core::{BackwardCompatibilityKey, EntityGroup};
use im_legacy::{InstitutionRow, MuseumRow};
use im_target::PartnerType;

use super::{describe, languages, text, Notes, Skip};
use crate::samples::Condition;

/// Borrowed columns shared by the two partner tables.
#[derive(Debug, Clone, Copy, Default)]
#[allow(missing_docs)]
pub struct PartnerView<'a> {
    pub id: &'a str,
    pub country: &'a str,
    pub name: Option<&'a String>,
    pub city: Option<&'a String>,
    pub address: Option<&'a String>,
    pub phone: Option<&'a String>,
    pub email: Option<&'a String>,
    pub url: Option<&'a String>,
    pub description: Option<&'a String>,
    /// `;`-separated logo paths.
    pub logo: Option<&'a String>,
}

/// A legacy table that holds partners.
pub trait PartnerRecord {
    /// Legacy table name, the key's table component.
    const TABLE: &'static str;
    /// Partner type written to the target.
    const TYPE: PartnerType;

    /// Legacy language code.
    fn lang(&self) -> &str;

    /// Borrows the shared columns.
    fn view(&self) -> PartnerView<'_>;
}

impl PartnerRecord for MuseumRow {
    const TABLE: &'static str = "museums";
    const TYPE: PartnerType = PartnerType::Museum;

    fn lang(&self) -> &str {
        &self.lang
    }

    fn view(&self) -> PartnerView<'_> {
        PartnerView {
            id: &self.museum_id,
            country: &self.country,
            name: self.name.as_ref(),
            city: self.city.as_ref(),
            address: self.address.as_ref(),
            phone: self.phone.as_ref(),
            email: self.email.as_ref(),
            url: self.url.as_ref(),
            description: self.description.as_ref(),
            logo: self.logo.as_ref(),
        }
    }
}

impl PartnerRecord for InstitutionRow {
    const TABLE: &'static str = "institutions";
    const TYPE: PartnerType = PartnerType::Institution;

    fn lang(&self) -> &str {
        &self.lang
    }

    fn view(&self) -> PartnerView<'_> {
        PartnerView {
            id: &self.institution_id,
            country: &self.country,
            name: self.name.as_ref(),
            city: self.city.as_ref(),
            address: self.address.as_ref(),
            url: self.url.as_ref(),
            description: self.description.as_ref(),
            logo: self.logo.as_ref(),
            ..PartnerView::default()
        }
    }
}

/// A partner description in one language.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct PartnerTranslationPlan {
    /// Partner key plus language.
    pub key: BackwardCompatibilityKey,
    pub language: &'static str,
    /// Never empty: falls back to the partner's internal name.
    pub name: String,
    pub description: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
}

/// One logo path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoPlan {
    /// Partner key plus `logo:{n}`.
    pub key: BackwardCompatibilityKey,
    /// Path as stored in the legacy column.
    pub path: String,
    /// One-based position in the legacy list.
    pub display_order: i32,
}

/// What to write for one legacy museum or institution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerPlan {
    /// `{schema}:{table}:{id}:{country}`.
    pub key: BackwardCompatibilityKey,
    /// Museum or institution.
    pub partner_type: PartnerType,
    /// Default-language name, or the legacy identifier.
    pub internal_name: String,
    /// ISO 3166-1 alpha-3 code, when the legacy code maps.
    pub country_id: Option<String>,
    /// One per mapped language.
    pub translations: Vec<PartnerTranslationPlan>,
    /// Logos from the base row.
    pub logos: Vec<LogoPlan>,
    /// Warnings and conditions.
    pub notes: Notes,
}

/// Key of a museum or institution: `{schema}:{table}:{id}:{country}`.
#[must_use]
pub fn partner_key(schema: &str, table: &str, id: &str, country: &str) -> BackwardCompatibilityKey {
    BackwardCompatibilityKey::new(schema, table, [id, country])
}

/// Plans a partner from its per-language rows.
pub fn partner<R: PartnerRecord>(
    schema: &str,
    default_language: &str,
    group: &EntityGroup<[String; 2], R>,
) -> Result<PartnerPlan, Skip> {
    let mut notes = Notes::default();
    let languages = languages(group, R::lang, default_language, &mut notes)?;
    let base = languages.base.view();
    let key = partner_key(schema, R::TABLE, base.id, base.country);

    let country_id = country_code(base.country);
    if country_id.is_none() {
        notes.warn(format!("unknown country '{}', partner left without country", base.country));
    }

    let internal_name = text(base.name).unwrap_or_else(|| base.id.to_owned());
    let mut translations = Vec::with_capacity(languages.translations.len());
    for localized in &languages.translations {
        let row = localized.row.view();
        let name = text(row.name).unwrap_or_else(|| {
            notes.flag(
                Condition::FallbackName,
                format!("no {} name, using '{internal_name}'", localized.language),
            );
            internal_name.clone()
        });
        translations.push(PartnerTranslationPlan {
            key: key.child(localized.language),
            language: localized.language,
            name,
            description: describe(row.description.map(String::as_str), &mut notes),
            city: text(row.city),
            address: text(row.address),
            phone: text(row.phone),
            email: text(row.email),
            url: text(row.url),
        });
    }

    let logos = base
        .logo
        .into_iter()
        .flat_map(|paths| paths.split(';'))
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .zip(1..)
        .map(|(path, order)| LogoPlan {
            key: key.child(format_args!("logo:{order}")),
            path: path.to_owned(),
            display_order: order,
        })
        .collect();

    Ok(PartnerPlan {
        key,
        partner_type: R::TYPE,
        internal_name,
        country_id,
        translations,
        logos,
        notes,
    })
}
