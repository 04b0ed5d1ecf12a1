//! Pure mapping from legacy entity groups to target plans.
//!
//! Nothing here performs I/O. A transformer takes a group of legacy rows
//! and returns a plan: the backward-compatibility keys, the base fields
//! and one entry per translation, with legacy identifiers still in place
//! of target UUIDs. Importers resolve those identifiers against the
//! tracker and hand the result to the writer.
//!
//! Data-quality gaps never fail a group. They are substituted with a
//! deterministic fallback and reported through [`Notes`].

pub mod item;
pub mod link;
pub mod partner;
pub mod picture;
pub mod project;

use chrono::NaiveDate;
use im_core::codes::language_code;
use im_core::markdown::{contains_html, html_to_markdown};
use im_core::normalize::non_empty;
use im_core::EntityGroup;

use crate::samples::Condition;

pub use item::{item, ArtistPlan, Credits, ItemPlan, ItemRecord, ItemTranslationPlan, TagPlan};
pub use link::{link, LinkPlan};
pub use partner::{partner, LogoPlan, PartnerPlan, PartnerRecord, PartnerTranslationPlan};
pub use picture::{picture, PicturePlan};
pub use project::{project, ProjectPlan, TitlePlan};

/// Description used when a translation has none.
pub const NO_DESCRIPTION: &str = "(no description available)";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y-%m-%d %H:%M:%S", "%d/%m/%Y"];

/// Warnings and sample-worthy conditions raised while transforming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notes {
    /// Messages for the import result.
    pub warnings: Vec<String>,
    /// Conditions seen, in order, without duplicates.
    pub conditions: Vec<Condition>,
}

impl Notes {
    /// Records a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Records a condition.
    pub fn note(&mut self, condition: Condition) {
        if !self.conditions.contains(&condition) {
            self.conditions.push(condition);
        }
    }

    /// Records a warning tied to a condition.
    pub fn flag(&mut self, condition: Condition, message: impl Into<String>) {
        self.note(condition);
        self.warn(message);
    }
}

/// A group that cannot be imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip(pub String);

/// A translation row with its language mapped to ISO 639-3.
#[derive(Debug)]
pub struct Localized<'a, R> {
    /// Target language code.
    pub language: &'static str,
    /// The legacy row.
    pub row: &'a R,
}

/// The translations of a group that the target can hold, plus the row
/// that supplies base fields.
#[derive(Debug)]
pub struct Languages<'a, R> {
    /// Row in the default language, or the first mapped row.
    pub base: &'a R,
    /// Every row whose language maps, in arrival order.
    pub translations: Vec<Localized<'a, R>>,
}

/// Maps the languages of a group.
///
/// Rows with an unmappable language are dropped with a warning. When no
/// row maps, the group is skipped. When no row is in the default language,
/// the first mapped row supplies the base fields.
pub fn languages<'a, K, R>(
    group: &'a EntityGroup<K, R>,
    lang: impl Fn(&R) -> &str,
    default_language: &str,
    notes: &mut Notes,
) -> Result<Languages<'a, R>, Skip> {
    let mut translations = Vec::with_capacity(group.len());
    for row in group {
        match language_code(lang(row)) {
            Some(language) => translations.push(Localized { language, row }),
            None => notes.warn(format!("unknown language '{}', translation skipped", lang(row))),
        }
    }

    let Some(first) = translations.first() else {
        return Err(Skip("no translation in a known language".to_owned()));
    };
    let base = match translations.iter().find(|t| t.language == default_language) {
        Some(default) => default.row,
        None => {
            notes.flag(
                Condition::NoDefaultLanguage,
                format!("no {default_language} translation, using {}", first.language),
            );
            first.row
        }
    };

    Ok(Languages { base, translations })
}

/// Normalises a description: HTML becomes markdown.
pub fn describe(value: Option<&str>, notes: &mut Notes) -> Option<String> {
    let value = non_empty(value)?;
    if contains_html(value) {
        notes.note(Condition::HtmlDescription);
        let markdown = html_to_markdown(value);
        return (!markdown.is_empty()).then_some(markdown);
    }
    Some(value.to_owned())
}

/// Parses a legacy date. Zero dates and unknown formats yield `None`.
#[must_use]
pub fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let value = non_empty(value)?;
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Copies an optional column.
fn text(value: Option<&String>) -> Option<String> {
    non_empty(value.map(String::as_str)).map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use im_core::group_rows;

    #[derive(Debug)]
    struct Row {
        id: &'static str,
        lang: &'static str,
    }

    fn rows(langs: &[&'static str]) -> Vec<EntityGroup<&'static str, Row>> {
        group_rows(langs.iter().map(|lang| Row { id: "A", lang }), |row| row.id)
    }

    #[test]
    fn test_languages_prefers_default() {
        let groups = rows(&["fr", "en", "de"]);
        let mut notes = Notes::default();
        let languages = languages(&groups[0], |r| r.lang, "eng", &mut notes).unwrap();
        assert_eq!(languages.base.lang, "en");
        assert_eq!(languages.translations.len(), 3);
        assert_eq!(languages.translations[0].language, "fra");
        assert!(notes.warnings.is_empty());
    }

    #[test]
    fn test_languages_falls_back_to_first() {
        let groups = rows(&["xx", "fr", "de"]);
        let mut notes = Notes::default();
        let languages = languages(&groups[0], |r| r.lang, "eng", &mut notes).unwrap();
        assert_eq!(languages.base.lang, "fr");
        assert_eq!(languages.translations.len(), 2);
        assert_eq!(notes.warnings.len(), 2);
        assert_eq!(notes.conditions, [Condition::NoDefaultLanguage]);
    }

    #[test]
    fn test_languages_skips_unmappable_group() {
        let groups = rows(&["xx", "??"]);
        let mut notes = Notes::default();
        let skip = languages(&groups[0], |r| r.lang, "eng", &mut notes).unwrap_err();
        assert!(skip.0.contains("no translation"));
    }

    #[test]
    fn test_describe_converts_html() {
        let mut notes = Notes::default();
        assert_eq!(
            describe(Some("<p>A <b>bowl</b></p>"), &mut notes).as_deref(),
            Some("A **bowl**")
        );
        assert_eq!(notes.conditions, [Condition::HtmlDescription]);
        assert!(notes.warnings.is_empty());

        assert_eq!(describe(Some("  "), &mut notes), None);
        assert_eq!(describe(Some("plain"), &mut notes).as_deref(), Some("plain"));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2004, 5, 17);
        assert_eq!(parse_date(Some("2004-05-17")), expected);
        assert_eq!(parse_date(Some("2004-05-17 00:00:00")), expected);
        assert_eq!(parse_date(Some("17/05/2004")), expected);
        assert_eq!(parse_date(Some("0000-00-00")), None);
        assert_eq!(parse_date(None), None);
    }
}
