//! Projects: one context, one collection and one project per legacy
//! project, titled from `projectnames`.

use chrono::NaiveDate;
use im_core::codes::language_code;
use im_core::{BackwardCompatibilityKey, EntityGroup};
use im_legacy::{ProjectNameRow, ProjectRow};

use super::{parse_date, text, Notes};
use crate::samples::Condition;

/// A collection title in one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitlePlan {
    /// Key of the collection translation.
    pub key: BackwardCompatibilityKey,
    /// Target language code.
    pub language: &'static str,
    /// Title.
    pub title: String,
}

/// What to write for one legacy project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPlan {
    /// Shared by the context, the collection and the project.
    pub key: BackwardCompatibilityKey,
    /// Legacy display name, or the identifier.
    pub internal_name: String,
    /// Parsed launch date.
    pub launch_date: Option<NaiveDate>,
    /// Launched when a launch date is known.
    pub is_launched: bool,
    /// From the legacy `active` flag.
    pub is_enabled: bool,
    /// Collection titles, never empty.
    pub titles: Vec<TitlePlan>,
    /// Warnings and conditions.
    pub notes: Notes,
}

fn flag(value: Option<&String>) -> bool {
    value.is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "y" | "yes" | "true"))
}

/// Plans a project from its `projects` row and its `projectnames` group.
///
/// Without usable names the collection is titled with the project's
/// internal name in the default language.
#[must_use]
pub fn project(
    schema: &str,
    default_language: &str,
    project: &ProjectRow,
    names: Option<&EntityGroup<String, ProjectNameRow>>,
) -> ProjectPlan {
    let key = BackwardCompatibilityKey::new(schema, "projects", [&project.project_id]);
    let mut notes = Notes::default();

    let launch_date = parse_date(project.launchdate.as_deref());
    if launch_date.is_none() && project.launchdate.is_some() {
        notes.warn(format!(
            "unparseable launch date '{}'",
            project.launchdate.as_deref().unwrap_or_default()
        ));
    }

    let mut titles = Vec::new();
    for row in names.into_iter().flatten() {
        let Some(language) = language_code(&row.lang) else {
            notes.warn(format!("unknown language '{}', title skipped", row.lang));
            continue;
        };
        let Some(title) = text(row.name.as_ref()) else {
            continue;
        };
        titles.push(TitlePlan {
            key: key.child(language),
            language,
            title,
        });
    }

    let internal_name = text(project.name.as_ref()).unwrap_or_else(|| project.project_id.clone());
    if titles.is_empty() {
        notes.flag(
            Condition::FallbackName,
            format!("no project names, titled '{internal_name}'"),
        );
        let language = language_code(default_language).unwrap_or("eng");
        titles.push(TitlePlan {
            key: key.child(language),
            language,
            title: internal_name.clone(),
        });
    }

    ProjectPlan {
        key,
        internal_name,
        launch_date,
        is_launched: launch_date.is_some(),
        is_enabled: flag(project.active.as_ref()),
        titles,
        notes,
    }
}
