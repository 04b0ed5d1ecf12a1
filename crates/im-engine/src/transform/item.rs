//! Items: objects and monuments, with translations, tags, credits and
//! artists.

use im_core::codes::country_code;
use im_core::normalize::split_list;
use im_core::{BackwardCompatibilityKey, EntityGroup};
use im_legacy::{MonumentRow, ObjectRow};
use im_target::{ItemType, TagCategory};
use serde_json::{Map, Value};

use super::{describe, languages, text, Notes, Skip, NO_DESCRIPTION};
use crate::samples::Condition;

/// Borrowed columns shared by the two item tables. Columns a table lacks
/// are `None`.
#[derive(Debug, Clone, Copy, Default)]
#[allow(missing_docs)]
pub struct ItemView<'a> {
    pub project_id: &'a str,
    pub country: &'a str,
    pub owner_id: &'a str,
    pub number: &'a str,
    pub working_number: Option<&'a String>,
    pub inventory_id: Option<&'a String>,
    pub name: Option<&'a String>,
    pub name2: Option<&'a String>,
    pub type_of: Option<&'a String>,
    pub holding_museum: Option<&'a String>,
    pub address: Option<&'a String>,
    pub location: Option<&'a String>,
    pub date_description: Option<&'a String>,
    pub dynasty: Option<&'a String>,
    pub materials: Option<&'a String>,
    pub dimensions: Option<&'a String>,
    pub artist: Option<&'a String>,
    pub birthdate: Option<&'a String>,
    pub birthplace: Option<&'a String>,
    pub deathdate: Option<&'a String>,
    pub deathplace: Option<&'a String>,
    pub production_place: Option<&'a String>,
    pub description: Option<&'a String>,
    pub description2: Option<&'a String>,
    pub datationmethod: Option<&'a String>,
    pub provenance: Option<&'a String>,
    pub bibliography: Option<&'a String>,
    pub keywords: Option<&'a String>,
    pub preparedby: Option<&'a String>,
    pub copyeditedby: Option<&'a String>,
    pub translationby: Option<&'a String>,
    pub translationcopyeditedby: Option<&'a String>,
}

/// A legacy table that holds items.
pub trait ItemRecord {
    /// Legacy table name.
    const TABLE: &'static str;
    /// Legacy table of the owning partner.
    const OWNER_TABLE: &'static str;
    /// Item type written to the target.
    const TYPE: ItemType;

    /// Legacy language code.
    fn lang(&self) -> &str;

    /// Borrows the shared columns.
    fn view(&self) -> ItemView<'_>;
}

impl ItemRecord for ObjectRow {
    const TABLE: &'static str = "objects";
    const OWNER_TABLE: &'static str = "museums";
    const TYPE: ItemType = ItemType::Object;

    fn lang(&self) -> &str {
        &self.lang
    }

    fn view(&self) -> ItemView<'_> {
        ItemView {
            project_id: &self.project_id,
            country: &self.country,
            owner_id: &self.museum_id,
            number: &self.number,
            working_number: self.working_number.as_ref(),
            inventory_id: self.inventory_id.as_ref(),
            name: self.name.as_ref(),
            name2: self.name2.as_ref(),
            type_of: self.type_of.as_ref(),
            holding_museum: self.holding_museum.as_ref(),
            address: None,
            location: self.location.as_ref(),
            date_description: self.date_description.as_ref(),
            dynasty: self.dynasty.as_ref(),
            materials: self.materials.as_ref(),
            dimensions: self.dimensions.as_ref(),
            artist: self.artist.as_ref(),
            birthdate: self.birthdate.as_ref(),
            birthplace: self.birthplace.as_ref(),
            deathdate: self.deathdate.as_ref(),
            deathplace: self.deathplace.as_ref(),
            production_place: self.production_place.as_ref(),
            description: self.description.as_ref(),
            description2: self.description2.as_ref(),
            datationmethod: self.datationmethod.as_ref(),
            provenance: self.provenance.as_ref(),
            bibliography: self.bibliography.as_ref(),
            keywords: self.keywords.as_ref(),
            preparedby: self.preparedby.as_ref(),
            copyeditedby: self.copyeditedby.as_ref(),
            translationby: self.translationby.as_ref(),
            translationcopyeditedby: self.translationcopyeditedby.as_ref(),
        }
    }
}

impl ItemRecord for MonumentRow {
    const TABLE: &'static str = "monuments";
    const OWNER_TABLE: &'static str = "institutions";
    const TYPE: ItemType = ItemType::Monument;

    fn lang(&self) -> &str {
        &self.lang
    }

    fn view(&self) -> ItemView<'_> {
        ItemView {
            project_id: &self.project_id,
            country: &self.country,
            owner_id: &self.institution_id,
            number: &self.number,
            working_number: self.working_number.as_ref(),
            name: self.name.as_ref(),
            name2: self.name2.as_ref(),
            type_of: self.type_of.as_ref(),
            address: self.address.as_ref(),
            location: self.location.as_ref(),
            date_description: self.date_description.as_ref(),
            dynasty: self.dynasty.as_ref(),
            description: self.description.as_ref(),
            description2: self.description2.as_ref(),
            datationmethod: self.datationmethod.as_ref(),
            bibliography: self.bibliography.as_ref(),
            keywords: self.keywords.as_ref(),
            preparedby: self.preparedby.as_ref(),
            copyeditedby: self.copyeditedby.as_ref(),
            translationby: self.translationby.as_ref(),
            translationcopyeditedby: self.translationcopyeditedby.as_ref(),
            ..ItemView::default()
        }
    }
}

/// Names credited on a translation, resolved to authors by the importer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Credits {
    pub author: Option<String>,
    pub copy_editor: Option<String>,
    pub translator: Option<String>,
    pub translation_copy_editor: Option<String>,
}

/// An item description in one language.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct ItemTranslationPlan {
    /// Item key plus language.
    pub key: BackwardCompatibilityKey,
    pub language: &'static str,
    pub name: String,
    pub alternate_name: Option<String>,
    pub description: String,
    pub type_description: Option<String>,
    pub holder: Option<String>,
    pub location: Option<String>,
    pub date_description: Option<String>,
    pub dimensions: Option<String>,
    pub place_of_production: Option<String>,
    pub method_for_datation: Option<String>,
    pub provenance: Option<String>,
    pub bibliography: Option<String>,
    pub credits: Credits,
    /// Legacy columns with no target field.
    pub extra: Option<Value>,
}

/// A tag named on an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPlan {
    /// Vocabulary.
    pub category: TagCategory,
    /// Language of the translation the value came from.
    pub language: &'static str,
    /// Display name.
    pub name: String,
}

/// An artist credited on an object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct ArtistPlan {
    pub name: String,
    pub place_of_birth: Option<String>,
    pub date_of_birth: Option<String>,
    pub place_of_death: Option<String>,
    pub date_of_death: Option<String>,
}

/// What to write for one legacy object or monument.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemPlan {
    /// `{schema}:{table}:{project}:{country}:{owner}:{number}`.
    pub key: BackwardCompatibilityKey,
    /// Object or monument.
    pub item_type: ItemType,
    /// Key of the project, context and collection.
    pub project_key: BackwardCompatibilityKey,
    /// Key of the owning museum or institution.
    pub owner_key: BackwardCompatibilityKey,
    /// ISO 3166-1 alpha-3 code, when the legacy code maps.
    pub country_id: Option<String>,
    /// Working number, or the item number.
    pub internal_name: String,
    /// Owner's inventory number.
    pub owner_reference: Option<String>,
    /// Legacy working number.
    pub mwnf_reference: Option<String>,
    /// Holding museum named in free text.
    pub holder: Option<String>,
    /// One per mapped language.
    pub translations: Vec<ItemTranslationPlan>,
    /// Tags from every translation.
    pub tags: Vec<TagPlan>,
    /// Artists from the base row.
    pub artists: Vec<ArtistPlan>,
    /// Warnings and conditions.
    pub notes: Notes,
}

/// Key of an item: `{schema}:{table}:{project}:{country}:{owner}:{number}`.
#[must_use]
pub fn item_key(schema: &str, table: &str, components: [&str; 4]) -> BackwardCompatibilityKey {
    BackwardCompatibilityKey::new(schema, table, components)
}

fn extra(view: &ItemView<'_>) -> Option<Value> {
    let mut map = Map::new();
    for (field, value) in [("description2", view.description2), ("address", view.address)] {
        if let Some(value) = text(value) {
            map.insert(field.to_owned(), Value::String(value));
        }
    }
    (!map.is_empty()).then_some(Value::Object(map))
}

fn artists(base: &ItemView<'_>) -> Vec<ArtistPlan> {
    let names = base.artist.map(|a| split_list(a)).unwrap_or_default();
    let single = names.len() == 1;
    names
        .into_iter()
        .map(|name| {
            if single {
                ArtistPlan {
                    name,
                    place_of_birth: text(base.birthplace),
                    date_of_birth: text(base.birthdate),
                    place_of_death: text(base.deathplace),
                    date_of_death: text(base.deathdate),
                }
            } else {
                ArtistPlan {
                    name,
                    ..ArtistPlan::default()
                }
            }
        })
        .collect()
}

/// Plans an item from its per-language rows.
pub fn item<R: ItemRecord>(
    schema: &str,
    default_language: &str,
    group: &EntityGroup<[String; 4], R>,
) -> Result<ItemPlan, Skip> {
    let mut notes = Notes::default();
    let languages = languages(group, R::lang, default_language, &mut notes)?;
    let base = languages.base.view();
    let key = item_key(
        schema,
        R::TABLE,
        [base.project_id, base.country, base.owner_id, base.number],
    );

    let country_id = country_code(base.country);
    if country_id.is_none() {
        notes.warn(format!("unknown country '{}', item left without country", base.country));
    }

    let working_number = text(base.working_number);
    let internal_name = working_number
        .clone()
        .unwrap_or_else(|| base.number.to_owned());

    let mut translations = Vec::with_capacity(languages.translations.len());
    let mut tags = Vec::new();
    for localized in &languages.translations {
        let row = localized.row.view();
        let language = localized.language;

        let name = text(row.name).unwrap_or_else(|| {
            notes.flag(
                Condition::FallbackName,
                format!("no {language} name, using '{internal_name}'"),
            );
            internal_name.clone()
        });
        let description = describe(row.description.map(String::as_str), &mut notes)
            .unwrap_or_else(|| {
                notes.flag(
                    Condition::FallbackDescription,
                    format!("no {language} description"),
                );
                NO_DESCRIPTION.to_owned()
            });

        for (category, values) in [
            (TagCategory::Keyword, row.keywords),
            (TagCategory::Material, row.materials),
            (TagCategory::Dynasty, row.dynasty),
        ] {
            tags.extend(values.into_iter().flat_map(|v| split_list(v)).map(|name| TagPlan {
                category,
                language,
                name,
            }));
        }

        translations.push(ItemTranslationPlan {
            key: key.child(language),
            language,
            name,
            alternate_name: text(row.name2),
            description,
            type_description: text(row.type_of),
            holder: text(row.holding_museum),
            location: text(row.location),
            date_description: text(row.date_description),
            dimensions: text(row.dimensions),
            place_of_production: text(row.production_place),
            method_for_datation: text(row.datationmethod),
            provenance: text(row.provenance),
            bibliography: describe(row.bibliography.map(String::as_str), &mut notes),
            credits: Credits {
                author: text(row.preparedby),
                copy_editor: text(row.copyeditedby),
                translator: text(row.translationby),
                translation_copy_editor: text(row.translationcopyeditedby),
            },
            extra: extra(&row),
        });
    }

    Ok(ItemPlan {
        project_key: BackwardCompatibilityKey::new(schema, "projects", [base.project_id]),
        owner_key: BackwardCompatibilityKey::new(
            schema,
            R::OWNER_TABLE,
            [base.owner_id, base.country],
        ),
        key,
        item_type: R::TYPE,
        country_id,
        internal_name,
        owner_reference: text(base.inventory_id),
        mwnf_reference: working_number,
        holder: text(base.holding_museum),
        translations,
        tags,
        artists: artists(&base),
        notes,
    })
}
