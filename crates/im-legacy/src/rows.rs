//! Statically declared record types, one per legacy table.
//!
//! Every column is read as text. Key columns are required and trimmed;
//! value columns are optional, trimmed, and empty strings become `None`.
//! Call [`tidy`](ObjectRow::tidy) on rows coming from a driver before
//! handing them to the grouper.

use serde::Serialize;

fn tidy_value(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    })
}

macro_rules! legacy_record {
    (
        $(#[$meta:meta])*
        $name:ident {
            keys { $($(#[$kmeta:meta])* $key:ident),* $(,)? }
            values { $($value:ident),* $(,)? }
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
        pub struct $name {
            $($(#[$kmeta])* pub $key: String,)*
            $(#[allow(missing_docs)] pub $value: Option<String>,)*
        }

        impl $name {
            /// Column names in declaration order, as selected from the
            /// source.
            pub const COLUMNS: &'static [&'static str] =
                &[$(stringify!($key),)* $(stringify!($value),)*];

            /// Trims every column. Empty optional values become `None`.
            #[must_use]
            pub fn tidy(self) -> Self {
                Self {
                    $($key: self.$key.trim().to_owned(),)*
                    $($value: tidy_value(self.$value),)*
                }
            }
        }
    };
}

legacy_record! {
    /// A row of `projects`.
    ProjectRow {
        keys {
            /// Project identifier.
            project_id,
        }
        values { name, launchdate, active }
    }
}

legacy_record! {
    /// A row of `projectnames`, one per project and language.
    ProjectNameRow {
        keys {
            /// Project identifier.
            project_id,
            /// Two-letter legacy language code.
            lang,
        }
        values { name }
    }
}

legacy_record! {
    /// A row of `museums`, one per museum and language.
    MuseumRow {
        keys {
            /// Museum identifier, unique within a country.
            museum_id,
            /// Legacy country code.
            country,
            /// Two-letter legacy language code.
            lang,
        }
        values { name, city, address, phone, email, url, description, logo }
    }
}

legacy_record! {
    /// A row of `institutions`, one per institution and language.
    InstitutionRow {
        keys {
            /// Institution identifier, unique within a country.
            institution_id,
            /// Legacy country code.
            country,
            /// Two-letter legacy language code.
            lang,
        }
        values { name, city, address, url, description, logo }
    }
}

legacy_record! {
    /// A row of `objects`, one per object and language.
    ObjectRow {
        keys {
            /// Project identifier.
            project_id,
            /// Legacy country code.
            country,
            /// Owning museum identifier.
            museum_id,
            /// Object number within the museum.
            number,
            /// Two-letter legacy language code.
            lang,
        }
        values {
            working_number, inventory_id, name, name2, type_of, holding_museum,
            location, date_description, dynasty, materials, dimensions, artist,
            birthdate, birthplace, deathdate, deathplace, production_place,
            description, description2, datationmethod, provenance, bibliography,
            keywords, preparedby, copyeditedby, translationby,
            translationcopyeditedby,
        }
    }
}

legacy_record! {
    /// A row of `monuments`, one per monument and language.
    MonumentRow {
        keys {
            /// Project identifier.
            project_id,
            /// Legacy country code.
            country,
            /// Owning institution identifier.
            institution_id,
            /// Monument number within the institution.
            number,
            /// Two-letter legacy language code.
            lang,
        }
        values {
            working_number, name, name2, type_of, address, location,
            date_description, dynasty, description, description2,
            datationmethod, bibliography, keywords, preparedby, copyeditedby,
            translationby, translationcopyeditedby,
        }
    }
}

legacy_record! {
    /// A row of `objects_pictures` or `monuments_pictures`, one per image
    /// and language.
    ///
    /// `owner_id` is the museum for object pictures and the institution for
    /// monument pictures.
    PictureRow {
        keys {
            /// Project identifier of the parent item.
            project_id,
            /// Legacy country code of the parent item.
            country,
            /// Museum or institution identifier of the parent item.
            owner_id,
            /// Parent item number.
            number,
            /// Image ordinal within the parent item.
            image_number,
            /// Two-letter legacy language code.
            lang,
        }
        values { path, caption, photographer, copyright }
    }
}

legacy_record! {
    /// A row of `objects_objects` or `objects_monuments`: a directed link
    /// from an object to another object or a monument.
    LinkRow {
        keys {
            /// Project of the source object.
            from_project_id,
            /// Country of the source object.
            from_country,
            /// Museum of the source object.
            from_owner_id,
            /// Number of the source object.
            from_number,
            /// Project of the linked item.
            to_project_id,
            /// Country of the linked item.
            to_country,
            /// Museum or institution of the linked item.
            to_owner_id,
            /// Number of the linked item.
            to_number,
        }
        values {}
    }
}

impl ProjectNameRow {
    /// Natural key (language excluded).
    #[must_use]
    pub fn natural_key(&self) -> String {
        self.project_id.clone()
    }
}

impl MuseumRow {
    /// Natural key (language excluded).
    #[must_use]
    pub fn natural_key(&self) -> [String; 2] {
        [self.museum_id.clone(), self.country.clone()]
    }
}

impl InstitutionRow {
    /// Natural key (language excluded).
    #[must_use]
    pub fn natural_key(&self) -> [String; 2] {
        [self.institution_id.clone(), self.country.clone()]
    }
}

impl ObjectRow {
    /// Natural key (language excluded).
    #[must_use]
    pub fn natural_key(&self) -> [String; 4] {
        [
            self.project_id.clone(),
            self.country.clone(),
            self.museum_id.clone(),
            self.number.clone(),
        ]
    }
}

impl MonumentRow {
    /// Natural key (language excluded).
    #[must_use]
    pub fn natural_key(&self) -> [String; 4] {
        [
            self.project_id.clone(),
            self.country.clone(),
            self.institution_id.clone(),
            self.number.clone(),
        ]
    }
}

impl PictureRow {
    /// Key of the parent item.
    #[must_use]
    pub fn parent_key(&self) -> [String; 4] {
        [
            self.project_id.clone(),
            self.country.clone(),
            self.owner_id.clone(),
            self.number.clone(),
        ]
    }

    /// Natural key (language excluded): parent key plus image number.
    #[must_use]
    pub fn natural_key(&self) -> [String; 5] {
        [
            self.project_id.clone(),
            self.country.clone(),
            self.owner_id.clone(),
            self.number.clone(),
            self.image_number.clone(),
        ]
    }
}

impl LinkRow {
    /// Key components of the source object.
    #[must_use]
    pub fn from_key(&self) -> [&str; 4] {
        [
            &self.from_project_id,
            &self.from_country,
            &self.from_owner_id,
            &self.from_number,
        ]
    }

    /// Key components of the linked item.
    #[must_use]
    pub fn to_key(&self) -> [&str; 4] {
        [
            &self.to_project_id,
            &self.to_country,
            &self.to_owner_id,
            &self.to_number,
        ]
    }
}

/// The two legacy picture tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PictureTable {
    /// `objects_pictures`
    Objects,
    /// `monuments_pictures`
    Monuments,
}

impl PictureTable {
    /// Legacy table name.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::Objects => "objects_pictures",
            Self::Monuments => "monuments_pictures",
        }
    }

    /// Legacy table of the parent items.
    #[must_use]
    pub const fn parent_table(self) -> &'static str {
        match self {
            Self::Objects => "objects",
            Self::Monuments => "monuments",
        }
    }

    /// Column holding the parent's museum or institution.
    #[must_use]
    pub const fn owner_column(self) -> &'static str {
        match self {
            Self::Objects => "museum_id",
            Self::Monuments => "institution_id",
        }
    }
}

/// The two legacy link tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkTable {
    /// `objects_objects`
    ObjectObject,
    /// `objects_monuments`
    ObjectMonument,
}

impl LinkTable {
    /// Legacy table name.
    #[must_use]
    pub const fn table(self) -> &'static str {
        match self {
            Self::ObjectObject => "objects_objects",
            Self::ObjectMonument => "objects_monuments",
        }
    }

    /// Legacy table of the link's target items.
    #[must_use]
    pub const fn target_table(self) -> &'static str {
        match self {
            Self::ObjectObject => "objects",
            Self::ObjectMonument => "monuments",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tidy_trims_and_drops_empty_values() {
        let row = ObjectRow {
            project_id: " P1 ".to_owned(),
            lang: "en ".to_owned(),
            name: Some("  Ewer ".to_owned()),
            description: Some("   ".to_owned()),
            ..ObjectRow::default()
        }
        .tidy();

        assert_eq!(row.project_id, "P1");
        assert_eq!(row.lang, "en");
        assert_eq!(row.name.as_deref(), Some("Ewer"));
        assert_eq!(row.description, None);
    }

    #[test]
    fn test_columns_follow_declaration_order() {
        assert_eq!(ProjectRow::COLUMNS, ["project_id", "name", "launchdate", "active"]);
        assert_eq!(&LinkRow::COLUMNS[..2], ["from_project_id", "from_country"]);
        assert!(ObjectRow::COLUMNS.contains(&"type_of"));
    }

    #[test]
    fn test_natural_key_excludes_language() {
        let row = MuseumRow {
            museum_id: "M1".to_owned(),
            country: "eg".to_owned(),
            lang: "fr".to_owned(),
            ..MuseumRow::default()
        };
        assert_eq!(row.natural_key(), ["M1".to_owned(), "eg".to_owned()]);
    }

    #[test]
    fn test_rows_serialize_with_column_names() {
        let row = ProjectNameRow {
            project_id: "P1".to_owned(),
            lang: "en".to_owned(),
            name: None,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["project_id"], "P1");
        assert!(json["name"].is_null());
    }
}
