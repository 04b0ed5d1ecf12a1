//! Fully resolved field sets, one per target entity.
//!
//! Every foreign key is already a target UUID and every language or
//! country is already an ISO code. Field names are shared by the REST
//! payload and the database columns.

use chrono::NaiveDate;
use im_core::EntityKind;
use serde::Serialize;
use uuid::Uuid;

/// A column value, as bound by the database strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Nullable text.
    Text(Option<String>),
    /// Nullable UUID.
    Uuid(Option<Uuid>),
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i32),
    /// Nullable date.
    Date(Option<NaiveDate>),
    /// Nullable JSON document.
    Json(Option<serde_json::Value>),
}

/// Conversion of a field into a bindable [`Value`].
pub trait ToColumn {
    /// Returns the column value for this field.
    fn to_column(&self) -> Value;
}

impl ToColumn for String {
    fn to_column(&self) -> Value {
        Value::Text(Some(self.clone()))
    }
}

impl ToColumn for Option<String> {
    fn to_column(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToColumn for Uuid {
    fn to_column(&self) -> Value {
        Value::Uuid(Some(*self))
    }
}

impl ToColumn for Option<Uuid> {
    fn to_column(&self) -> Value {
        Value::Uuid(*self)
    }
}

impl ToColumn for bool {
    fn to_column(&self) -> Value {
        Value::Bool(*self)
    }
}

impl ToColumn for i32 {
    fn to_column(&self) -> Value {
        Value::Int(*self)
    }
}

impl ToColumn for Option<NaiveDate> {
    fn to_column(&self) -> Value {
        Value::Date(*self)
    }
}

impl ToColumn for Option<serde_json::Value> {
    fn to_column(&self) -> Value {
        Value::Json(self.clone())
    }
}

/// A write payload for one target entity kind.
pub trait FieldSet: Serialize + Send + Sync {
    /// Entity kind written by this field set.
    const KIND: EntityKind;

    /// The backward-compatibility value stored on the record.
    fn backward_compatibility(&self) -> &str;

    /// Column name and value pairs, in declaration order.
    fn columns(&self) -> Vec<(&'static str, Value)>;
}

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)*
        }

        impl $name {
            /// Stored text form.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)*
                }
            }
        }

        impl ToColumn for $name {
            fn to_column(&self) -> Value {
                Value::Text(Some(self.as_str().to_owned()))
            }
        }
    };
}

text_enum! {
    /// Kind of partner.
    PartnerType {
        /// A museum.
        Museum => "museum",
        /// An institution responsible for monuments.
        Institution => "institution",
    }
}

text_enum! {
    /// Kind of item.
    ItemType {
        /// A movable object held by a museum.
        Object => "object",
        /// A monument or site.
        Monument => "monument",
    }
}

text_enum! {
    /// Tag vocabulary.
    TagCategory {
        /// Free keyword.
        Keyword => "keyword",
        /// Material.
        Material => "material",
        /// Dynasty or period.
        Dynasty => "dynasty",
    }
}

macro_rules! field_set {
    (
        $(#[$meta:meta])*
        $name:ident => $kind:ident {
            $($(#[$fmeta:meta])* $field:ident : $ty:ty),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize)]
        pub struct $name {
            $($(#[$fmeta])* pub $field: $ty,)*
            /// Backward-compatibility value.
            pub backward_compatibility: String,
        }

        impl FieldSet for $name {
            const KIND: EntityKind = EntityKind::$kind;

            fn backward_compatibility(&self) -> &str {
                &self.backward_compatibility
            }

            fn columns(&self) -> Vec<(&'static str, Value)> {
                vec![
                    $((stringify!($field), self.$field.to_column()),)*
                    ("backward_compatibility", self.backward_compatibility.to_column()),
                ]
            }
        }
    };
}

field_set! {
    /// A context (scope for project-specific translations).
    NewContext => Context {
        /// Unique internal name.
        internal_name: String,
    }
}

field_set! {
    /// A collection.
    NewCollection => Collection {
        /// Unique internal name.
        internal_name: String,
        /// Default language.
        language_id: String,
        /// Owning context.
        context_id: Uuid,
    }
}

field_set! {
    /// A per-language collection title.
    NewCollectionTranslation => CollectionTranslation {
        /// Parent collection.
        collection_id: Uuid,
        /// Translation language.
        language_id: String,
        /// Context of the translation.
        context_id: Uuid,
        /// Title.
        title: String,
        /// Optional description.
        description: Option<String>,
    }
}

field_set! {
    /// A project.
    NewProject => Project {
        /// Unique internal name.
        internal_name: String,
        /// Launch date, when known.
        launch_date: Option<NaiveDate>,
        /// Whether the project has launched.
        is_launched: bool,
        /// Whether the project is enabled.
        is_enabled: bool,
        /// Project context.
        context_id: Uuid,
        /// Default language.
        language_id: String,
    }
}

field_set! {
    /// A partner.
    NewPartner => Partner {
        /// Unique internal name.
        internal_name: String,
        /// Museum or institution.
        partner_type: PartnerType,
        /// ISO 3166-1 alpha-3 country, when known.
        country_id: Option<String>,
    }
}

field_set! {
    /// A per-language partner description.
    NewPartnerTranslation => PartnerTranslation {
        /// Parent partner.
        partner_id: Uuid,
        /// Translation language.
        language_id: String,
        /// Display name.
        name: String,
        /// Markdown description.
        description: Option<String>,
        /// City.
        city: Option<String>,
        /// Postal address.
        address: Option<String>,
        /// Phone number.
        phone: Option<String>,
        /// Contact e-mail.
        email: Option<String>,
        /// Website.
        url: Option<String>,
    }
}

field_set! {
    /// A partner logo.
    NewPartnerLogo => PartnerLogo {
        /// Parent partner.
        partner_id: Uuid,
        /// Legacy image path.
        path: String,
        /// One-based order.
        display_order: i32,
    }
}

field_set! {
    /// An item.
    NewItem => Item {
        /// Unique internal name.
        internal_name: String,
        /// Object or monument.
        item_type: ItemType,
        /// Owning museum or institution.
        partner_id: Uuid,
        /// Partner currently holding the object, when different.
        holder_partner_id: Option<Uuid>,
        /// ISO 3166-1 alpha-3 country.
        country_id: Option<String>,
        /// Project.
        project_id: Uuid,
        /// Collection.
        collection_id: Uuid,
        /// Inventory number at the owner.
        owner_reference: Option<String>,
        /// Legacy working number.
        mwnf_reference: Option<String>,
    }
}

field_set! {
    /// A per-language item description.
    NewItemTranslation => ItemTranslation {
        /// Parent item.
        item_id: Uuid,
        /// Translation language.
        language_id: String,
        /// Context of the translation.
        context_id: Uuid,
        /// Display name.
        name: String,
        /// Alternate name.
        alternate_name: Option<String>,
        /// Markdown description.
        description: String,
        /// Object or monument type.
        type_description: Option<String>,
        /// Holder named in free text.
        holder: Option<String>,
        /// Location.
        location: Option<String>,
        /// Dating, free text.
        date_description: Option<String>,
        /// Dimensions.
        dimensions: Option<String>,
        /// Place of production.
        place_of_production: Option<String>,
        /// Dating method.
        method_for_datation: Option<String>,
        /// Provenance.
        provenance: Option<String>,
        /// Bibliography.
        bibliography: Option<String>,
        /// Text author.
        author_id: Option<Uuid>,
        /// Copy editor.
        text_copy_editor_id: Option<Uuid>,
        /// Translator.
        translator_id: Option<Uuid>,
        /// Translation copy editor.
        translation_copy_editor_id: Option<Uuid>,
        /// Legacy fields with no dedicated column.
        extra: Option<serde_json::Value>,
    }
}

field_set! {
    /// An item image.
    NewItemImage => ItemImage {
        /// Parent item.
        item_id: Uuid,
        /// Legacy image path.
        path: String,
        /// File name of the legacy image.
        original_name: String,
        /// Alternative text.
        alt_text: Option<String>,
        /// One-based order.
        display_order: i32,
    }
}

field_set! {
    /// A directed link between two items.
    NewItemItemLink => ItemItemLink {
        /// Linking item.
        source_id: Uuid,
        /// Linked item.
        target_id: Uuid,
        /// Context of the link.
        context_id: Uuid,
    }
}

field_set! {
    /// A tag.
    NewTag => Tag {
        /// Display name, first seen casing.
        internal_name: String,
        /// Vocabulary.
        category: TagCategory,
        /// Language of the tag.
        language_id: String,
        /// Description, the display name.
        description: String,
    }
}

field_set! {
    /// A text author, copy editor or translator.
    NewAuthor => Author {
        /// Display name.
        name: String,
    }
}

field_set! {
    /// An artist.
    NewArtist => Artist {
        /// Display name.
        name: String,
        /// Place of birth.
        place_of_birth: Option<String>,
        /// Date of birth, free text.
        date_of_birth: Option<String>,
        /// Place of death.
        place_of_death: Option<String>,
        /// Date of death, free text.
        date_of_death: Option<String>,
    }
}
