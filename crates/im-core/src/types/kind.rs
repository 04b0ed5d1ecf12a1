//! Entity kind enumeration.
//!
//! This module provides the [`EntityKind`] enum used to namespace tracker
//! lookups, so that two different target entity types never collide on the
//! same backward-compatibility string.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of target entity a backward-compatibility key refers to.
///
/// The set is closed: every tracker registration, dependency declaration
/// and writer lookup names one of these variants instead of an ad hoc
/// string.
///
/// # Examples
///
/// ```
/// use im_core::EntityKind;
///
/// assert_eq!(EntityKind::ItemTranslation.as_str(), "item_translation");
/// assert!(EntityKind::Tag.is_name_based());
/// assert!(!EntityKind::Item.is_name_based());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A context (one per legacy project).
    Context,
    /// A collection (one per legacy project).
    Collection,
    /// A per-language collection title.
    CollectionTranslation,
    /// A project.
    Project,
    /// A partner (museum, institution or a holder named in free text).
    Partner,
    /// A per-language partner description.
    PartnerTranslation,
    /// A partner logo image.
    PartnerLogo,
    /// An item (object or monument).
    Item,
    /// A per-language item description.
    ItemTranslation,
    /// An image attached to an item.
    ItemImage,
    /// A directed link between two items.
    ItemItemLink,
    /// A tag (keyword, material, dynasty).
    Tag,
    /// A text author, copy editor or translator.
    Author,
    /// An artist credited on an object.
    Artist,
}

impl EntityKind {
    /// Every entity kind, in declaration order.
    pub const ALL: [Self; 14] = [
        Self::Context,
        Self::Collection,
        Self::CollectionTranslation,
        Self::Project,
        Self::Partner,
        Self::PartnerTranslation,
        Self::PartnerLogo,
        Self::Item,
        Self::ItemTranslation,
        Self::ItemImage,
        Self::ItemItemLink,
        Self::Tag,
        Self::Author,
        Self::Artist,
    ];

    /// Returns the snake case name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Collection => "collection",
            Self::CollectionTranslation => "collection_translation",
            Self::Project => "project",
            Self::Partner => "partner",
            Self::PartnerTranslation => "partner_translation",
            Self::PartnerLogo => "partner_logo",
            Self::Item => "item",
            Self::ItemTranslation => "item_translation",
            Self::ItemImage => "item_image",
            Self::ItemItemLink => "item_item_link",
            Self::Tag => "tag",
            Self::Author => "author",
            Self::Artist => "artist",
        }
    }

    /// Parses a snake case kind name. Returns `None` for unknown values.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Returns `true` for shared reference entities identified by a
    /// normalised name rather than a stable legacy identifier.
    #[inline]
    #[must_use]
    pub const fn is_name_based(self) -> bool {
        matches!(self, Self::Tag | Self::Author | Self::Artist)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_every_kind() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityKind::parse("items"), None);
    }

    #[test]
    fn test_serialization_matches_as_str() {
        assert_eq!(
            serde_json::to_string(&EntityKind::ItemItemLink).unwrap(),
            r#""item_item_link""#
        );
        let kind: EntityKind = serde_json::from_str(r#""partner_logo""#).unwrap();
        assert_eq!(kind, EntityKind::PartnerLogo);
    }

    #[test]
    fn test_name_based_kinds() {
        let name_based: Vec<_> = EntityKind::ALL
            .into_iter()
            .filter(|kind| kind.is_name_based())
            .collect();
        assert_eq!(
            name_based,
            vec![EntityKind::Tag, EntityKind::Author, EntityKind::Artist]
        );
    }
}
