//! Backward-compatibility keys.
//!
//! A [`BackwardCompatibilityKey`] is the canonical, colon-delimited string
//! `{schema}:{table}:{pk1}:{pk2}:...` that identifies a legacy entity. It is
//! stored verbatim on the target entity and is the sole basis for
//! cross-run idempotence, so construction must be deterministic: the same
//! primary-key tuple always produces a byte-identical key.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::normalize_name;

/// Separator between key components.
pub const KEY_SEPARATOR: char = ':';

/// A canonical legacy identity string.
///
/// Components are trimmed and joined in the order given. Language or
/// locale values must never be passed as components for entities that
/// carry translations; translation rows derive their own key with
/// [`child`](Self::child).
///
/// # Examples
///
/// ```
/// use im_core::BackwardCompatibilityKey;
///
/// let key = BackwardCompatibilityKey::new("mwnf3", "objects", ["P1", "USA", "M1", "0001"]);
/// assert_eq!(key.as_str(), "mwnf3:objects:P1:USA:M1:0001");
///
/// let tag = BackwardCompatibilityKey::for_name("mwnf3", "tags", ["keyword", "eng"], "  Gold ");
/// assert_eq!(tag.as_str(), "mwnf3:tags:keyword:eng:gold");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackwardCompatibilityKey(String);

impl BackwardCompatibilityKey {
    /// Builds a key from a schema, a table and the non-language primary-key
    /// components, in declared order.
    #[must_use]
    pub fn new<I, S>(schema: &str, table: &str, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut key = String::with_capacity(schema.len() + table.len() + 24);
        key.push_str(schema.trim());
        key.push(KEY_SEPARATOR);
        key.push_str(table.trim());
        for component in components {
            key.push(KEY_SEPARATOR);
            key.push_str(component.as_ref().trim());
        }
        Self(key)
    }

    /// Builds a key for a shared reference entity identified by name.
    ///
    /// The name is normalised (trimmed, whitespace collapsed, lowercased)
    /// so that values differing only in letter case share one key.
    #[must_use]
    pub fn for_name<I, S>(schema: &str, table: &str, qualifiers: I, name: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut key = Self::new(schema, table, qualifiers);
        key.0.push(KEY_SEPARATOR);
        key.0.push_str(&normalize_name(name));
        key
    }

    /// Wraps an already canonical key string, e.g. one read back from the
    /// target system.
    #[must_use]
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Derives a key for a dependent row by appending one component.
    ///
    /// Used for translation rows (`…:eng`) and ordered children such as
    /// logos (`…:logo:1`).
    #[must_use]
    pub fn child(&self, component: impl fmt::Display) -> Self {
        Self(format!("{}{KEY_SEPARATOR}{component}", self.0))
    }

    /// Returns the key as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the colon-delimited components, schema and table
    /// included.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split(KEY_SEPARATOR)
    }

    /// Returns the legacy table component.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.components().nth(1)
    }
}

impl fmt::Display for BackwardCompatibilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BackwardCompatibilityKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<BackwardCompatibilityKey> for String {
    fn from(key: BackwardCompatibilityKey) -> Self {
        key.0
    }
}
