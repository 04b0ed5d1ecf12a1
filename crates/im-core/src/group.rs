//! Legacy row grouping.
//!
//! Denormalised legacy tables store one row per `(entity, language)`. The
//! grouper collapses those rows into one [`EntityGroup`] per natural key.

use std::hash::Hash;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// One logical legacy entity and its per-language rows.
///
/// A group always holds at least one row: the only constructor is
/// [`group_rows`], which creates a group when it sees its first row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityGroup<K, R> {
    key: K,
    translations: SmallVec<[R; 4]>,
}

impl<K, R> EntityGroup<K, R> {
    fn start(key: K, row: R) -> Self {
        let mut translations = SmallVec::new();
        translations.push(row);
        Self { key, translations }
    }

    /// The natural key shared by every row in the group.
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The first row in arrival order.
    ///
    /// Only a source of shared base fields, never the sole translation.
    #[inline]
    pub fn first(&self) -> &R {
        &self.translations[0]
    }

    /// Number of translation rows, always at least one.
    #[inline]
    pub fn len(&self) -> usize {
        self.translations.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Rows in arrival order.
    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.translations.iter()
    }

    /// Rows as a slice, in arrival order.
    #[inline]
    pub fn translations(&self) -> &[R] {
        &self.translations
    }

    /// Returns the first row matching the predicate.
    pub fn find(&self, mut predicate: impl FnMut(&R) -> bool) -> Option<&R> {
        self.translations.iter().find(|row| predicate(row))
    }
}

impl<'a, K, R> IntoIterator for &'a EntityGroup<K, R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Groups rows by the natural key returned from `key_fn`.
///
/// Groups are returned in the order their key was first seen and rows keep
/// their input order within each group. Feeding rows sorted by natural key
/// makes the output deterministic.
///
/// # Examples
///
/// ```
/// use im_core::group_rows;
///
/// let rows = vec![("P1", "en"), ("P1", "fr"), ("P2", "en"), ("P1", "de")];
/// let groups = group_rows(rows, |row| row.0);
///
/// assert_eq!(groups.len(), 2);
/// assert_eq!(*groups[0].key(), "P1");
/// let langs: Vec<_> = groups[0].iter().map(|row| row.1).collect();
/// assert_eq!(langs, ["en", "fr", "de"]);
/// ```
pub fn group_rows<K, R, F>(rows: impl IntoIterator<Item = R>, mut key_fn: F) -> Vec<EntityGroup<K, R>>
where
    K: Eq + Hash + Clone,
    F: FnMut(&R) -> K,
{
    let mut index: FxHashMap<K, usize> = FxHashMap::default();
    let mut groups: Vec<EntityGroup<K, R>> = Vec::new();

    for row in rows {
        let key = key_fn(&row);
        if let Some(&position) = index.get(&key) {
            groups[position].translations.push(row);
        } else {
            index.insert(key.clone(), groups.len());
            groups.push(EntityGroup::start(key, row));
        }
    }

    groups
}
