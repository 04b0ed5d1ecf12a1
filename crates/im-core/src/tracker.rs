//! Backward-compatibility tracker.
//!
//! The [`Tracker`] is the in-memory registry from a canonical legacy
//! identity string to the UUID of the target entity created for it. It is
//! used both to detect "already imported" and to resolve foreign-key
//! references between importers.
//!
//! # Two-tier lookup
//!
//! The in-memory tier is authoritative within a single run. When a key is
//! absent here but the target might already contain it (a previous run),
//! callers fall back to querying the target writer. That fallback is
//! explicit at each call site and never hidden inside the tracker, because
//! it costs a network or database round trip.
//!
//! # Ownership
//!
//! One tracker is constructed per run and passed by mutable reference to
//! every importer and helper. There is no global state.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::error::TrackerError;
use crate::types::{BackwardCompatibilityKey, EntityKind};

/// A single registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackerEntry {
    /// Target-system identifier.
    pub uuid: Uuid,
    /// Canonical legacy identity.
    pub backward_compatibility: BackwardCompatibilityKey,
    /// Namespace of the key.
    pub kind: EntityKind,
    /// When the mapping was registered in this process.
    pub created_at: DateTime<Utc>,
}

/// In-memory registry of backward-compatibility keys, namespaced by
/// [`EntityKind`].
///
/// # Examples
///
/// ```
/// use im_core::{BackwardCompatibilityKey, EntityKind, Tracker};
/// use uuid::Uuid;
///
/// let mut tracker = Tracker::new();
/// let key = BackwardCompatibilityKey::new("mwnf3", "projects", ["P1"]);
/// let id = Uuid::new_v4();
///
/// tracker.register(&key, EntityKind::Project, id).unwrap();
/// assert!(tracker.exists(&key, EntityKind::Project));
/// assert!(!tracker.exists(&key, EntityKind::Context));
/// assert_eq!(tracker.get_uuid(&key, EntityKind::Project), Some(id));
/// ```
#[derive(Debug, Default)]
pub struct Tracker {
    entries: FxHashMap<(EntityKind, BackwardCompatibilityKey), TrackerEntry>,
}

impl Tracker {
    /// Creates an empty tracker.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mapping.
    ///
    /// Registering the same key and UUID again is a no-op. Registering the
    /// same key with a different UUID fails with
    /// [`TrackerError::DuplicateRegistration`] and leaves the first mapping
    /// in place.
    pub fn register(
        &mut self,
        key: &BackwardCompatibilityKey,
        kind: EntityKind,
        uuid: Uuid,
    ) -> Result<(), TrackerError> {
        if let Some(existing) = self.entries.get(&(kind, key.clone())) {
            if existing.uuid == uuid {
                return Ok(());
            }
            return Err(TrackerError::DuplicateRegistration {
                kind,
                key: key.to_string(),
                existing: existing.uuid,
                attempted: uuid,
            });
        }

        self.entries.insert(
            (kind, key.clone()),
            TrackerEntry {
                uuid,
                backward_compatibility: key.clone(),
                kind,
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    /// Seeds the tracker with mappings read back from the target.
    ///
    /// Keys already registered in this run are kept as they are, since the
    /// in-memory tier is authoritative. Returns the number of new entries.
    pub fn seed<I>(&mut self, kind: EntityKind, mappings: I) -> usize
    where
        I: IntoIterator<Item = (BackwardCompatibilityKey, Uuid)>,
    {
        let mut added = 0;
        for (key, uuid) in mappings {
            if self.exists(&key, kind) {
                continue;
            }
            if self.register(&key, kind, uuid).is_ok() {
                added += 1;
            }
        }
        added
    }

    /// Returns `true` if the key is registered for this kind.
    #[must_use]
    pub fn exists(&self, key: &BackwardCompatibilityKey, kind: EntityKind) -> bool {
        self.entries.contains_key(&(kind, key.clone()))
    }

    /// Returns the UUID registered for the key, if any.
    #[must_use]
    pub fn get_uuid(&self, key: &BackwardCompatibilityKey, kind: EntityKind) -> Option<Uuid> {
        self.entries.get(&(kind, key.clone())).map(|entry| entry.uuid)
    }

    /// Returns the full entry for the key, if any.
    #[must_use]
    pub fn get(&self, key: &BackwardCompatibilityKey, kind: EntityKind) -> Option<&TrackerEntry> {
        self.entries.get(&(kind, key.clone()))
    }

    /// Total number of registrations.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of registrations of one kind.
    #[must_use]
    pub fn count(&self, kind: EntityKind) -> usize {
        self.entries.keys().filter(|(k, _)| *k == kind).count()
    }

    /// Iterates over all entries of one kind, in no particular order.
    pub fn entries_of(&self, kind: EntityKind) -> impl Iterator<Item = &TrackerEntry> {
        self.entries.values().filter(move |entry| entry.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(parts: &[&str]) -> BackwardCompatibilityKey {
        BackwardCompatibilityKey::new("mwnf3", "objects", parts)
    }

    #[test]
    fn test_register_and_lookup() {
        let mut tracker = Tracker::new();
        let id = Uuid::new_v4();
        tracker.register(&key(&["P1", "USA", "M1", "0001"]), EntityKind::Item, id).unwrap();

        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.get_uuid(&key(&["P1", "USA", "M1", "0001"]), EntityKind::Item), Some(id));
        assert_eq!(tracker.get_uuid(&key(&["P1", "USA", "M1", "0002"]), EntityKind::Item), None);
    }

    #[test]
    fn test_register_identical_is_noop() {
        let mut tracker = Tracker::new();
        let id = Uuid::new_v4();
        let k = key(&["P1"]);
        tracker.register(&k, EntityKind::Item, id).unwrap();
        tracker.register(&k, EntityKind::Item, id).unwrap();
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_register_conflicting_uuid_fails_and_keeps_first() {
        let mut tracker = Tracker::new();
        let first = Uuid::new_v4();
        let k = key(&["P1"]);
        tracker.register(&k, EntityKind::Item, first).unwrap();

        let err = tracker.register(&k, EntityKind::Item, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, TrackerError::DuplicateRegistration { existing, .. } if existing == first));
        assert_eq!(tracker.get_uuid(&k, EntityKind::Item), Some(first));
    }

    #[test]
    fn test_kinds_do_not_collide() {
        let mut tracker = Tracker::new();
        let k = BackwardCompatibilityKey::new("mwnf3", "projects", ["P1"]);
        let context = Uuid::new_v4();
        let collection = Uuid::new_v4();
        tracker.register(&k, EntityKind::Context, context).unwrap();
        tracker.register(&k, EntityKind::Collection, collection).unwrap();

        assert_eq!(tracker.get_uuid(&k, EntityKind::Context), Some(context));
        assert_eq!(tracker.get_uuid(&k, EntityKind::Collection), Some(collection));
        assert_eq!(tracker.count(EntityKind::Context), 1);
    }

    #[test]
    fn test_seed_keeps_in_memory_entries() {
        let mut tracker = Tracker::new();
        let k = key(&["P1"]);
        let placeholder = Uuid::new_v4();
        tracker.register(&k, EntityKind::Item, placeholder).unwrap();

        let added = tracker.seed(
            EntityKind::Item,
            vec![(k.clone(), Uuid::new_v4()), (key(&["P2"]), Uuid::new_v4())],
        );
        assert_eq!(added, 1);
        assert_eq!(tracker.get_uuid(&k, EntityKind::Item), Some(placeholder));
        assert_eq!(tracker.entries_of(EntityKind::Item).count(), 2);
    }
}
