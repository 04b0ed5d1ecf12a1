//! Result of a single write.

use uuid::Uuid;

use crate::error::WriteError;

/// What happened to one write.
///
/// Conflicts are an ordinary branch: the caller resolves them by looking
/// the record up by its backward-compatibility value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The record was created with this identifier.
    Created(Uuid),
    /// The target already holds a record with the same backward
    /// compatibility value or unique name.
    Conflict,
    /// The target rejected the record for another reason.
    Error(String),
}

impl WriteOutcome {
    /// Returns the new identifier if the record was created.
    #[inline]
    #[must_use]
    pub const fn created(&self) -> Option<Uuid> {
        match self {
            Self::Created(id) => Some(*id),
            Self::Conflict | Self::Error(_) => None,
        }
    }

    /// Returns `true` for [`WriteOutcome::Conflict`].
    #[inline]
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict)
    }
}

/// Result type of every writer operation that creates one record.
pub type WriteResult = Result<WriteOutcome, WriteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_accessor() {
        let id = Uuid::new_v4();
        assert_eq!(WriteOutcome::Created(id).created(), Some(id));
        assert_eq!(WriteOutcome::Conflict.created(), None);
        assert!(WriteOutcome::Conflict.is_conflict());
        assert!(!WriteOutcome::Error("bad".to_owned()).is_conflict());
    }
}
