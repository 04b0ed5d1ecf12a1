//! Error types for the im-core crate.
//!
//! This module provides [`ConfigError`] for configuration loading and
//! validation, and [`TrackerError`] for misuse of the backward-compatibility
//! [`Tracker`](crate::Tracker).

use camino::Utf8PathBuf;
use uuid::Uuid;

use crate::types::EntityKind;

/// Errors that can occur during configuration loading and validation.
///
/// # Examples
///
/// ```
/// use im_core::ConfigError;
///
/// let error = ConfigError::InvalidOption {
///     option: "import.sample_size".to_owned(),
///     reason: "must be positive".to_owned(),
/// };
/// assert!(error.to_string().contains("sample_size"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("configuration file not found: {0}")]
    MissingFile(Utf8PathBuf),

    /// A required setting was not provided by file, flag or environment.
    #[error("missing required setting '{0}'")]
    MissingSetting(&'static str),

    /// A configuration option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },

    /// An I/O error occurred while reading configuration.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Creates a new [`ConfigError::InvalidOption`] error.
    #[inline]
    pub fn invalid(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by the backward-compatibility tracker.
///
/// Registration is write-once: a second registration of the same key
/// with a *different* identifier is a caller bug and is reported rather
/// than silently overwriting the first mapping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    /// The key is already registered for this kind with another UUID.
    #[error("{kind} '{key}' is already registered as {existing}, refusing to remap to {attempted}")]
    DuplicateRegistration {
        /// Entity kind namespace of the key.
        kind: EntityKind,
        /// The backward-compatibility key.
        key: String,
        /// The UUID already stored.
        existing: Uuid,
        /// The UUID the caller tried to register.
        attempted: Uuid,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_display() {
        let error = ConfigError::MissingFile(Utf8PathBuf::from("/etc/migrate.json"));
        assert!(error.to_string().contains("/etc/migrate.json"));
    }

    #[test]
    fn test_invalid_option_display() {
        let error = ConfigError::invalid("target.page_size", "must be positive");
        let msg = error.to_string();
        assert!(msg.contains("target.page_size"));
        assert!(msg.contains("must be positive"));
    }

    #[test]
    fn test_duplicate_registration_display() {
        let error = TrackerError::DuplicateRegistration {
            kind: EntityKind::Item,
            key: "mwnf3:objects:P1:USA:M1:0001".to_owned(),
            existing: Uuid::nil(),
            attempted: Uuid::from_u128(1),
        };
        let msg = error.to_string();
        assert!(msg.starts_with("item 'mwnf3:objects:P1:USA:M1:0001'"));
        assert!(msg.contains("refusing to remap"));
    }
}
