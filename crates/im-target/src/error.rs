//! Error types for the im-target crate.
//!
//! [`WriteError`] covers failures that are not about one record: the
//! target is unreachable, answers with a server error, or returns a body
//! that cannot be understood. Record-level rejections are reported through
//! [`WriteOutcome::Error`](crate::WriteOutcome::Error) instead, except for
//! association calls which have no outcome of their own and use
//! [`WriteError::Rejected`].
//!
//! # Error Recovery Strategy
//!
//! - **Rejected** ([`WriteError::Rejected`]): record error, importer continues
//! - **Everything else**: fatal, the importer stops and the run is aborted

use im_core::EntityKind;

/// Infrastructure failures talking to the target system.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The HTTP request could not be sent or its body not read.
    #[error("request to {url} failed: {source}")]
    Transport {
        /// Request URL.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The target answered with a status the writer cannot act on.
    #[error("target returned {status} for {url}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Request URL.
        url: String,
        /// Response body, truncated.
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("malformed response for {kind}: {detail}")]
    Decode {
        /// Entity kind being written or read.
        kind: EntityKind,
        /// What was wrong with the body.
        detail: String,
    },

    /// A database operation failed for a reason other than a constraint
    /// on the record being written.
    #[error("database error on {table}: {source}")]
    Database {
        /// Target table.
        table: &'static str,
        /// The underlying driver error.
        #[source]
        source: sqlx::Error,
    },

    /// The target refused an association for this record.
    #[error("target rejected {what}: {detail}")]
    Rejected {
        /// What was being applied, e.g. `tags for item <uuid>`.
        what: String,
        /// Rejection detail from the target.
        detail: String,
    },

    /// The writer could not be constructed.
    #[error("invalid writer configuration: {0}")]
    Config(String),
}

impl WriteError {
    /// Creates a new [`WriteError::Transport`] error.
    #[inline]
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    /// Creates a new [`WriteError::Decode`] error.
    #[inline]
    pub fn decode(kind: EntityKind, detail: impl Into<String>) -> Self {
        Self::Decode {
            kind,
            detail: detail.into(),
        }
    }

    /// Creates a new [`WriteError::Database`] error.
    #[inline]
    pub fn database(table: &'static str, source: sqlx::Error) -> Self {
        Self::Database { table, source }
    }

    /// Returns `true` if the importer can record the failure against the
    /// current record and continue.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Returns `true` if the run must stop.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }
}

/// Truncates a response body for inclusion in an error message.
pub(crate) fn excerpt(body: &str) -> String {
    const LIMIT: usize = 300;
    if body.len() <= LIMIT {
        return body.to_owned();
    }
    let mut end = LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_is_recoverable() {
        let err = WriteError::Rejected {
            what: "tags for item x".to_owned(),
            detail: "unknown tag".to_owned(),
        };
        assert!(err.is_recoverable());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_status_is_fatal() {
        let err = WriteError::Status {
            status: 503,
            url: "http://t/api/item".to_owned(),
            body: "down".to_owned(),
        };
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "target returned 503 for http://t/api/item: down");
    }

    #[test]
    fn test_decode_names_kind() {
        let err = WriteError::decode(EntityKind::ItemImage, "missing id");
        assert_eq!(err.to_string(), "malformed response for item_image: missing id");
    }

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let body = "é".repeat(400);
        let short = excerpt(&body);
        assert!(short.ends_with('…'));
        assert!(short.len() <= 300 + '…'.len_utf8());
        assert_eq!(excerpt("short"), "short");
    }
}
