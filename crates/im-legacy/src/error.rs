//! Error types for the im-legacy crate.

/// Errors raised while reading the legacy source.
///
/// Every variant is an infrastructure failure: the importer that hit it
/// stops and the run is aborted.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Could not open a connection to the legacy database.
    #[error("failed to connect to legacy source: {0}")]
    Connect(#[source] sqlx::Error),

    /// A query against one legacy table failed.
    #[error("failed to read legacy table '{table}': {source}")]
    Query {
        /// Legacy table name.
        table: &'static str,
        /// The underlying driver error.
        #[source]
        source: sqlx::Error,
    },

    /// The configured schema name is not a plain identifier.
    #[error("invalid legacy schema name '{0}'")]
    InvalidSchema(String),
}

impl SourceError {
    /// Creates a new [`SourceError::Query`] error.
    #[inline]
    pub fn query(table: &'static str, source: sqlx::Error) -> Self {
        Self::Query { table, source }
    }

    /// Returns the legacy table associated with this error, if any.
    #[must_use]
    pub fn table(&self) -> Option<&'static str> {
        match self {
            Self::Query { table, .. } => Some(table),
            Self::Connect(_) | Self::InvalidSchema(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_names_table() {
        let err = SourceError::query("objects", sqlx::Error::RowNotFound);
        assert_eq!(err.table(), Some("objects"));
        assert!(err.to_string().contains("'objects'"));
    }

    #[test]
    fn test_invalid_schema_display() {
        let err = SourceError::InvalidSchema("a;b".to_owned());
        assert_eq!(err.to_string(), "invalid legacy schema name 'a;b'");
        assert!(err.table().is_none());
    }
}
