//! Sample collection.
//!
//! In sample mode, importers record representative legacy rows into a
//! SQLite file that is later used to build deterministic test fixtures.
//! The store is deleted and re-created at the start of every collection
//! run and holds at most `limit` rows per category.
//!
//! Writing a sample is a side channel: failures are logged at `warn` and
//! never reach the tracker, the writer or the import result.

use std::fmt;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use rustc_hash::FxHashMap;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{info, warn};

use crate::error::EngineError;

const SCHEMA: &str = "CREATE TABLE samples (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category TEXT NOT NULL,
    source_table TEXT NOT NULL,
    backward_compatibility TEXT NOT NULL,
    payload TEXT NOT NULL,
    collected_at TEXT NOT NULL
)";

/// Edge conditions worth a sample category of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// A referenced entity was never imported.
    MissingDependency,
    /// A name was substituted.
    FallbackName,
    /// A description was substituted.
    FallbackDescription,
    /// No translation in the default language.
    NoDefaultLanguage,
    /// A description carried HTML.
    HtmlDescription,
}

impl Condition {
    /// Snake case name used in categories.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingDependency => "missing_dependency",
            Self::FallbackName => "fallback_name",
            Self::FallbackDescription => "fallback_description",
            Self::NoDefaultLanguage => "no_default_language",
            Self::HtmlDescription => "html_description",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the category for an entity, optionally qualified by a
/// condition: `item` or `item:fallback_name`.
#[must_use]
pub fn category(entity: &str, condition: Option<Condition>) -> String {
    match condition {
        Some(condition) => format!("{entity}:{condition}"),
        None => entity.to_owned(),
    }
}

/// SQLite journal file next to the store, e.g. `samples.sqlite-wal`.
fn sidecar(path: &Utf8Path, suffix: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{path}{suffix}"))
}

/// Bounded per-category sample store.
#[derive(Debug)]
pub struct SampleCollector {
    pool: SqlitePool,
    path: Utf8PathBuf,
    limit: usize,
    counts: FxHashMap<String, usize>,
}

impl SampleCollector {
    /// Deletes any existing store at `path` and creates a fresh one.
    pub async fn create(path: &Utf8Path, limit: usize) -> Result<Self, EngineError> {
        let fail = |detail: String| EngineError::Samples {
            path: path.to_string(),
            detail,
        };

        for file in [path.to_owned(), sidecar(path, "-wal"), sidecar(path, "-shm")] {
            if file.exists() {
                fs::remove_file(&file).map_err(|err| fail(err.to_string()))?;
            }
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| fail(err.to_string()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path.as_std_path())
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|err| fail(err.to_string()))?;
        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|err| fail(err.to_string()))?;
        sqlx::query("CREATE INDEX samples_category ON samples (category)")
            .execute(&pool)
            .await
            .map_err(|err| fail(err.to_string()))?;

        info!(path = %path, limit, "sample store created");
        Ok(Self {
            pool,
            path: path.to_owned(),
            limit: limit.max(1),
            counts: FxHashMap::default(),
        })
    }

    /// Records one row under `category` unless the category is full.
    pub async fn record<T: Serialize + ?Sized + Sync>(
        &mut self,
        category: &str,
        source_table: &str,
        backward_compatibility: &str,
        row: &T,
    ) {
        if self.counts.get(category).copied().unwrap_or(0) >= self.limit {
            return;
        }

        let payload = match serde_json::to_string(row) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(category, backward_compatibility, error = %err, "could not serialise sample");
                return;
            }
        };

        let inserted = sqlx::query(
            "INSERT INTO samples (category, source_table, backward_compatibility, payload, collected_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(category)
        .bind(source_table)
        .bind(backward_compatibility)
        .bind(payload)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => *self.counts.entry(category.to_owned()).or_insert(0) += 1,
            Err(err) => warn!(category, backward_compatibility, error = %err, "could not store sample"),
        }
    }

    /// Number of samples stored in a category.
    #[must_use]
    pub fn count(&self, category: &str) -> usize {
        self.counts.get(category).copied().unwrap_or(0)
    }

    /// Total samples stored.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Location of the store.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Closes the store, flushing pending writes.
    pub async fn close(self) {
        self.pool.close().await;
    }
}
