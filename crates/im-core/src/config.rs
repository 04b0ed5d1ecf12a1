//! Configuration structures for the inventory migration tool.
//!
//! - [`LegacyConfig`] - Legacy source connection and schema
//! - [`TargetConfig`] - Target writer strategy and connection
//! - [`ImportConfig`] - Import behaviour (default language, samples)
//! - [`LogConfig`] - Persisted log file location
//! - [`Config`] - Root configuration combining all settings
//!
//! All sections implement [`Default`]. A JSON file may override any subset
//! of fields; CLI flags and environment variables are applied on top by the
//! binary.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Persistence strategy for the target system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMode {
    /// Write through the target's REST API.
    #[default]
    Api,
    /// Write directly to the target database.
    Database,
}

impl TargetMode {
    /// Parses `api` or `database` (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "api" => Some(Self::Api),
            "database" | "db" => Some(Self::Database),
            _ => None,
        }
    }
}

/// Legacy source settings.
///
/// # Examples
///
/// ```
/// use im_core::LegacyConfig;
///
/// let config = LegacyConfig::default();
/// assert_eq!(config.schema, "mwnf3");
/// assert!(config.database_url.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyConfig {
    /// MySQL connection URL for the legacy database.
    pub database_url: Option<String>,

    /// Legacy schema name, also the first component of every
    /// backward-compatibility key.
    pub schema: String,
}

impl Default for LegacyConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            schema: "mwnf3".to_owned(),
        }
    }
}

/// Target writer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Which writer strategy to use.
    pub mode: TargetMode,

    /// Base URL of the target REST API (api mode).
    pub api_url: Option<String>,

    /// Bearer token for the target REST API (api mode).
    pub api_token: Option<String>,

    /// Postgres connection URL (database mode).
    pub database_url: Option<String>,

    /// Page size used when listing existing records.
    pub page_size: u32,

    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            mode: TargetMode::Api,
            api_url: None,
            api_token: None,
            database_url: None,
            page_size: 100,
            timeout_secs: 30,
        }
    }
}

/// Import behaviour settings.
///
/// # Examples
///
/// ```
/// use im_core::ImportConfig;
///
/// let config = ImportConfig::default();
/// assert_eq!(config.default_language, "eng");
/// assert_eq!(config.sample_size, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// ISO 639-3 code of the language whose translation supplies base
    /// fields and is checked for required values.
    pub default_language: String,

    /// Maximum samples kept per category in sample collection mode.
    pub sample_size: usize,

    /// Path of the SQLite sample store.
    pub sample_db: Utf8PathBuf,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_language: "eng".to_owned(),
            sample_size: 20,
            sample_db: Utf8PathBuf::from("storage/samples.sqlite"),
        }
    }
}

/// Persisted log settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory for timestamped log files.
    pub directory: Utf8PathBuf,

    /// Explicit log file path. Overrides `directory` when set.
    pub file: Option<Utf8PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: Utf8PathBuf::from("storage/logs"),
            file: None,
        }
    }
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use im_core::{Config, TargetMode};
///
/// let config = Config::default();
/// assert_eq!(config.target.mode, TargetMode::Api);
///
/// let json = serde_json::to_string_pretty(&config).unwrap();
/// assert!(json.contains("default_language"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Legacy source configuration.
    pub legacy: LegacyConfig,

    /// Target writer configuration.
    pub target: TargetConfig,

    /// Import behaviour.
    pub import: ImportConfig,

    /// Log file configuration.
    pub log: LogConfig,
}

impl Config {
    /// Loads a configuration file. Missing fields take their defaults.
    pub fn from_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::MissingFile(path.to_owned()));
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Checks that the settings needed by the selected target mode are
    /// present and that numeric limits are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.legacy.database_url.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingSetting("legacy.database_url"));
        }
        if self.legacy.schema.is_empty()
            || !self
                .legacy
                .schema
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            return Err(ConfigError::invalid(
                "legacy.schema",
                "must be a non-empty identifier of letters, digits and underscores",
            ));
        }

        match self.target.mode {
            TargetMode::Api => {
                if self.target.api_url.as_deref().is_none_or(str::is_empty) {
                    return Err(ConfigError::MissingSetting("target.api_url"));
                }
            }
            TargetMode::Database => {
                if self.target.database_url.as_deref().is_none_or(str::is_empty) {
                    return Err(ConfigError::MissingSetting("target.database_url"));
                }
            }
        }

        if self.target.page_size == 0 {
            return Err(ConfigError::invalid("target.page_size", "must be positive"));
        }
        if self.import.sample_size == 0 {
            return Err(ConfigError::invalid("import.sample_size", "must be positive"));
        }
        if crate::codes::language_code(&self.import.default_language).is_none() {
            return Err(ConfigError::invalid(
                "import.default_language",
                format!("unknown language code '{}'", self.import.default_language),
            ));
        }
        Ok(())
    }
}
