//! Core types, errors, and utilities for the inventory migration engine.
//!
//! This crate provides the foundational, I/O-free pieces used across the
//! workspace:
//!
//! - Error types for consistent error handling ([`ConfigError`], [`TrackerError`])
//! - Configuration structures ([`Config`] and its sections)
//! - Domain types ([`EntityKind`], [`BackwardCompatibilityKey`], [`ImportResult`])
//! - The backward-compatibility [`Tracker`]
//! - The legacy row grouper ([`group_rows`], [`EntityGroup`])
//! - Text helpers: name normalisation, HTML to markdown, legacy code mapping

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod codes;
pub mod config;
pub mod error;
pub mod group;
pub mod markdown;
pub mod normalize;
pub mod tracker;
pub mod types;

pub use config::{Config, ImportConfig, LegacyConfig, LogConfig, TargetConfig, TargetMode};
pub use error::{ConfigError, TrackerError};
pub use group::{group_rows, EntityGroup};
pub use tracker::{Tracker, TrackerEntry};
pub use types::{BackwardCompatibilityKey, EntityKind, ImportIssue, ImportResult};
