//! Domain types for the migration engine.
//!
//! # Module Organization
//!
//! - [`kind`] - The closed [`EntityKind`] enumeration
//! - [`key`] - Canonical [`BackwardCompatibilityKey`] strings
//! - [`result`] - Per-importer [`ImportResult`] counters and issues
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use im_core::{BackwardCompatibilityKey, EntityKind, ImportResult};
//! ```

pub mod key;
pub mod kind;
pub mod result;

pub use key::{BackwardCompatibilityKey, KEY_SEPARATOR};
pub use kind::EntityKind;
pub use result::{ImportIssue, ImportResult};
