//! Read-only access to the legacy inventory database.
//!
//! The legacy schema is denormalised: most tables carry one row per
//! `(entity, language)` pair. This crate exposes one record type per table
//! ([`rows`]), the [`LegacySource`] seam the engine reads through, and the
//! MySQL implementation of it ([`MySqlLegacySource`]).
//!
//! Nothing in this crate writes to the legacy database.

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod mysql;
pub mod rows;
pub mod source;

pub use error::SourceError;
pub use mysql::MySqlLegacySource;
pub use rows::{
    InstitutionRow, LinkRow, LinkTable, MonumentRow, MuseumRow, ObjectRow, PictureRow,
    PictureTable, ProjectNameRow, ProjectRow,
};
pub use source::LegacySource;
