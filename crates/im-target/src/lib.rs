//! Target writer strategies for the inventory migration.
//!
//! # Architecture
//!
//! - [`fields`] - Fully resolved field sets, one per target entity
//! - [`outcome`] - [`WriteOutcome`]: created, conflict or record error
//! - [`writer`] - The [`TargetWriter`] seam
//! - [`rest`] - [`RestWriter`], one REST call per write
//! - [`database`] - [`PgWriter`], direct Postgres inserts with batching
//! - [`dry_run`] - [`DryRunWriter`], reads through, writes suppressed
//!
//! A conflict is never an error: callers resolve it by looking the record
//! up with [`TargetWriter::find_by_backward_compatibility`].

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod database;
pub mod dry_run;
pub mod error;
pub mod fields;
pub mod outcome;
pub mod rest;
pub mod writer;

pub use database::PgWriter;
pub use dry_run::DryRunWriter;
pub use error::WriteError;
pub use fields::{
    FieldSet, ItemType, NewArtist, NewAuthor, NewCollection, NewCollectionTranslation, NewContext,
    NewItem, NewItemImage, NewItemItemLink, NewItemTranslation, NewPartner, NewPartnerLogo,
    NewPartnerTranslation, NewProject, NewTag, PartnerType, TagCategory,
};
pub use outcome::{WriteOutcome, WriteResult};
pub use rest::RestWriter;
pub use writer::TargetWriter;
