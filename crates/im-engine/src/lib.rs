//! Import engine for the inventory migration.
//!
//! # Architecture
//!
//! - [`transform`] - Pure mapping from legacy groups to target plans
//! - [`context`] - [`ImportContext`]: source, writer, tracker and samples
//! - [`lookup`] - Find-or-create for tags, authors, artists and holders
//! - [`importer`] - The [`Importer`] seam
//! - [`importers`] - One importer per legacy entity family
//! - [`orchestrator`] - Ordered phases, dependency loading, abort on error
//! - [`summary`] - [`RunSummary`] table and JSON rendering
//! - [`samples`] - SQLite sample collection for fixtures
//!
//! # Example
//!
//! ```no_run
//! use im_engine::{ImportContext, ImportSettings, Orchestrator, Selection};
//!
//! # async fn run(
//! #     source: Box<dyn im_legacy::LegacySource>,
//! #     writer: Box<dyn im_target::TargetWriter>,
//! # ) -> Result<(), im_engine::EngineError> {
//! let mut ctx = ImportContext::new(source, writer, ImportSettings::default());
//! let summary = Orchestrator::with_default_importers()
//!     .run(&mut ctx, &Selection::default())
//!     .await?;
//! print!("{}", summary.render_table());
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod importer;
pub mod importers;
pub mod lookup;
pub mod orchestrator;
pub mod samples;
pub mod summary;
pub mod transform;

pub use context::{ImportContext, ImportSettings, Resolution};
pub use error::EngineError;
pub use importer::Importer;
pub use importers::registry;
pub use orchestrator::{Orchestrator, PhaseState, Selection};
pub use samples::{Condition, SampleCollector};
pub use summary::{PhaseSummary, RunSummary, Totals};
