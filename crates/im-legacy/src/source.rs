//! The legacy source seam.

use async_trait::async_trait;

use crate::error::SourceError;
use crate::rows::{
    InstitutionRow, LinkRow, LinkTable, MonumentRow, MuseumRow, ObjectRow, PictureRow,
    PictureTable, ProjectNameRow, ProjectRow,
};

/// Read-only access to the legacy tables.
///
/// Every method returns tidied rows sorted by natural key, then language,
/// so grouping is deterministic. Implementations never write.
#[async_trait]
pub trait LegacySource: Send + Sync {
    /// Checks that the source is reachable.
    async fn ping(&self) -> Result<(), SourceError>;

    /// Rows of `projects`.
    async fn projects(&self) -> Result<Vec<ProjectRow>, SourceError>;

    /// Rows of `projectnames`.
    async fn project_names(&self) -> Result<Vec<ProjectNameRow>, SourceError>;

    /// Rows of `museums`.
    async fn museums(&self) -> Result<Vec<MuseumRow>, SourceError>;

    /// Rows of `institutions`.
    async fn institutions(&self) -> Result<Vec<InstitutionRow>, SourceError>;

    /// Rows of `objects`.
    async fn objects(&self) -> Result<Vec<ObjectRow>, SourceError>;

    /// Rows of `monuments`.
    async fn monuments(&self) -> Result<Vec<MonumentRow>, SourceError>;

    /// Rows of one picture table.
    async fn pictures(&self, table: PictureTable) -> Result<Vec<PictureRow>, SourceError>;

    /// Rows of one link table.
    async fn links(&self, table: LinkTable) -> Result<Vec<LinkRow>, SourceError>;
}
