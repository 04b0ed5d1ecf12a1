//! Item-to-item links.

use im_core::BackwardCompatibilityKey;
use im_legacy::{LinkRow, LinkTable};

/// What to write for one legacy link row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPlan {
    /// Both endpoint keys, in the link table.
    pub key: BackwardCompatibilityKey,
    /// The source object.
    pub source_key: BackwardCompatibilityKey,
    /// The linked object or monument.
    pub target_key: BackwardCompatibilityKey,
    /// Project of the source object, whose context the link belongs to.
    pub context_key: BackwardCompatibilityKey,
}

/// Plans a link.
#[must_use]
pub fn link(schema: &str, table: LinkTable, row: &LinkRow) -> LinkPlan {
    let from = row.from_key();
    let to = row.to_key();
    LinkPlan {
        key: BackwardCompatibilityKey::new(schema, table.table(), from.iter().chain(&to)),
        source_key: BackwardCompatibilityKey::new(schema, "objects", from),
        target_key: BackwardCompatibilityKey::new(schema, table.target_table(), to),
        context_key: BackwardCompatibilityKey::new(schema, "projects", [from[0]]),
    }
}
