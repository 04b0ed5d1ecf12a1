//! Item images from the picture tables.

use im_core::codes::language_code;
use im_core::{BackwardCompatibilityKey, EntityGroup};
use im_legacy::{PictureRow, PictureTable};

use super::{text, Notes, Skip};

/// What to write for one legacy picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PicturePlan {
    /// Parent item key plus image number, in the picture table.
    pub key: BackwardCompatibilityKey,
    /// Key of the item the picture belongs to.
    pub parent_key: BackwardCompatibilityKey,
    /// Stored path.
    pub path: String,
    /// File name part of the path.
    pub original_name: String,
    /// Caption in the default language, or the first caption.
    pub alt_text: Option<String>,
    /// Image number, or the position among the item's pictures.
    pub display_order: i32,
    /// Warnings.
    pub notes: Notes,
}

/// Plans a picture. `position` is the picture's one-based position among
/// the pictures read, used when the image number is not numeric.
pub fn picture(
    schema: &str,
    default_language: &str,
    table: PictureTable,
    group: &EntityGroup<[String; 5], PictureRow>,
    position: usize,
) -> Result<PicturePlan, Skip> {
    let mut notes = Notes::default();
    let first = group.first();
    let key = BackwardCompatibilityKey::new(schema, table.table(), group.key());
    let parent_key = BackwardCompatibilityKey::new(schema, table.parent_table(), first.parent_key());

    let Some(path) = group.iter().find_map(|row| text(row.path.as_ref())) else {
        return Err(Skip("picture has no path".to_owned()));
    };
    let original_name = path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(path.as_str())
        .to_owned();

    let alt_text = group
        .find(|row| language_code(&row.lang) == Some(default_language))
        .and_then(|row| text(row.caption.as_ref()))
        .or_else(|| group.iter().find_map(|row| text(row.caption.as_ref())));

    let display_order = first.image_number.parse::<i32>().unwrap_or_else(|_| {
        notes.warn(format!(
            "image number '{}' is not numeric, ordered by position",
            first.image_number
        ));
        i32::try_from(position).unwrap_or(i32::MAX)
    });

    Ok(PicturePlan {
        key,
        parent_key,
        path,
        original_name,
        alt_text,
        display_order,
        notes,
    })
}
