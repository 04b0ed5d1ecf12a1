//! Name and value normalisation.
//!
//! Shared reference entities (tags, authors, artists, partners named in free
//! text) are identified by a normalised name. Identity is case-insensitive
//! and whitespace-collapsed; the stored display value keeps the casing of
//! the first occurrence.

/// Collapses runs of whitespace to a single space and trims both ends.
///
/// # Examples
///
/// ```
/// use im_core::normalize::display_name;
///
/// assert_eq!(display_name("  Gold   leaf "), "Gold leaf");
/// ```
#[must_use]
pub fn display_name(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the comparison form of a name: [`display_name`] lowercased.
///
/// # Examples
///
/// ```
/// use im_core::normalize::normalize_name;
///
/// assert_eq!(normalize_name("GOLD"), normalize_name(" gold"));
/// ```
#[must_use]
pub fn normalize_name(value: &str) -> String {
    display_name(value).to_lowercase()
}

/// Splits a legacy list field (`"Gold;silver, Bronze"`) into display names.
///
/// Both `;` and `,` separate values. Empty entries are dropped and
/// duplicates that differ only by case are removed, keeping the first.
#[must_use]
pub fn split_list(value: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for part in value.split([';', ',']) {
        let name = display_name(part);
        if name.is_empty() {
            continue;
        }
        let folded = name.to_lowercase();
        if seen.contains(&folded) {
            continue;
        }
        seen.push(folded);
        out.push(name);
    }
    out
}

/// Trims a value and maps empty strings to `None`.
#[must_use]
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_mixed_separators() {
        assert_eq!(
            split_list("Gold; silver ,bronze;;"),
            vec!["Gold", "silver", "bronze"]
        );
    }

    #[test]
    fn test_split_list_case_duplicates() {
        assert_eq!(split_list("Gold;gold;GOLD"), vec!["Gold"]);
    }

    #[test]
    fn test_split_list_empty() {
        assert!(split_list(" ; , ").is_empty());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  x ")), Some("x"));
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(None), None);
    }
}
