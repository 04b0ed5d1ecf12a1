//! Legacy language and country code mapping.
//!
//! The legacy schema stores two-letter language codes and a mix of
//! two-letter and three-letter country codes. The target identifies
//! languages by ISO 639-3 and countries by ISO 3166-1 alpha-3 codes, which
//! are reference data seeded outside the migration.

/// Two-letter legacy language code to ISO 639-3.
const LANGUAGES: &[(&str, &str)] = &[
    ("ar", "ara"),
    ("ca", "cat"),
    ("cs", "ces"),
    ("da", "dan"),
    ("de", "deu"),
    ("el", "ell"),
    ("en", "eng"),
    ("es", "spa"),
    ("fa", "fas"),
    ("fi", "fin"),
    ("fr", "fra"),
    ("he", "heb"),
    ("hr", "hrv"),
    ("hu", "hun"),
    ("it", "ita"),
    ("ja", "jpn"),
    ("nl", "nld"),
    ("pl", "pol"),
    ("pt", "por"),
    ("ro", "ron"),
    ("ru", "rus"),
    ("sl", "slv"),
    ("sq", "sqi"),
    ("sv", "swe"),
    ("tr", "tur"),
    ("zh", "zho"),
    // Legacy aliases
    ("ch", "zho"),
    ("gr", "ell"),
    ("se", "swe"),
];

/// ISO 639-3 codes accepted verbatim when the legacy row already uses them.
const KNOWN_LANGUAGES: &[&str] = &[
    "ara", "cat", "ces", "dan", "deu", "ell", "eng", "fas", "fin", "fra", "heb", "hrv", "hun",
    "ita", "jpn", "nld", "pol", "por", "ron", "rus", "slv", "spa", "sqi", "swe", "tur", "zho",
];

/// Two-letter legacy country code to ISO 3166-1 alpha-3.
const COUNTRIES: &[(&str, &str)] = &[
    ("ae", "are"),
    ("al", "alb"),
    ("at", "aut"),
    ("ba", "bih"),
    ("be", "bel"),
    ("bg", "bgr"),
    ("ch", "che"),
    ("cy", "cyp"),
    ("cz", "cze"),
    ("de", "deu"),
    ("dk", "dnk"),
    ("dz", "dza"),
    ("eg", "egy"),
    ("es", "esp"),
    ("fr", "fra"),
    ("gb", "gbr"),
    ("gr", "grc"),
    ("hr", "hrv"),
    ("hu", "hun"),
    ("il", "isr"),
    ("iq", "irq"),
    ("ir", "irn"),
    ("it", "ita"),
    ("jo", "jor"),
    ("lb", "lbn"),
    ("ly", "lby"),
    ("ma", "mar"),
    ("mt", "mlt"),
    ("nl", "nld"),
    ("pl", "pol"),
    ("ps", "pse"),
    ("pt", "prt"),
    ("qa", "qat"),
    ("ro", "rou"),
    ("ru", "rus"),
    ("sa", "sau"),
    ("se", "swe"),
    ("si", "svn"),
    ("sy", "syr"),
    ("tn", "tun"),
    ("tr", "tur"),
    ("us", "usa"),
    ("ye", "yem"),
    // Legacy aliases
    ("uk", "gbr"),
    ("pa", "pse"),
];

/// Maps a legacy language code to its ISO 639-3 form.
///
/// # Examples
///
/// ```
/// use im_core::codes::language_code;
///
/// assert_eq!(language_code("en"), Some("eng"));
/// assert_eq!(language_code(" FR "), Some("fra"));
/// assert_eq!(language_code("deu"), Some("deu"));
/// assert_eq!(language_code("xx"), None);
/// ```
#[must_use]
pub fn language_code(legacy: &str) -> Option<&'static str> {
    let code = legacy.trim().to_ascii_lowercase();
    match code.len() {
        2 => lookup(LANGUAGES, &code),
        3 => KNOWN_LANGUAGES.iter().copied().find(|known| *known == code),
        _ => None,
    }
}

/// Maps a legacy country code to its ISO 3166-1 alpha-3 form.
///
/// Three-letter alphabetic codes are taken as already being alpha-3 and
/// lowercased.
///
/// # Examples
///
/// ```
/// use im_core::codes::country_code;
///
/// assert_eq!(country_code("eg").as_deref(), Some("egy"));
/// assert_eq!(country_code("USA").as_deref(), Some("usa"));
/// assert_eq!(country_code("??"), None);
/// ```
#[must_use]
pub fn country_code(legacy: &str) -> Option<String> {
    let code = legacy.trim().to_ascii_lowercase();
    match code.len() {
        2 => lookup(COUNTRIES, &code).map(ToOwned::to_owned),
        3 if code.bytes().all(|b| b.is_ascii_lowercase()) => Some(code),
        _ => None,
    }
}

fn lookup(table: &[(&str, &'static str)], code: &str) -> Option<&'static str> {
    table
        .iter()
        .find_map(|(legacy, iso)| (*legacy == code).then_some(*iso))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_aliases() {
        assert_eq!(language_code("ch"), Some("zho"));
        assert_eq!(language_code("gr"), Some("ell"));
    }

    #[test]
    fn test_language_rejects_unknown_three_letter() {
        assert_eq!(language_code("xyz"), None);
        assert_eq!(language_code(""), None);
    }

    #[test]
    fn test_country_aliases() {
        assert_eq!(country_code("uk").as_deref(), Some("gbr"));
        assert_eq!(country_code("Pa").as_deref(), Some("pse"));
    }

    #[test]
    fn test_country_rejects_non_alpha() {
        assert_eq!(country_code("12a"), None);
        assert_eq!(country_code("abcd"), None);
    }
}
