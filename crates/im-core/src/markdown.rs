//! HTML to markdown normalisation for legacy rich-text fields.
//!
//! Legacy descriptions were edited in a WYSIWYG editor and carry a small,
//! predictable subset of HTML. The target stores markdown, so the subset is
//! rewritten with regular expressions and the result is parsed as an HTML
//! fragment whose text content (entities decoded) is kept.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?is)</?[a-z][a-z0-9]*(\s[^>]*)?/?>"));
static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)<br\s*/?>"));
static PARAGRAPH_END: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)</p\s*>"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)<(b|strong)(\s[^>]*)?>(.*?)</(b|strong)\s*>"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)<(i|em)(\s[^>]*)?>(.*?)</(i|em)\s*>"));
static LINK: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r#"(?is)<a\s[^>]*href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a\s*>"#)
});
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)<li(\s[^>]*)?>"));
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?i)&(#[0-9]+|#x[0-9a-f]+|[a-z][a-z0-9]*);"));
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| pattern(r"\n[ \t]*\n(\s*\n)+"));

#[allow(clippy::expect_used)]
fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("static pattern compiles")
}

/// Returns `true` if the value contains anything that looks like an HTML tag
/// or an HTML entity.
#[must_use]
pub fn contains_html(value: &str) -> bool {
    ANY_TAG.is_match(value) || ENTITY.is_match(value)
}

/// Converts the legacy HTML subset to markdown.
///
/// Paragraphs and `<br>` become line breaks, `<b>/<strong>` become `**`,
/// `<i>/<em>` become `*`, anchors become inline links and list items become
/// `- ` bullets. Other tags are dropped and entities decoded.
///
/// # Examples
///
/// ```
/// use im_core::markdown::html_to_markdown;
///
/// let md = html_to_markdown("<p>A <b>gold</b> bowl</p><p>See <a href=\"https://x.org\">here</a></p>");
/// assert_eq!(md, "A **gold** bowl\n\nSee [here](https://x.org)");
/// ```
#[must_use]
pub fn html_to_markdown(html: &str) -> String {
    let text = html.replace("\r\n", "\n");
    let text = LINK.replace_all(&text, "[$2]($1)");
    let text = BOLD.replace_all(&text, "**$3**");
    let text = ITALIC.replace_all(&text, "*$3*");
    let text = LIST_ITEM.replace_all(&text, "\n- ");
    let text = PARAGRAPH_END.replace_all(&text, "\n\n");
    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = text_content(&text);
    let text = text
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    BLANK_LINES.replace_all(&text, "\n\n").trim().to_owned()
}

/// Text of an HTML fragment: tags dropped, character references decoded,
/// non-breaking spaces turned into plain spaces.
fn text_content(fragment: &str) -> String {
    Html::parse_fragment(fragment)
        .root_element()
        .text()
        .collect::<String>()
        .replace('\u{a0}', " ")
}
