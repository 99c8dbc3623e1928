//! Text cleaning and folding utilities.
//!
//! Article bodies arrive from LeyChile with hard-wrapped lines, runs of
//! blank lines and stray indentation. [`clean`] turns them into the
//! canonical display form; everything else here is derived from it.

use regex::Regex;
use std::sync::LazyLock;
use textwrap::{fill, Options};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::config::TEXT_WRAP_WIDTH;

/// Runs of horizontal whitespace (including no-break spaces).
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static HORIZONTAL_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{a0}]+").expect("valid regex"));

/// Two or more newlines, possibly separated by whitespace.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n+").expect("valid regex"));

/// Any run of whitespace, newlines included.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ANY_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Collapse whitespace and blank lines into the canonical display form.
///
/// # Examples
/// ```
/// use leychile_harvester::text::clean;
///
/// assert_eq!(clean("  Artículo 1.-   El  texto\n\n\n  sigue  "), "Artículo 1.- El texto\nsigue");
/// assert_eq!(clean(""), "");
/// ```
pub fn clean(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let text = HORIZONTAL_WHITESPACE.replace_all(&text, " ");
    let text = BLANK_LINES.replace_all(&text, "\n");

    text.split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Collapse every whitespace run (newlines included) to a single space.
pub fn single_line(text: &str) -> String {
    ANY_WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Truncate `text` to at most `max_chars` characters, appending `marker`.
///
/// The cut falls back to the last space inside the limit so words are not
/// split. Text at or below the limit is returned unchanged.
///
/// # Examples
/// ```
/// use leychile_harvester::text::truncate;
///
/// assert_eq!(truncate("uno dos tres", 100, "[...]"), "uno dos tres");
/// assert_eq!(truncate("uno dos tres", 9, "[...]"), "uno dos[...]");
/// ```
pub fn truncate(text: &str, max_chars: usize, marker: &str) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let head = &text[..cut];
    let head = match head.rfind(' ') {
        Some(space) if space > 0 => &head[..space],
        _ => head,
    };
    format!("{}{marker}", head.trim_end())
}

/// Lowercase and strip diacritics ("Artículo" → "articulo").
///
/// Ordinal markers such as `º` and `ª` are not combining marks and survive.
pub fn fold_accents(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Wrap text at the given width, keeping existing line breaks.
pub fn wrap_text(text: &str, width: usize) -> String {
    let options = Options::new(width);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                fill(line, &options)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap text with default width.
pub fn wrap_text_default(text: &str) -> String {
    wrap_text(text, TEXT_WRAP_WIDTH)
}
