//! Article identifier normalization.
//!
//! Chilean statutes number their articles in several incompatible ways:
//! arabic numerals ("Artículo 15"), roman numerals ("XV"), ordinal words
//! ("Artículo primero"), modifier suffixes ("1 bis") and separately
//! numbered transitory articles ("Primero Transitorio"). [`normalize`]
//! maps all of them to one canonical key so two labels can be compared
//! regardless of the convention they were written in:
//!
//! | label                   | canonical id |
//! |-------------------------|--------------|
//! | `Artículo 15`           | `15`         |
//! | `1 bis`, `1BIS`         | `1bis`       |
//! | `XV`                    | `15`         |
//! | `Primero Transitorio`   | `t1`         |
//! | `Artículo Final`        | `final`      |
//! | `Artículo Único`        | `unico`      |
//!
//! The function is pure and idempotent: a canonical id normalizes to itself.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::text::fold_accents;

/// Canonical id of an empty label.
pub const NO_NUMBER: &str = "no-number";

/// Canonical id of a label that reduces to nothing.
pub const NORMALIZATION_ERROR: &str = "normalization-error";

/// Ordinal words (accent-folded) and the identifier they stand for.
const ORDINAL_WORDS: &[(&str, &str)] = &[
    ("primero", "1"),
    ("primera", "1"),
    ("segundo", "2"),
    ("segunda", "2"),
    ("tercero", "3"),
    ("tercera", "3"),
    ("cuarto", "4"),
    ("cuarta", "4"),
    ("quinto", "5"),
    ("quinta", "5"),
    ("sexto", "6"),
    ("sexta", "6"),
    ("septimo", "7"),
    ("septima", "7"),
    ("octavo", "8"),
    ("octava", "8"),
    ("noveno", "9"),
    ("novena", "9"),
    ("decimo", "10"),
    ("decima", "10"),
    ("undecimo", "11"),
    ("undecima", "11"),
    ("duodecimo", "12"),
    ("duodecima", "12"),
    ("decimotercero", "13"),
    ("decimocuarto", "14"),
    ("decimoquinto", "15"),
    ("decimosexto", "16"),
    ("decimoseptimo", "17"),
    ("decimoctavo", "18"),
    ("decimonoveno", "19"),
    ("vigesimo", "20"),
    ("trigesimo", "30"),
    ("cuadragesimo", "40"),
    ("quincuagesimo", "50"),
    ("unico", "unico"),
    ("unica", "unico"),
    ("final", "final"),
];

/// Lowercase roman numerals; position + 1 is the value.
const ROMAN_NUMERALS: [&str; 20] = [
    "i", "ii", "iii", "iv", "v", "vi", "vii", "viii", "ix", "x", "xi", "xii", "xiii", "xiv",
    "xv", "xvi", "xvii", "xviii", "xix", "xx",
];

/// Suffixes that modify an article number ("1 bis").
const MODIFIER_SUFFIXES: [&str; 3] = ["bis", "ter", "quater"];

static ORDINALS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| ORDINAL_WORDS.iter().copied().collect());

/// Leading label token ("artículo", "art.", "n°", "disposición", ...), accent-folded.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LABEL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:articulos?|art|nro|disposicion|disp)\b\.?|n[º°])\s*").expect("valid regex")
});

/// "transitorio" as a whole word anywhere in the label.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TRANSITORY_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\btransitori[oa]s?\b").expect("valid regex"));

/// Any ordinal word as a whole word, longest alternatives first.
#[allow(clippy::expect_used)] // Built from a static word table
static ORDINAL_WORD: LazyLock<Regex> = LazyLock::new(|| {
    let mut words: Vec<&str> = ORDINAL_WORDS.iter().map(|(word, _)| *word).collect();
    words.sort_by_key(|word| std::cmp::Reverse(word.len()));
    Regex::new(&format!(r"\b(?:{})\b", words.join("|"))).expect("valid regex")
});

/// A digit run followed by optional letters ("1 bis", "2a", "15").
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NUMBER_COMPONENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s*([a-zA-Z]*)").expect("valid regex"));

/// Value of a lowercase roman numeral between i and xx.
fn roman_value(text: &str) -> Option<usize> {
    ROMAN_NUMERALS
        .iter()
        .position(|numeral| *numeral == text)
        .map(|index| index + 1)
}

/// Trim whitespace and trailing `.`/`-`.
fn trim_label(text: &str) -> &str {
    text.trim().trim_end_matches(['.', '-']).trim()
}

/// Remove a leading label token, returning the remainder if one was present.
///
/// # Examples
/// ```
/// use leychile_harvester::normalize::strip_label_prefix;
///
/// assert_eq!(strip_label_prefix("ARTÍCULO 15").as_deref(), Some("15"));
/// assert_eq!(strip_label_prefix("15"), None);
/// ```
pub fn strip_label_prefix(label: &str) -> Option<String> {
    let folded = fold_accents(label.trim());
    LABEL_PREFIX
        .find(&folded)
        .filter(|prefix| !prefix.is_empty())
        .map(|prefix| folded[prefix.end()..].trim().to_string())
}

/// Split off the transitory marker, returning the remainder.
fn split_transitory(text: &str) -> Option<String> {
    if TRANSITORY_WORD.is_match(text) {
        return Some(TRANSITORY_WORD.replace_all(text, " ").into_owned());
    }
    if let Some(rest) = text.strip_prefix("trans.") {
        return Some(rest.to_string());
    }
    let rest = text.strip_prefix('t')?;
    match rest.chars().next() {
        Some(c) if c.is_whitespace() || c.is_ascii_digit() => Some(rest.to_string()),
        _ => None,
    }
}

/// Whether a canonical id is one of the reserved sentinels.
#[must_use]
pub fn is_sentinel(id: &str) -> bool {
    id == NO_NUMBER || id == NORMALIZATION_ERROR
}

/// Normalize an optional label; `None` is the same as an empty label.
pub fn normalize_label(label: Option<&str>) -> String {
    label.map_or_else(|| NO_NUMBER.to_string(), normalize)
}

/// Normalize an article label to its canonical identifier.
///
/// # Examples
/// ```
/// use leychile_harvester::normalize::{normalize, NORMALIZATION_ERROR, NO_NUMBER};
///
/// assert_eq!(normalize("Artículo 15"), "15");
/// assert_eq!(normalize("1 bis"), "1bis");
/// assert_eq!(normalize("Primero Transitorio"), "t1");
/// assert_eq!(normalize("XV"), "15");
/// assert_eq!(normalize("Artículo Final"), "final");
/// assert_eq!(normalize(""), NO_NUMBER);
/// assert_eq!(normalize("!!!"), NORMALIZATION_ERROR);
/// ```
pub fn normalize(label: &str) -> String {
    if label.trim().is_empty() {
        return NO_NUMBER.to_string();
    }

    let folded = fold_accents(label.trim());
    let stripped = match LABEL_PREFIX.find(&folded) {
        Some(prefix) => &folded[prefix.end()..],
        None => folded.as_str(),
    };
    let mut text = trim_label(stripped).to_string();

    if let Some(value) = ORDINALS.get(text.as_str()) {
        return (*value).to_string();
    }
    if let Some(value) = roman_value(&text) {
        return value.to_string();
    }

    let mut transitory_prefix = "";
    if let Some(rest) = split_transitory(&text) {
        transitory_prefix = "t";
        text = trim_label(&rest).to_string();
    }

    let text = ORDINAL_WORD.replace_all(&text, |caps: &regex::Captures<'_>| {
        ORDINALS.get(&caps[0]).copied().unwrap_or_default().to_string()
    });

    let text: String = text
        .chars()
        .filter(|c| !matches!(c, 'º' | '°' | 'ª' | '.' | ','))
        .collect();
    let text = text.trim().trim_end_matches('-').trim();

    let mut components: Vec<String> = NUMBER_COMPONENT
        .captures_iter(text)
        .map(|caps| {
            let digits = &caps[1];
            let letters = &caps[2];
            let is_sub_item = letters.chars().count() == 1;
            if MODIFIER_SUFFIXES.contains(&letters) || is_sub_item {
                format!("{digits}{letters}")
            } else {
                digits.to_string()
            }
        })
        .collect();

    if components.is_empty() {
        let residual: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        if residual.chars().any(char::is_alphanumeric) {
            match roman_value(&residual) {
                Some(value) => components.push(value.to_string()),
                None => components.push(residual),
            }
        }
    }

    let id = format!("{transitory_prefix}{}", components.concat());
    if !id.is_empty() {
        return id;
    }

    let last_resort: String = text
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    if last_resort.is_empty() {
        NORMALIZATION_ERROR.to_string()
    } else {
        last_resort
    }
}
