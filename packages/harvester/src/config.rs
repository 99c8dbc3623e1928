//! Configuration constants and validation functions for the harvester.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{HarvesterError, Result};
use crate::text::fold_accents;

/// Base URL of the LeyChile XML web service.
pub const LEYCHILE_BASE_URL: &str = "https://www.leychile.cl";

/// Base URL of the BCN legislative viewer (rendered HTML).
pub const BCN_BASE_URL: &str = "https://www.bcn.cl";

/// HTTP timeout in seconds.
///
/// Set to 30 seconds to accommodate large statutes such as the codes.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Maximum length (in characters) of an article body before truncation.
pub const MAX_TEXT_LENGTH: usize = 10_000;

/// Marker appended to truncated article bodies.
pub const TRUNCATION_MARKER: &str = "\n[Texto truncado]";

/// Number of articles returned when a whole law is requested.
pub const MAX_ARTICLES_RETURNED: usize = 15;

/// Number of "did you mean" suggestions in a not-found diagnostic.
pub const SUGGESTION_COUNT: usize = 5;

/// Minimum similarity ratio for a suggestion.
pub const SUGGESTION_CUTOFF: f64 = 0.6;

/// Number of available identifiers and labels sampled into a diagnostic.
pub const DIAGNOSTIC_SAMPLE_SIZE: usize = 15;

/// Length of the text fragment returned by phrase search.
pub const SEARCH_FRAGMENT_LENGTH: usize = 200;

/// Text wrap width for terminal output.
pub const TEXT_WRAP_WIDTH: usize = 100;

/// Codes and the Constitution have no law number; they are addressed by alias.
pub const KNOWN_NORMAS: &[(&str, &str)] = &[
    ("constitucion", "242302"),
    ("codigo-civil", "172986"),
    ("codigo-penal", "1984"),
    ("codigo-del-trabajo", "207436"),
    ("codigo-de-comercio", "1974"),
    ("codigo-tributario", "6374"),
    ("codigo-de-procedimiento-civil", "22740"),
    ("codigo-procesal-penal", "176595"),
];

/// Law number pattern: up to six digits once thousands separators are removed.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LAW_NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,6}$").expect("valid regex"));

/// idNorma pattern.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ID_NORMA_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,10}$").expect("valid regex"));

/// idParte pattern.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ID_PARTE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,32}$").expect("valid regex"));

/// Runs of characters that cannot appear in an alias.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ALIAS_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

/// Options for the document parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Maximum body length in characters.
    pub max_text_length: usize,

    /// Marker appended to a truncated body.
    pub truncation_marker: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_text_length: MAX_TEXT_LENGTH,
            truncation_marker: TRUNCATION_MARKER.to_string(),
        }
    }
}

impl ParseOptions {
    /// Override the maximum body length.
    #[must_use]
    pub fn with_max_text_length(mut self, max_text_length: usize) -> Self {
        self.max_text_length = max_text_length;
        self
    }
}

/// Upstream endpoints used by [`crate::client::LeyChileClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Base URL of the LeyChile XML service.
    pub leychile_base_url: String,

    /// Base URL of the BCN HTML viewer.
    pub bcn_base_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            leychile_base_url: LEYCHILE_BASE_URL.to_string(),
            bcn_base_url: BCN_BASE_URL.to_string(),
        }
    }
}

impl SourceConfig {
    /// Point both upstreams at the same base URL (used with mock servers).
    #[must_use]
    pub fn single(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            leychile_base_url: base_url.clone(),
            bcn_base_url: base_url,
        }
    }

    /// URL that redirects a law number to its idNorma page.
    pub fn navigate_url(&self, law_number: &str) -> String {
        format!("{}/Navegar?idLey={law_number}", self.leychile_base_url)
    }

    /// URL of the full XML of a norma.
    pub fn law_xml_url(&self, id_norma: &str) -> String {
        debug_assert!(
            ID_NORMA_PATTERN.is_match(id_norma),
            "id_norma should be validated before calling law_xml_url"
        );
        format!(
            "{}/Consulta/obtxml?opt=7&idNorma={id_norma}",
            self.leychile_base_url
        )
    }

    /// URL of the listing of the most recently published laws.
    pub fn latest_laws_url(&self, count: usize) -> String {
        format!(
            "{}/Consulta/obtxml?opt=3&cantidad={count}",
            self.leychile_base_url
        )
    }

    /// URL of the rendered HTML page of one article.
    pub fn html_url(&self, id_norma: &str, id_parte: &str) -> String {
        format!(
            "{}/leychile/navegar?idNorma={id_norma}&idParte={id_parte}",
            self.bcn_base_url
        )
    }
}

/// Turn free text into an alias key ("Código Civil" → "codigo-civil").
pub fn alias_key(text: &str) -> String {
    let folded = fold_accents(text);
    ALIAS_SEPARATOR
        .replace_all(&folded, "-")
        .trim_matches('-')
        .to_string()
}

/// Look up the idNorma of a code or the Constitution by alias.
///
/// # Examples
/// ```
/// use leychile_harvester::config::known_id_norma;
///
/// assert_eq!(known_id_norma("Código Civil"), Some("172986"));
/// assert_eq!(known_id_norma("21595"), None);
/// ```
pub fn known_id_norma(alias: &str) -> Option<&'static str> {
    let key = alias_key(alias);
    KNOWN_NORMAS
        .iter()
        .find(|(known, _)| *known == key)
        .map(|(_, id_norma)| *id_norma)
}

/// Validate a law number and return its canonical key.
///
/// Thousands separators and inner spaces are dropped ("19.628" → "19628");
/// code aliases are returned as their alias key.
///
/// # Examples
/// ```
/// use leychile_harvester::config::validate_law_number;
///
/// assert_eq!(validate_law_number("21.595").unwrap(), "21595");
/// assert_eq!(validate_law_number("Código Civil").unwrap(), "codigo-civil");
/// assert!(validate_law_number("ley cualquiera").is_err());
/// ```
pub fn validate_law_number(law_number: &str) -> Result<String> {
    let compact: String = law_number
        .trim()
        .chars()
        .filter(|c| *c != '.' && !c.is_whitespace())
        .collect();
    if LAW_NUMBER_PATTERN.is_match(&compact) {
        return Ok(compact);
    }

    let key = alias_key(law_number);
    if KNOWN_NORMAS.iter().any(|(known, _)| *known == key) {
        Ok(key)
    } else {
        Err(HarvesterError::InvalidLawNumber(law_number.to_string()))
    }
}

/// Validate an idNorma.
pub fn validate_id_norma(id_norma: &str) -> Result<()> {
    if ID_NORMA_PATTERN.is_match(id_norma) {
        Ok(())
    } else {
        Err(HarvesterError::InvalidIdNorma(id_norma.to_string()))
    }
}

/// Validate an idParte.
///
/// idParte values end up inside CSS selectors, so only a safe alphabet is accepted.
pub fn validate_id_parte(id_parte: &str) -> Result<()> {
    if ID_PARTE_PATTERN.is_match(id_parte) {
        Ok(())
    } else {
        Err(HarvesterError::InvalidIdParte(id_parte.to_string()))
    }
}
