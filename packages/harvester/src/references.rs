//! Extraction of citations to other legal instruments.
//!
//! Article bodies cite statutes ("Ley N° 21.595"), decrees with force of
//! law ("D.F.L. N° 1"), decree-laws ("decreto ley N° 3.500"), supreme
//! decrees ("D.S. N° 40"), the codes and specific articles of them
//! ("artículo 2314 del Código Civil"). Each kind has one pattern in
//! [`CITATION_PATTERNS`]; matches are trimmed, filtered for noise and
//! deduplicated.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::text::single_line;

/// Matches of this many characters or fewer are discarded as noise.
const MIN_REFERENCE_LENGTH: usize = 5;

/// Optional number marker between an instrument name and its number ("N°", "Nro.", "número").
macro_rules! number_marker {
    () => {
        r"(?:\s*(?:n(?:[°º]|ro\.?|[uú]mero|\.)\s*)?)"
    };
}

/// A named citation pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CitationPattern {
    /// Kind of instrument the pattern recognizes.
    pub name: &'static str,

    /// Regular expression source.
    pub pattern: &'static str,
}

/// Citation patterns, most specific first.
///
/// A span of text yields at most one citation: once a pattern claims it,
/// later patterns cannot match inside it.
pub const CITATION_PATTERNS: &[CitationPattern] = &[
    CitationPattern {
        name: "articulo_codigo",
        pattern: r"(?i:\bart[íi]culos?)\s+\d+(?:\s*[°º])?(?:\s+(?i:bis|ter|quater))?,?\s+(?i:del)\s+(?i:c[óo]digo)(?:\s+(?:(?i:de|del)\s+)?\p{Lu}\p{Ll}+){1,3}",
    },
    CitationPattern {
        name: "dfl",
        pattern: concat!(
            r"(?i)(?:\bD\.\s?F\.\s?L\.|\bDFL\b|\bdecreto\s+con\s+fuerza\s+de\s+ley)",
            number_marker!(),
            r"\d+(?:\.\d{3})*(?:,?\s+de\s+\d{4})?"
        ),
    },
    CitationPattern {
        name: "decreto_ley",
        pattern: concat!(
            r"(?i)(?:\bD\.\s?L\.|\bDL\b|\bdecreto\s+ley)",
            number_marker!(),
            r"\d+(?:\.\d{3})*(?:,?\s+de\s+\d{4})?"
        ),
    },
    CitationPattern {
        name: "decreto_supremo",
        pattern: concat!(
            r"(?i)(?:\bD\.\s?S\.|\bDS\b|\bdecreto\s+supremo)",
            number_marker!(),
            r"\d+(?:\.\d{3})*(?:,?\s+de\s+\d{4})?"
        ),
    },
    CitationPattern {
        name: "ley",
        pattern: concat!(
            r"(?i)\bley(?:\s+org[áa]nica\s+constitucional)?\s+",
            number_marker!(),
            r"\d{1,3}(?:\.?\d{3})+\b"
        ),
    },
    CitationPattern {
        name: "codigo",
        pattern: r"(?i)\bc[óo]digo\s+(?:civil|penal|del\s+trabajo|tributario|de\s+comercio|de\s+procedimiento\s+(?:civil|penal)|procesal\s+penal|org[áa]nico\s+de\s+tribunales|sanitario|de\s+aguas|de\s+miner[íi]a|aeron[áa]utico)\b",
    },
    CitationPattern {
        name: "constitucion",
        pattern: r"(?i)\bconstituci[óo]n\s+pol[íi]tica(?:\s+de\s+la\s+rep[úu]blica)?(?:\s+de\s+chile)?",
    },
];

/// Compiled citation patterns; patterns that fail to compile are skipped.
static COMPILED_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> =
    LazyLock::new(|| compile_patterns(CITATION_PATTERNS));

/// Compile a pattern list, logging and skipping any pattern that fails.
pub fn compile_patterns(patterns: &[CitationPattern]) -> Vec<(&'static str, Regex)> {
    patterns
        .iter()
        .filter_map(|p| match Regex::new(p.pattern) {
            Ok(regex) => Some((p.name, regex)),
            Err(e) => {
                tracing::warn!(pattern = p.name, error = %e, "Skipping invalid citation pattern");
                None
            }
        })
        .collect()
}

/// Trim punctuation and whitespace around a raw match.
fn trim_reference(raw: &str) -> &str {
    raw.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '.' | ',' | ';' | ':' | '(' | ')' | '[' | ']' | '"' | '\'')
    })
}

/// Extract citations from article text using the built-in pattern library.
///
/// # Examples
/// ```
/// use leychile_harvester::references::extract_references;
///
/// let refs = extract_references("Según la Ley N° 21595 y la Ley N° 21595.");
/// assert_eq!(refs.len(), 1);
/// assert!(refs.contains("Ley N° 21595"));
/// ```
pub fn extract_references(text: &str) -> BTreeSet<String> {
    extract_with_compiled(text, &COMPILED_PATTERNS)
}

/// Extract citations using an explicit pattern list.
pub fn extract_references_with(text: &str, patterns: &[CitationPattern]) -> BTreeSet<String> {
    extract_with_compiled(text, &compile_patterns(patterns))
}

fn extract_with_compiled(text: &str, patterns: &[(&'static str, Regex)]) -> BTreeSet<String> {
    let text = single_line(text);
    let mut references = BTreeSet::new();
    let mut claimed: Vec<(usize, usize)> = Vec::new();

    for (name, regex) in patterns {
        for found in regex.find_iter(&text) {
            let overlaps = claimed
                .iter()
                .any(|(start, end)| found.start() < *end && *start < found.end());
            if overlaps {
                continue;
            }

            let reference = trim_reference(found.as_str());
            if reference.chars().count() > MIN_REFERENCE_LENGTH {
                claimed.push((found.start(), found.end()));
                references.insert(reference.to_string());
            } else {
                tracing::trace!(pattern = name, reference, "Discarding short citation match");
            }
        }
    }

    references
}
