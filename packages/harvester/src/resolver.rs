//! Lookup of articles by a user-supplied query.
//!
//! Resolution is a chain of independent strategies tried in order; the
//! first one that returns a non-empty match set wins:
//!
//! 1. canonical id equality (after normalizing the query)
//! 2. display label equality (case and accent insensitive)
//! 3. idParte equality
//! 4. text search over labels and bodies
//!
//! A query written as a full label ("Artículo 15") tries the display label
//! before the canonical id, so a caller who copied a label verbatim is told
//! the match came from the label. Every strategy after the canonical one
//! tags its records with a search note.
//!
//! When nothing matches the result is a [`NotFoundDiagnostic`] with "did
//! you mean" suggestions. That is a normal outcome; a query that cannot be
//! normalized at all is [`HarvesterError::InvalidQuery`] instead.

use serde::{Deserialize, Serialize};

use crate::config::{DIAGNOSTIC_SAMPLE_SIZE, SUGGESTION_COUNT, SUGGESTION_CUTOFF};
use crate::error::{HarvesterError, Result};
use crate::normalize::{is_sentinel, normalize, strip_label_prefix};
use crate::text::{fold_accents, single_line};
use crate::types::ArticleRecord;

/// Search note for a display label match.
pub const NOTE_DISPLAY_MATCH: &str = "matched by exact display label";

/// Search note for an idParte match.
pub const NOTE_PART_ID_MATCH: &str = "matched by source part id";

/// Search note for a text search match.
pub const NOTE_TEXT_MATCH: &str = "matched by text search (no exact identifier match)";

/// Outcome of a lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T = Vec<ArticleRecord>> {
    /// At least one record matched.
    Found(T),

    /// The query was understood but nothing matched.
    NotFound(NotFoundDiagnostic),
}

impl<T> Resolution<T> {
    /// Transform the found value, keeping a not-found diagnostic as is.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Self::Found(value) => Resolution::Found(f(value)),
            Self::NotFound(diagnostic) => Resolution::NotFound(diagnostic),
        }
    }

    /// The found value, if any.
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound(_) => None,
        }
    }
}

/// Explanation of a query that matched nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotFoundDiagnostic {
    /// Human-readable summary.
    pub message: String,

    /// Query as given.
    pub query: String,

    /// Canonical form the query was searched as.
    pub normalized_query: String,

    /// Closest canonical ids and labels, best first.
    pub suggestions: Vec<String>,

    /// Leading canonical ids of the law.
    pub available_ids: Vec<String>,

    /// Leading display labels of the law.
    pub available_labels: Vec<String>,
}

/// A query prepared once for all strategies.
struct Query<'a> {
    raw: &'a str,
    folded: String,
    normalized: String,
    label_shaped: bool,
}

impl<'a> Query<'a> {
    fn new(raw: &'a str, normalized: String) -> Self {
        Self {
            raw,
            folded: fold_accents(&single_line(raw)),
            normalized,
            label_shaped: strip_label_prefix(raw).is_some(),
        }
    }
}

type Strategy = fn(&[ArticleRecord], &Query<'_>) -> Option<Vec<ArticleRecord>>;

const CANONICAL_FIRST: [Strategy; 4] = [by_canonical_id, by_display_label, by_part_id, by_text];
const LABEL_FIRST: [Strategy; 4] = [by_display_label, by_canonical_id, by_part_id, by_text];

fn non_empty(records: Vec<ArticleRecord>) -> Option<Vec<ArticleRecord>> {
    (!records.is_empty()).then_some(records)
}

fn noted<'r>(records: impl Iterator<Item = &'r ArticleRecord>, note: &str) -> Vec<ArticleRecord> {
    records.map(|record| record.with_note(note)).collect()
}

fn by_canonical_id(articles: &[ArticleRecord], query: &Query<'_>) -> Option<Vec<ArticleRecord>> {
    non_empty(
        articles
            .iter()
            .filter(|a| a.canonical_id == query.normalized)
            .cloned()
            .collect(),
    )
}

fn by_display_label(articles: &[ArticleRecord], query: &Query<'_>) -> Option<Vec<ArticleRecord>> {
    let matches = articles
        .iter()
        .filter(|a| fold_accents(&single_line(&a.display_label)) == query.folded);
    non_empty(noted(matches, NOTE_DISPLAY_MATCH))
}

fn by_part_id(articles: &[ArticleRecord], query: &Query<'_>) -> Option<Vec<ArticleRecord>> {
    let wanted = query.raw.trim();
    let matches = articles
        .iter()
        .filter(|a| a.source_part_id.as_deref() == Some(wanted));
    non_empty(noted(matches, NOTE_PART_ID_MATCH))
}

fn by_text(articles: &[ArticleRecord], query: &Query<'_>) -> Option<Vec<ArticleRecord>> {
    if query.folded.is_empty() {
        return None;
    }
    let matches = articles.iter().filter(|a| {
        let body = fold_accents(&a.body_text);
        body.contains(&query.folded)
            || body.contains(&query.normalized)
            || fold_accents(&a.display_label).contains(&query.folded)
    });
    non_empty(noted(matches, NOTE_TEXT_MATCH))
}

/// Find the articles a query refers to.
///
/// # Examples
/// ```
/// use leychile_harvester::resolver::{resolve, Resolution};
/// use leychile_harvester::types::ArticleRecord;
///
/// let article = ArticleRecord {
///     display_label: "Artículo 15".to_string(),
///     canonical_id: "15".to_string(),
///     body_text: "Texto.".to_string(),
///     legal_references: Default::default(),
///     source_part_id: None,
///     search_note: None,
/// };
/// let Resolution::Found(found) = resolve(&[article], "15").unwrap() else {
///     panic!("expected a match");
/// };
/// assert_eq!(found[0].search_note, None);
/// ```
pub fn resolve(articles: &[ArticleRecord], query: &str) -> Result<Resolution> {
    let normalized = normalize(query);
    if is_sentinel(&normalized) {
        return Err(HarvesterError::InvalidQuery {
            query: query.to_string(),
        });
    }

    let query = Query::new(query, normalized);
    let chain = if query.label_shaped {
        &LABEL_FIRST
    } else {
        &CANONICAL_FIRST
    };

    if let Some(found) = chain.iter().find_map(|strategy| strategy(articles, &query)) {
        tracing::debug!(
            query = query.raw,
            normalized = %query.normalized,
            count = found.len(),
            "Resolved article query"
        );
        return Ok(Resolution::Found(found));
    }

    Ok(Resolution::NotFound(diagnose(articles, &query)))
}

/// Find the article with the given idParte.
pub fn find_by_part_id<'a>(articles: &'a [ArticleRecord], id_parte: &str) -> Option<&'a ArticleRecord> {
    articles
        .iter()
        .find(|a| a.source_part_id.as_deref() == Some(id_parte))
}

fn diagnose(articles: &[ArticleRecord], query: &Query<'_>) -> NotFoundDiagnostic {
    let raw_lower = query.raw.trim().to_lowercase();

    let id_scores = articles
        .iter()
        .map(|a| (similarity(&query.normalized, &a.canonical_id), &a.canonical_id));
    let label_scores = articles
        .iter()
        .map(|a| (similarity(&raw_lower, &a.display_label.to_lowercase()), &a.display_label));

    let mut scored: Vec<(f64, &String)> = id_scores
        .chain(label_scores)
        .filter(|(score, _)| *score >= SUGGESTION_CUTOFF)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));

    let mut suggestions: Vec<String> = Vec::new();
    for (_, candidate) in scored {
        if suggestions.len() == SUGGESTION_COUNT {
            break;
        }
        if !suggestions.contains(candidate) {
            suggestions.push(candidate.clone());
        }
    }

    NotFoundDiagnostic {
        message: format!(
            "Article '{}' (searched as '{}') not found",
            query.raw, query.normalized
        ),
        query: query.raw.to_string(),
        normalized_query: query.normalized.clone(),
        suggestions,
        available_ids: articles
            .iter()
            .take(DIAGNOSTIC_SAMPLE_SIZE)
            .map(|a| a.canonical_id.clone())
            .collect(),
        available_labels: articles
            .iter()
            .take(DIAGNOSTIC_SAMPLE_SIZE)
            .map(|a| a.display_label.clone())
            .collect(),
    }
}

/// Ratcliff/Obershelp similarity: twice the matched characters over the total length.
///
/// # Examples
/// ```
/// use leychile_harvester::resolver::similarity;
///
/// assert_eq!(similarity("15", "15"), 1.0);
/// assert_eq!(similarity("15", "15a"), 0.8);
/// assert_eq!(similarity("abc", "xyz"), 0.0);
/// ```
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    (2 * matching_characters(&a, &b)) as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let (start_a, start_b, len) = longest_common_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_characters(&a[..start_a], &b[..start_b])
        + matching_characters(&a[start_a + len..], &b[start_b + len..])
}

/// Longest common substring as `(start in a, start in b, length)`.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut previous = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let len = previous[j] + 1;
                current[j + 1] = len;
                if len > best.2 {
                    best = (i + 1 - len, j + 1 - len, len);
                }
            }
        }
        previous = current;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn article(label: &str, id: &str, part: &str, body: &str) -> ArticleRecord {
        ArticleRecord {
            display_label: label.to_string(),
            canonical_id: id.to_string(),
            body_text: body.to_string(),
            legal_references: Default::default(),
            source_part_id: Some(part.to_string()),
            search_note: None,
        }
    }

    fn articles() -> Vec<ArticleRecord> {
        vec![
            article("Artículo 15", "15", "9001", "Las multas se reajustarán."),
            article("Primero Transitorio", "t1", "9002", "Esta ley entrará en vigencia."),
        ]
    }

    fn found(resolution: Resolution) -> Vec<ArticleRecord> {
        match resolution {
            Resolution::Found(records) => records,
            Resolution::NotFound(d) => panic!("expected a match, got {d:?}"),
        }
    }

    #[test]
    fn test_canonical_match_has_no_note() {
        let records = found(resolve(&articles(), "15").unwrap());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].canonical_id, "15");
        assert_eq!(records[0].search_note, None);
    }

    #[test]
    fn test_full_label_matches_display_with_note() {
        let records = found(resolve(&articles(), "ARTÍCULO 15").unwrap());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].canonical_id, "15");
        assert_eq!(records[0].search_note.as_deref(), Some(NOTE_DISPLAY_MATCH));
    }

    #[test]
    fn test_label_query_falls_back_to_canonical() {
        let records = found(resolve(&articles(), "Art. 15").unwrap());
        assert_eq!(records[0].canonical_id, "15");
        assert_eq!(records[0].search_note, None);
    }

    #[test]
    fn test_transitory_query() {
        let records = found(resolve(&articles(), "primero transitorio").unwrap());
        assert_eq!(records[0].canonical_id, "t1");
        assert_eq!(records[0].search_note, None);
    }

    #[test]
    fn test_part_id_match() {
        let records = found(resolve(&articles(), "9002").unwrap());
        assert_eq!(records[0].canonical_id, "t1");
        assert_eq!(records[0].search_note.as_deref(), Some(NOTE_PART_ID_MATCH));
    }

    #[test]
    fn test_text_match() {
        let records = found(resolve(&articles(), "vigencia").unwrap());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].canonical_id, "t1");
        assert_eq!(records[0].search_note.as_deref(), Some(NOTE_TEXT_MATCH));
    }

    #[test]
    fn test_text_match_on_normalized_form_in_body() {
        let list = vec![article("Artículo 2", "2", "1", "Véase el artículo 7 de esta ley.")];
        let records = found(resolve(&list, "séptimo").unwrap());
        assert_eq!(records[0].canonical_id, "2");
        assert_eq!(records[0].search_note.as_deref(), Some(NOTE_TEXT_MATCH));
    }

    #[test]
    fn test_duplicate_canonical_ids_are_all_returned() {
        let list = vec![
            article("Artículo 1", "1", "1", "a"),
            article("Artículo 1", "1", "2", "b"),
        ];
        assert_eq!(found(resolve(&list, "1").unwrap()).len(), 2);
    }

    #[test]
    fn test_not_found_diagnostic() {
        let Resolution::NotFound(diagnostic) = resolve(&articles(), "15a").unwrap() else {
            panic!("expected not found");
        };
        assert_eq!(diagnostic.query, "15a");
        assert_eq!(diagnostic.normalized_query, "15a");
        assert_eq!(diagnostic.suggestions, vec!["15".to_string()]);
        assert_eq!(diagnostic.available_ids, vec!["15".to_string(), "t1".to_string()]);
        assert_eq!(
            diagnostic.available_labels,
            vec!["Artículo 15".to_string(), "Primero Transitorio".to_string()]
        );
    }

    #[test]
    fn test_diagnostic_sample_is_capped() {
        let list: Vec<_> = (1..=30)
            .map(|n| article(&format!("Artículo {n}"), &n.to_string(), &n.to_string(), "x"))
            .collect();
        let Resolution::NotFound(diagnostic) = resolve(&list, "999").unwrap() else {
            panic!("expected not found");
        };
        assert_eq!(diagnostic.available_ids.len(), DIAGNOSTIC_SAMPLE_SIZE);
        assert_eq!(diagnostic.available_labels.len(), DIAGNOSTIC_SAMPLE_SIZE);
        assert!(diagnostic.suggestions.len() <= SUGGESTION_COUNT);
    }

    #[test]
    fn test_unintelligible_query_is_an_error() {
        assert!(matches!(
            resolve(&articles(), "!!!"),
            Err(HarvesterError::InvalidQuery { .. })
        ));
        assert!(matches!(
            resolve(&articles(), "  "),
            Err(HarvesterError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_find_by_part_id() {
        let list = articles();
        assert_eq!(find_by_part_id(&list, "9001").map(|a| a.canonical_id.as_str()), Some("15"));
        assert!(find_by_part_id(&list, "1").is_none());
    }

    #[test]
    fn test_similarity() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("15", "16"), 0.5);
        assert_eq!(similarity("abcd", "bcde"), 0.75);
    }

    #[test]
    fn test_resolution_map() {
        let resolution: Resolution<usize> = Resolution::Found(vec![1, 2]).map(|v| v.len());
        assert_eq!(resolution.found(), Some(2));
    }
}
