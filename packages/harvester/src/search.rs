//! Phrase search over parsed articles.

use crate::config::SEARCH_FRAGMENT_LENGTH;
use crate::text::fold_accents;
use crate::types::{Law, SearchHit};

/// Leading part of a body, with "..." when it was cut.
///
/// # Examples
/// ```
/// use leychile_harvester::search::fragment;
///
/// assert_eq!(fragment("corto", 200), "corto");
/// assert_eq!(fragment("abcdef", 3), "abc...");
/// ```
pub fn fragment(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

/// Find up to `limit` articles of `law` whose body contains `phrase`.
///
/// Matching ignores case and accents. A blank phrase matches nothing.
pub fn search_phrase(law: &Law, phrase: &str, limit: usize) -> Vec<SearchHit> {
    let needle = fold_accents(phrase.trim());
    if needle.is_empty() {
        return Vec::new();
    }

    law.articles
        .iter()
        .filter(|article| fold_accents(&article.body_text).contains(&needle))
        .take(limit)
        .map(|article| SearchHit {
            law_number: law.law_number.clone(),
            id_norma: law.id_norma.clone(),
            display_label: article.display_label.clone(),
            canonical_id: article.canonical_id.clone(),
            source_part_id: article.source_part_id.clone(),
            fragment: fragment(&article.body_text, SEARCH_FRAGMENT_LENGTH),
        })
        .collect()
}
