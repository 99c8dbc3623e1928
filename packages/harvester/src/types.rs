//! Core data types for the harvester.
//!
//! These types represent Chilean statutes and their articles as parsed
//! from the LeyChile XML service.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One legal article.
///
/// Records are created fresh by every parse and never shared between
/// requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Label as it appeared in the source (e.g. "Artículo 15").
    pub display_label: String,

    /// Normalized identifier (e.g. "15", "1bis", "t1", "final").
    pub canonical_id: String,

    /// Cleaned body, truncated with a marker when over the limit.
    pub body_text: String,

    /// Citations to other instruments found in the body, sorted.
    #[serde(default)]
    pub legal_references: BTreeSet<String>,

    /// `idParte` of the source node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_part_id: Option<String>,

    /// Explanation attached when the record was found by a non-exact strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_note: Option<String>,
}

impl ArticleRecord {
    /// Copy of this record carrying a search note.
    #[must_use]
    pub fn with_note(&self, note: &str) -> Self {
        Self {
            search_note: Some(note.to_string()),
            ..self.clone()
        }
    }

    /// Identifying triple of this record.
    #[must_use]
    pub fn summary(&self) -> ArticleSummary {
        ArticleSummary {
            display_label: self.display_label.clone(),
            canonical_id: self.canonical_id.clone(),
            source_part_id: self.source_part_id.clone(),
        }
    }
}

/// A downloaded and parsed statute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Law {
    /// Law number or code alias as requested (e.g. "21595", "codigo-civil").
    pub law_number: String,

    /// LeyChile idNorma.
    pub id_norma: String,

    /// Articles in document order.
    pub articles: Vec<ArticleRecord>,
}

impl Law {
    /// Identifiers of every article, in document order.
    #[must_use]
    pub fn summaries(&self) -> Vec<ArticleSummary> {
        self.articles.iter().map(ArticleRecord::summary).collect()
    }
}

/// Response for a law lookup, optionally narrowed to one article query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawDetail {
    /// Law number as requested.
    pub law_number: String,

    /// LeyChile idNorma.
    pub id_norma: String,

    /// Number of records in `articles`.
    pub returned_articles: usize,

    /// The matched or leading articles.
    pub articles: Vec<ArticleRecord>,

    /// Total article count of the law; only set when no query was given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_articles: Option<usize>,

    /// Set when the article list was cut to the first N records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncation_note: Option<String>,
}

/// Display label, canonical id and idParte of one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub display_label: String,
    pub canonical_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_part_id: Option<String>,
}

/// Text of one article extracted from the rendered BCN page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlFragment {
    /// LeyChile idNorma.
    pub id_norma: String,

    /// idParte of the article.
    pub id_parte: String,

    /// Page the text was taken from.
    pub source_url: String,

    /// CSS selector that located the fragment.
    pub selector: String,

    /// Extracted text, one element text per line.
    pub text: String,
}

/// An entry of the "latest published laws" listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawListing {
    /// Law number (e.g. "21595").
    pub law_number: String,

    /// idNorma when the listing carries it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_norma: Option<String>,

    /// Title of the law, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Publication date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<NaiveDate>,
}

/// An article whose body contains a searched phrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Law number.
    pub law_number: String,

    /// LeyChile idNorma.
    pub id_norma: String,

    /// Display label of the article.
    pub display_label: String,

    /// Canonical id of the article.
    pub canonical_id: String,

    /// idParte of the article.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_part_id: Option<String>,

    /// Leading part of the body.
    pub fragment: String,
}
