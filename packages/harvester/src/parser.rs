//! Parsing of LeyChile XML into article records.
//!
//! A LeyChile document is a tree of `EstructuraFuncional` elements; the
//! ones whose `tipoParte` is "Artículo" are articles. Each article has an
//! optional `Metadatos` block (with `NombreParte`/`TituloParte`) and a
//! `Texto` body that usually starts with its own heading
//! ("Artículo 1°.- ...").
//!
//! Parsing is all-or-nothing: malformed XML is an error for the whole
//! document, while an article whose label cannot be normalized is dropped.

use chrono::NaiveDate;
use regex::Regex;
use roxmltree::{Document, Node, ParsingOptions};
use std::borrow::Cow;
use std::sync::LazyLock;

use crate::config::ParseOptions;
use crate::error::Result;
use crate::normalize::{normalize_label, NORMALIZATION_ERROR};
use crate::references::extract_references;
use crate::text::{clean, fold_accents, truncate};
use crate::types::{ArticleRecord, LawListing};
use crate::xml::{attribute_ci, element_text, find_child, has_folded_tag, text_at};

/// Display label of an article with neither a label nor an idParte.
pub const UNNUMBERED_LABEL: &str = "Artículo s/n";

/// Values of `tipoParte` (accent-folded) that mark an article.
const ARTICLE_PART_TYPES: [&str; 2] = ["articulo", "article"];

/// Number-shaped article label: digits, a Roman numeral or an ordinal word,
/// optionally with a degree sign, a bis/ter/quater or letter suffix and a
/// transitory marker.
const LABEL_SHAPE: &str = concat!(
    r"(?:art[íi]culo|art\.)\s*(?:n[°º]\s*)?(?:transitori[oa]\s+)?",
    r"(?:\d+|(?:[ivxlc]+|decimo(?:tercer[oa]|cuart[oa]|quint[oa]|sext[oa]|s[ée]ptim[oa]|ctav[oa]|noven[oa])",
    r"|primer[oa]?|segund[oa]|tercer[oa]?|cuart[oa]|quint[oa]|sext[oa]|s[ée]ptim[oa]|octav[oa]|noven[oa]",
    r"|und[ée]cim[oa]|duod[ée]cim[oa]|d[ée]cim[oa]|vig[ée]sim[oa]|trig[ée]sim[oa]|cuadrag[ée]sim[oa]",
    r"|quincuag[ée]sim[oa]|[úu]nic[oa]|final)\b)",
    r"\s*[°º]?(?:\s*(?:bis|ter|quater|[a-z])\b)?(?:\s+transitori[oa])?",
);

/// Heading at the start of an article body: "Artículo 1°.-", "Art. 5:", ...
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^({LABEL_SHAPE})\s*[.:\-–—]+(?:\s+|$)")).expect("valid regex")
});

/// Leading "Artículo 2 ..." without a delimiter; only names the article.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static LEADING_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^((?:art[íi]culo|art\.)\s*(?:n[°º]\s*)?\d+\s*[°º]?(?:\s+(?:bis|ter|quater)\b)?)(?:\s|$)",
    )
    .expect("valid regex")
});

/// Decode raw XML bytes, dropping a UTF-8 BOM.
fn decode(raw: &[u8]) -> Cow<'_, str> {
    let raw = raw.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(raw);
    match std::str::from_utf8(raw) {
        Ok(text) => Cow::Borrowed(text),
        Err(e) => {
            tracing::warn!(error = %e, "XML is not valid UTF-8, replacing invalid sequences");
            String::from_utf8_lossy(raw)
        }
    }
}

fn parse_document(xml: &str) -> Result<Document<'_>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Ok(Document::parse_with_options(xml, options)?)
}

/// Whether an element is an article node.
fn is_article_node(node: &Node<'_, '_>) -> bool {
    if !node.is_element() {
        return false;
    }
    let marked_by_type = attribute_ci(*node, "tipoParte")
        .map(|kind| fold_accents(kind.trim()))
        .is_some_and(|kind| ARTICLE_PART_TYPES.contains(&kind.as_str()));
    marked_by_type || has_folded_tag(*node, "articulo")
}

/// Split a leading heading off an article body, returning `(label, rest)`.
///
/// # Examples
/// ```
/// use leychile_harvester::parser::split_heading;
///
/// assert_eq!(
///     split_heading("Artículo 1°.- Esta ley regula..."),
///     Some(("Artículo 1°".to_string(), "Esta ley regula...".to_string()))
/// );
/// assert_eq!(split_heading("Esta ley regula..."), None);
/// ```
pub fn split_heading(body: &str) -> Option<(String, String)> {
    let caps = HEADING.captures(body)?;
    let label = caps.get(1)?.as_str().trim().to_string();
    let rest = body[caps.get(0)?.end()..].trim().to_string();
    Some((label, rest))
}

/// Label named by a body that opens with "Artículo N" but has no heading
/// delimiter. The body is left whole.
fn leading_label(body: &str) -> Option<String> {
    let caps = LEADING_LABEL.captures(body)?;
    Some(caps.get(1)?.as_str().trim().to_string())
}

/// Display form of a declared label; bare numbers get the article word.
fn display_form(label: &str) -> String {
    if label.starts_with(|c: char| c.is_ascii_digit()) {
        format!("Artículo {label}")
    } else {
        label.to_string()
    }
}

fn parse_article(node: Node<'_, '_>, options: &ParseOptions) -> Option<ArticleRecord> {
    let source_part_id = attribute_ci(node, "idParte")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    let body = find_child(node, "Texto")
        .map(element_text)
        .map(|raw| clean(&raw))
        .unwrap_or_default();

    let declared =
        text_at(node, "Metadatos/NombreParte").or_else(|| text_at(node, "Metadatos/TituloParte"));
    let (label, body) = match declared {
        Some(label) => (Some(label), body),
        None => match split_heading(&body) {
            Some((label, rest)) => (Some(label), rest),
            None => (leading_label(&body), body),
        },
    };

    let canonical_id = normalize_label(label.as_deref());
    if canonical_id == NORMALIZATION_ERROR {
        tracing::debug!(
            id_parte = source_part_id.as_deref().unwrap_or_default(),
            label = label.as_deref().unwrap_or_default(),
            "Skipping article with unusable label"
        );
        return None;
    }

    let display_label = match (&label, &source_part_id) {
        (Some(label), _) => display_form(label),
        (None, Some(id_parte)) => format!("Artículo {id_parte}"),
        (None, None) => UNNUMBERED_LABEL.to_string(),
    };

    let body_text = truncate(&body, options.max_text_length, &options.truncation_marker);
    let legal_references = extract_references(&body_text);

    Some(ArticleRecord {
        display_label,
        canonical_id,
        body_text,
        legal_references,
        source_part_id,
        search_note: None,
    })
}

/// Parse a LeyChile XML document into article records with default options.
///
/// # Examples
/// ```
/// use leychile_harvester::parser::parse_articles;
///
/// let xml = r#"<Norma xmlns="http://www.leychile.cl/esquemas">
///   <EstructuraFuncional tipoParte="Artículo" idParte="1">
///     <Texto>Artículo 1°.- Esta ley regula la materia.</Texto>
///   </EstructuraFuncional>
/// </Norma>"#;
/// let articles = parse_articles(xml.as_bytes()).unwrap();
/// assert_eq!(articles[0].canonical_id, "1");
/// assert_eq!(articles[0].body_text, "Esta ley regula la materia.");
/// ```
pub fn parse_articles(raw: &[u8]) -> Result<Vec<ArticleRecord>> {
    parse_articles_with(raw, &ParseOptions::default())
}

/// Parse a LeyChile XML document into article records, in document order.
pub fn parse_articles_with(raw: &[u8], options: &ParseOptions) -> Result<Vec<ArticleRecord>> {
    let xml = decode(raw);
    let doc = parse_document(&xml)?;

    let articles: Vec<ArticleRecord> = doc
        .descendants()
        .filter(is_article_node)
        .filter_map(|node| parse_article(node, options))
        .collect();

    tracing::debug!(count = articles.len(), "Parsed articles");
    Ok(articles)
}

fn parse_listing_date(text: &str) -> Option<NaiveDate> {
    ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text.trim(), format).ok())
}

fn parse_listing_entry(node: Node<'_, '_>) -> Option<LawListing> {
    let law_number = text_at(node, "Identificadores/Numero")
        .or_else(|| text_at(node, "Identificadores/TipoNumero/Numero"))?
        .replace('.', "");

    let id_norma = attribute_ci(node, "normaId")
        .or_else(|| attribute_ci(node, "idNorma"))
        .map(str::to_string);

    let title = text_at(node, "TituloNorma").or_else(|| text_at(node, "Titulo"));

    let publication_date = text_at(node, "FechaPublicacion")
        .or_else(|| attribute_ci(node, "fechaPublicacion").map(str::to_string))
        .and_then(|date| parse_listing_date(&date));

    Some(LawListing {
        law_number,
        id_norma,
        title,
        publication_date,
    })
}

/// Parse the "latest published laws" listing.
///
/// Entries without a law number are skipped.
pub fn parse_law_listing(raw: &[u8]) -> Result<Vec<LawListing>> {
    let xml = decode(raw);
    let doc = parse_document(&xml)?;

    Ok(doc
        .descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == "Norma")
        .filter_map(parse_listing_entry)
        .collect())
}
