//! Extraction of an article's text from the rendered BCN page.
//!
//! The BCN viewer marks each article with an element whose id is the
//! idParte, sometimes prefixed with "p". The layout has changed over time,
//! so several selectors are tried in order.

use scraper::{Html, Selector};

/// Selector templates tried in order; `{id}` is replaced by the idParte.
pub const FRAGMENT_SELECTORS: [&str; 5] = [
    "[id='{id}']",
    "[id='p{id}']",
    "div[id='p{id}']",
    "article[id='{id}']",
    "div.textoNorma[id*='{id}']",
];

/// Text located in a page and the selector that located it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFragment {
    pub selector: String,
    pub text: String,
}

/// Find the text of the article `id_parte` in a rendered page.
///
/// The text is every non-blank text node under the first matching element,
/// trimmed and joined with newlines. `id_parte` must already be validated.
///
/// # Examples
/// ```
/// use leychile_harvester::html::extract_fragment;
///
/// let page = r#"<html><body><div id="p42"><p>Artículo 1.-</p><p> Texto. </p></div></body></html>"#;
/// let fragment = extract_fragment(page, "42").unwrap();
/// assert_eq!(fragment.selector, "[id='p42']");
/// assert_eq!(fragment.text, "Artículo 1.-\nTexto.");
/// ```
pub fn extract_fragment(html: &str, id_parte: &str) -> Option<ExtractedFragment> {
    let document = Html::parse_document(html);

    for template in FRAGMENT_SELECTORS {
        let selector_text = template.replace("{id}", id_parte);
        let selector = match Selector::parse(&selector_text) {
            Ok(selector) => selector,
            Err(e) => {
                tracing::debug!(selector = %selector_text, error = %e, "Skipping invalid selector");
                continue;
            }
        };

        let Some(element) = document.select(&selector).next() else {
            continue;
        };

        let text = element
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if !text.is_empty() {
            return Some(ExtractedFragment {
                selector: selector_text,
                text,
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_id_wins() {
        let page = r#"<div id="10449614">Artículo 1°.- Primero</div><div id="p10449614">Otro</div>"#;
        let fragment = extract_fragment(page, "10449614").unwrap();
        assert_eq!(fragment.selector, "[id='10449614']");
        assert_eq!(fragment.text, "Artículo 1°.- Primero");
    }

    #[test]
    fn test_partial_id_in_texto_norma() {
        let page = r#"<div class="textoNorma" id="art_10449614_v2"><span>Texto</span> <span>del artículo</span></div>"#;
        let fragment = extract_fragment(page, "10449614").unwrap();
        assert_eq!(fragment.selector, "div.textoNorma[id*='10449614']");
        assert_eq!(fragment.text, "Texto\ndel artículo");
    }

    #[test]
    fn test_empty_element_is_skipped() {
        let page = r#"<div id="7"> </div><article id="x"><div id="p7">Contenido</div></article>"#;
        let fragment = extract_fragment(page, "7").unwrap();
        assert_eq!(fragment.selector, "[id='p7']");
    }

    #[test]
    fn test_missing_article() {
        assert_eq!(extract_fragment("<html><body>Nada</body></html>", "1"), None);
    }
}
