//! Main harvester service that ties all components together.

use crate::client::DocumentSource;
use crate::config::{validate_law_number, ParseOptions};
use crate::error::Result;
use crate::parser::{parse_articles_with, parse_law_listing};
use crate::resolver::{find_by_part_id, resolve, Resolution};
use crate::search::search_phrase;
use crate::types::{ArticleRecord, Law, LawDetail, LawListing, SearchHit};

/// Download and parse a Chilean law.
///
/// `law_number` is a statute number ("21595", "19.628") or a code alias
/// ("codigo-civil").
pub fn download_law<S>(source: &S, law_number: &str) -> Result<Law>
where
    S: DocumentSource + ?Sized,
{
    download_law_with(source, law_number, &ParseOptions::default())
}

/// Download and parse a Chilean law with explicit parse options.
pub fn download_law_with<S>(source: &S, law_number: &str, options: &ParseOptions) -> Result<Law>
where
    S: DocumentSource + ?Sized,
{
    let law_number = validate_law_number(law_number)?;
    let (id_norma, xml) = source.fetch_document(&law_number)?;
    let articles = parse_articles_with(&xml, options)?;

    tracing::info!(
        law_number = %law_number,
        id_norma = %id_norma,
        articles = articles.len(),
        "Downloaded law"
    );

    Ok(Law {
        law_number,
        id_norma,
        articles,
    })
}

impl Law {
    /// The articles matching `query`, or the first `max_articles` when there is no query.
    ///
    /// A blank query counts as no query.
    pub fn detail(&self, query: Option<&str>, max_articles: usize) -> Result<Resolution<LawDetail>> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        if let Some(query) = query {
            let resolution = resolve(&self.articles, query)?;
            return Ok(resolution.map(|articles| LawDetail {
                law_number: self.law_number.clone(),
                id_norma: self.id_norma.clone(),
                returned_articles: articles.len(),
                articles,
                total_articles: None,
                truncation_note: None,
            }));
        }

        let total = self.articles.len();
        let articles: Vec<ArticleRecord> = self.articles.iter().take(max_articles).cloned().collect();
        let truncation_note = (total > max_articles).then(|| {
            format!(
                "Showing the first {max_articles} of {total} articles. Request a specific article to see the rest."
            )
        });

        Ok(Resolution::Found(LawDetail {
            law_number: self.law_number.clone(),
            id_norma: self.id_norma.clone(),
            returned_articles: articles.len(),
            articles,
            total_articles: Some(total),
            truncation_note,
        }))
    }

    /// The article with the given idParte.
    pub fn find_part(&self, id_parte: &str) -> Option<&ArticleRecord> {
        find_by_part_id(&self.articles, id_parte)
    }
}

fn load_listed_law<S>(source: &S, entry: &LawListing) -> Result<Law>
where
    S: DocumentSource + ?Sized,
{
    let id_norma = match &entry.id_norma {
        Some(id_norma) => id_norma.clone(),
        None => source.resolve_id_norma(&entry.law_number)?,
    };
    let xml = source.fetch_law_xml(&id_norma)?;
    Ok(Law {
        law_number: entry.law_number.clone(),
        id_norma,
        articles: parse_articles_with(&xml, &ParseOptions::default())?,
    })
}

/// Search a phrase in the articles of the most recently published laws.
///
/// Laws that fail to download or parse are skipped.
pub fn global_search<S>(
    source: &S,
    phrase: &str,
    max_laws: usize,
    max_results: usize,
) -> Result<Vec<SearchHit>>
where
    S: DocumentSource + ?Sized,
{
    let listing = parse_law_listing(&source.fetch_latest_laws(max_laws)?)?;
    let mut hits = Vec::new();

    for entry in listing.iter().take(max_laws) {
        if hits.len() >= max_results {
            break;
        }

        let law = match load_listed_law(source, entry) {
            Ok(law) => law,
            Err(e) => {
                tracing::warn!(law_number = %entry.law_number, error = %e, "Skipping law in global search");
                continue;
            }
        };

        hits.extend(search_phrase(&law, phrase, max_results - hits.len()));
    }

    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HtmlPage;
    use crate::error::HarvesterError;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    struct FakeSource {
        laws: HashMap<String, (String, String)>,
        listing: String,
    }

    impl FakeSource {
        fn new() -> Self {
            let mut laws = HashMap::new();
            laws.insert(
                "21595".to_string(),
                ("1195119".to_string(), xml(&["Artículo 1.- Delitos económicos.", "Artículo 2.- Penas."])),
            );
            laws.insert(
                "21600".to_string(),
                ("1196000".to_string(), xml(&["Artículo 1.- Otra materia con delitos."])),
            );
            Self {
                laws,
                listing: r#"<Normas>
                    <Norma><Identificadores><Numero>21600</Numero></Identificadores></Norma>
                    <Norma><Identificadores><Numero>99999</Numero></Identificadores></Norma>
                    <Norma normaId="1195119"><Identificadores><Numero>21.595</Numero></Identificadores></Norma>
                </Normas>"#
                    .to_string(),
            }
        }
    }

    fn xml(bodies: &[&str]) -> String {
        let parts: String = bodies
            .iter()
            .enumerate()
            .map(|(i, body)| {
                format!(r#"<EstructuraFuncional idParte="{}" tipoParte="Artículo"><Texto>{body}</Texto></EstructuraFuncional>"#, i + 100)
            })
            .collect();
        format!(r#"<Norma xmlns="http://www.leychile.cl/esquemas">{parts}</Norma>"#)
    }

    impl DocumentSource for FakeSource {
        fn resolve_id_norma(&self, law_number: &str) -> Result<String> {
            self.laws
                .get(law_number)
                .map(|(id, _)| id.clone())
                .ok_or_else(|| HarvesterError::NormaNotFound(law_number.to_string()))
        }

        fn fetch_law_xml(&self, id_norma: &str) -> Result<Vec<u8>> {
            self.laws
                .values()
                .find(|(id, _)| id == id_norma)
                .map(|(_, xml)| xml.clone().into_bytes())
                .ok_or_else(|| HarvesterError::NormaNotFound(id_norma.to_string()))
        }

        fn fetch_html_page(&self, _id_norma: &str, _id_parte: &str) -> Result<HtmlPage> {
            Ok(HtmlPage {
                url: "http://fake".to_string(),
                html: String::new(),
            })
        }

        fn fetch_latest_laws(&self, _count: usize) -> Result<Vec<u8>> {
            Ok(self.listing.clone().into_bytes())
        }
    }

    fn many_articles(count: usize) -> Law {
        Law {
            law_number: "1".to_string(),
            id_norma: "2".to_string(),
            articles: (1..=count)
                .map(|n| ArticleRecord {
                    display_label: format!("Artículo {n}"),
                    canonical_id: n.to_string(),
                    body_text: String::new(),
                    legal_references: Default::default(),
                    source_part_id: None,
                    search_note: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_download_law() {
        let law = download_law(&FakeSource::new(), "21.595").unwrap();
        assert_eq!(law.law_number, "21595");
        assert_eq!(law.id_norma, "1195119");
        assert_eq!(law.articles.len(), 2);
        assert_eq!(law.find_part("101").unwrap().canonical_id, "2");
    }

    #[test]
    fn test_download_law_rejects_bad_number() {
        let result = download_law(&FakeSource::new(), "abc");
        assert!(matches!(result, Err(HarvesterError::InvalidLawNumber(_))));
    }

    #[test]
    fn test_detail_without_query_truncates() {
        let law = many_articles(20);
        let Resolution::Found(detail) = law.detail(None, 15).unwrap() else {
            panic!("expected articles");
        };
        assert_eq!(detail.returned_articles, 15);
        assert_eq!(detail.total_articles, Some(20));
        assert!(detail.truncation_note.is_some());
    }

    #[test]
    fn test_detail_short_law_has_no_note() {
        let law = many_articles(3);
        let detail = law.detail(Some("  "), 15).unwrap().found().unwrap();
        assert_eq!(detail.returned_articles, 3);
        assert_eq!(detail.truncation_note, None);
    }

    #[test]
    fn test_detail_with_query() {
        let law = many_articles(20);
        let detail = law.detail(Some("17"), 15).unwrap().found().unwrap();
        assert_eq!(detail.returned_articles, 1);
        assert_eq!(detail.articles[0].canonical_id, "17");
        assert_eq!(detail.total_articles, None);
    }

    #[test]
    fn test_detail_not_found_and_invalid() {
        let law = many_articles(3);
        assert!(matches!(
            law.detail(Some("99"), 15).unwrap(),
            Resolution::NotFound(_)
        ));
        assert!(matches!(
            law.detail(Some("!!!"), 15),
            Err(HarvesterError::InvalidQuery { .. })
        ));
    }

    #[test]
    fn test_global_search_skips_failing_laws() {
        let hits = global_search(&FakeSource::new(), "delitos", 10, 10).unwrap();
        let laws: Vec<_> = hits.iter().map(|h| h.law_number.as_str()).collect();
        assert_eq!(laws, vec!["21600", "21595"]);
    }

    #[test]
    fn test_global_search_stops_at_max_results() {
        let hits = global_search(&FakeSource::new(), "delitos", 10, 1).unwrap();
        assert_eq!(hits.len(), 1);
    }
}
