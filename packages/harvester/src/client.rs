//! Upstream document sources.
//!
//! [`DocumentSource`] is the seam between the parsing core and the
//! network: the core only ever sees raw bytes. [`LeyChileClient`] is the
//! production implementation; tests substitute their own.

use regex::Regex;
use reqwest::blocking::Client;
use std::sync::LazyLock;

use crate::config::{
    known_id_norma, validate_id_norma, validate_id_parte, validate_law_number, SourceConfig,
};
use crate::error::{HarvesterError, Result};
use crate::html::extract_fragment;
use crate::http::{bytes_to_string, create_client, download_bytes, download_page};
use crate::types::HtmlFragment;

/// idNorma link in the LeyChile navigation page.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ID_NORMA_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]idNorma=(\d+)").expect("valid regex"));

/// A rendered BCN page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlPage {
    /// URL the page was fetched from.
    pub url: String,

    /// Page markup.
    pub html: String,
}

/// Source of raw LeyChile documents.
///
/// Implementations are blocking; async callers run them on a blocking pool.
pub trait DocumentSource: Send + Sync {
    /// Map a law number or code alias to its idNorma.
    fn resolve_id_norma(&self, law_number: &str) -> Result<String>;

    /// Raw XML of a norma.
    fn fetch_law_xml(&self, id_norma: &str) -> Result<Vec<u8>>;

    /// Rendered page of one article.
    fn fetch_html_page(&self, id_norma: &str, id_parte: &str) -> Result<HtmlPage>;

    /// Raw XML listing of the most recently published laws.
    fn fetch_latest_laws(&self, count: usize) -> Result<Vec<u8>>;

    /// Resolve a law number and fetch its XML, returning `(id_norma, xml)`.
    fn fetch_document(&self, law_number: &str) -> Result<(String, Vec<u8>)> {
        let id_norma = self.resolve_id_norma(law_number)?;
        let xml = self.fetch_law_xml(&id_norma)?;
        Ok((id_norma, xml))
    }

    /// Fetch the rendered page of an article and extract its text.
    fn fetch_html_fragment(&self, id_norma: &str, id_parte: &str) -> Result<HtmlFragment> {
        validate_id_norma(id_norma)?;
        validate_id_parte(id_parte)?;

        let page = self.fetch_html_page(id_norma, id_parte)?;
        let fragment = extract_fragment(&page.html, id_parte).ok_or_else(|| {
            HarvesterError::HtmlFragmentNotFound {
                id_norma: id_norma.to_string(),
                id_parte: id_parte.to_string(),
            }
        })?;

        Ok(HtmlFragment {
            id_norma: id_norma.to_string(),
            id_parte: id_parte.to_string(),
            source_url: page.url,
            selector: fragment.selector,
            text: fragment.text,
        })
    }
}

/// [`DocumentSource`] backed by the LeyChile web service and the BCN viewer.
#[derive(Debug, Clone)]
pub struct LeyChileClient {
    client: Client,
    config: SourceConfig,
}

impl LeyChileClient {
    /// Client for the public LeyChile and BCN endpoints.
    pub fn new() -> Result<Self> {
        Self::with_config(SourceConfig::default())
    }

    /// Client for custom endpoints.
    pub fn with_config(config: SourceConfig) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            config,
        })
    }

    /// Endpoints in use.
    pub fn config(&self) -> &SourceConfig {
        &self.config
    }
}

impl DocumentSource for LeyChileClient {
    fn resolve_id_norma(&self, law_number: &str) -> Result<String> {
        let key = validate_law_number(law_number)?;
        if let Some(id_norma) = known_id_norma(&key) {
            tracing::debug!(law_number = %key, id_norma, "Resolved idNorma from alias table");
            return Ok(id_norma.to_string());
        }

        let url = self.config.navigate_url(&key);
        tracing::debug!(law_number = %key, url = %url, "Resolving idNorma");
        let page = bytes_to_string(&download_bytes(&self.client, &url)?);

        let id_norma = ID_NORMA_LINK
            .captures(&page)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or(HarvesterError::NormaNotFound(key))?;

        tracing::info!(law_number, id_norma = %id_norma, "Resolved idNorma");
        Ok(id_norma)
    }

    fn fetch_law_xml(&self, id_norma: &str) -> Result<Vec<u8>> {
        validate_id_norma(id_norma)?;
        let url = self.config.law_xml_url(id_norma);
        tracing::info!(id_norma, "Downloading law XML");
        download_bytes(&self.client, &url)
    }

    fn fetch_html_page(&self, id_norma: &str, id_parte: &str) -> Result<HtmlPage> {
        validate_id_norma(id_norma)?;
        validate_id_parte(id_parte)?;
        let url = self.config.html_url(id_norma, id_parte);
        tracing::info!(id_norma, id_parte, "Downloading article page");
        let html = download_page(&self.client, &url)?;
        Ok(HtmlPage { url, html })
    }

    fn fetch_latest_laws(&self, count: usize) -> Result<Vec<u8>> {
        let url = self.config.latest_laws_url(count);
        tracing::info!(count, "Downloading latest laws listing");
        download_bytes(&self.client, &url)
    }
}
