use std::sync::Arc;

use leychile_harvester::config::{validate_id_norma, validate_law_number};
use leychile_harvester::parser::parse_articles;
use leychile_harvester::types::Law;
use leychile_harvester::DocumentSource;

use crate::cache::TtlCache;
use crate::config::ApiConfig;
use crate::error::ApiError;

/// Shared state of the service.
///
/// The document source is blocking; every call to it goes through
/// [`AppState::run_blocking`].
#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn DocumentSource>,
    norma_cache: Arc<TtlCache<String>>,
    xml_cache: Arc<TtlCache<Arc<Vec<u8>>>>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(source: Arc<dyn DocumentSource>, config: ApiConfig) -> Self {
        Self {
            source,
            norma_cache: Arc::new(TtlCache::new(
                "id_norma",
                config.cache_ttl,
                config.norma_cache_size,
            )),
            xml_cache: Arc::new(TtlCache::new("law_xml", config.cache_ttl, config.xml_cache_size)),
            config: Arc::new(config),
        }
    }

    /// Run a document source call on the blocking pool.
    pub async fn run_blocking<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn DocumentSource) -> leychile_harvester::Result<T> + Send + 'static,
    {
        let source = Arc::clone(&self.source);
        let result = tokio::task::spawn_blocking(move || f(source.as_ref())).await?;
        Ok(result?)
    }

    /// idNorma of a law, cached by law number.
    pub async fn id_norma(&self, law_number: &str) -> Result<String, ApiError> {
        let key = validate_law_number(law_number)?;
        let lookup = key.clone();
        self.norma_cache
            .get_or_fetch(&key, move || {
                self.run_blocking(move |source| source.resolve_id_norma(&lookup))
            })
            .await
    }

    /// Raw XML of a norma, cached by idNorma.
    pub async fn law_xml(&self, id_norma: &str) -> Result<Arc<Vec<u8>>, ApiError> {
        validate_id_norma(id_norma)?;
        let lookup = id_norma.to_string();
        self.xml_cache
            .get_or_fetch(id_norma, move || {
                self.run_blocking(move |source| source.fetch_law_xml(&lookup).map(Arc::new))
            })
            .await
    }

    /// Download (or reuse) and parse a law.
    pub async fn load_law(&self, law_number: &str) -> Result<Law, ApiError> {
        let law_number = validate_law_number(law_number)?;
        let id_norma = self.id_norma(&law_number).await?;
        let xml = self.law_xml(&id_norma).await?;
        let articles = tokio::task::spawn_blocking(move || parse_articles(&xml)).await??;

        tracing::debug!(
            law_number = %law_number,
            id_norma = %id_norma,
            articles = articles.len(),
            "Loaded law"
        );
        Ok(Law {
            law_number,
            id_norma,
            articles,
        })
    }
}
