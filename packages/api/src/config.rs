//! Service configuration read from the environment.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use leychile_harvester::config::{SourceConfig, MAX_ARTICLES_RETURNED};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_NORMA_CACHE_SIZE: usize = 200;
pub const DEFAULT_XML_CACHE_SIZE: usize = 50;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub source: SourceConfig,
    pub cache_ttl: Duration,
    /// Entries in the law number → idNorma cache.
    pub norma_cache_size: usize,
    /// Entries in the idNorma → XML cache.
    pub xml_cache_size: usize,
    /// Articles returned by `/ley` when no article is requested.
    pub max_articles: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            source: SourceConfig::default(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            norma_cache_size: DEFAULT_NORMA_CACHE_SIZE,
            xml_cache_size: DEFAULT_XML_CACHE_SIZE,
            max_articles: MAX_ARTICLES_RETURNED,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Unparseable values fall back to their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let source = SourceConfig {
            leychile_base_url: lookup("LEYCHILE_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.source.leychile_base_url),
            bcn_base_url: lookup("BCN_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.source.bcn_base_url),
        };

        let config = Self {
            bind_addr: parsed(&lookup, "LEYCHILE_BIND_ADDR", defaults.bind_addr),
            source,
            cache_ttl: Duration::from_secs(parsed(
                &lookup,
                "LEYCHILE_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL_SECS,
            )),
            norma_cache_size: parsed(&lookup, "LEYCHILE_NORMA_CACHE_SIZE", defaults.norma_cache_size)
                .max(1),
            xml_cache_size: parsed(&lookup, "LEYCHILE_XML_CACHE_SIZE", defaults.xml_cache_size).max(1),
            max_articles: parsed(&lookup, "LEYCHILE_MAX_ARTICLES", defaults.max_articles).max(1),
        };

        tracing::info!(
            bind_addr = %config.bind_addr,
            leychile = %config.source.leychile_base_url,
            bcn = %config.source.bcn_base_url,
            cache_ttl_secs = config.cache_ttl.as_secs(),
            "Loaded configuration"
        );
        config
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(key, value = %raw, "Invalid configuration value, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> ApiConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.norma_cache_size, 200);
        assert_eq!(config.xml_cache_size, 50);
        assert_eq!(config.max_articles, 15);
        assert_eq!(config.source, SourceConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("LEYCHILE_BIND_ADDR", "127.0.0.1:9000"),
            ("LEYCHILE_BASE_URL", "http://localhost:1234/"),
            ("LEYCHILE_CACHE_TTL_SECS", "60"),
            ("LEYCHILE_MAX_ARTICLES", "5"),
        ]);
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.source.leychile_base_url, "http://localhost:1234");
        assert_eq!(config.source.bcn_base_url, SourceConfig::default().bcn_base_url);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.max_articles, 5);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = config_from(&[
            ("LEYCHILE_BIND_ADDR", "not an address"),
            ("LEYCHILE_XML_CACHE_SIZE", "-3"),
            ("LEYCHILE_NORMA_CACHE_SIZE", "0"),
        ]);
        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.xml_cache_size, 50);
        assert_eq!(config.norma_cache_size, 1);
    }
}
