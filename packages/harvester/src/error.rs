//! Error types for the harvester.
//!
//! Uses the dual-error pattern: `HarvesterError` for library consumers
//! with detailed error context, and a `Result` alias for internal use.
//!
//! Not finding an article is deliberately absent here: it is a normal
//! outcome (see [`crate::resolver::Resolution`]), while a query that cannot
//! be understood at all is [`HarvesterError::InvalidQuery`].

use thiserror::Error;

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// Invalid law number or alias.
    #[error("Invalid law number: '{0}'. Expected digits (e.g., 21595) or a known code alias (e.g., codigo-civil)")]
    InvalidLawNumber(String),

    /// Invalid idNorma.
    #[error("Invalid idNorma: '{0}'. Expected digits (e.g., 1195119)")]
    InvalidIdNorma(String),

    /// Invalid idParte.
    #[error("Invalid idParte: '{0}'. Expected letters, digits, '-' or '_'")]
    InvalidIdParte(String),

    /// The article query could not be normalized to any identifier.
    #[error("Could not understand article query '{query}'")]
    InvalidQuery { query: String },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Download of a specific upstream resource failed.
    #[error("Failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// All retry attempts failed.
    #[error("Request failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// The statute number could not be mapped to an idNorma.
    #[error("No idNorma found for law {0}")]
    NormaNotFound(String),

    /// None of the fragment selectors matched the rendered page.
    #[error("No article text found in HTML for idNorma={id_norma}, idParte={id_parte}")]
    HtmlFragmentNotFound { id_norma: String, id_parte: String },

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    /// YAML serialization error.
    #[error("YAML serialization failed: {0}")]
    YamlSerialization(#[from] serde_yaml_ng::Error),
}

impl HarvesterError {
    /// Whether the error was caused by caller input rather than upstream failure.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidLawNumber(_)
                | Self::InvalidIdNorma(_)
                | Self::InvalidIdParte(_)
                | Self::InvalidQuery { .. }
        )
    }
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;
