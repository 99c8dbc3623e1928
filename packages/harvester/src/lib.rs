//! LeyChile Harvester - Retrieve Chilean statutes and look up their articles.
//!
//! This crate downloads statutes from the LeyChile XML service, parses
//! them into article records and resolves free-form article queries
//! ("15", "1 bis", "Primero Transitorio", "XV") against them.
//!
//! # Example
//!
//! ```
//! use leychile_harvester::{normalize, parse_articles, resolve, Resolution};
//!
//! assert_eq!(normalize("Artículo 1 bis"), "1bis");
//!
//! let xml = r#"<Norma xmlns="http://www.leychile.cl/esquemas">
//!   <EstructuraFuncional tipoParte="Artículo" idParte="1">
//!     <Texto>Artículo 1 bis.- Intercalado por la Ley N° 21.595.</Texto>
//!   </EstructuraFuncional>
//! </Norma>"#;
//! let articles = parse_articles(xml.as_bytes()).unwrap();
//! let Resolution::Found(found) = resolve(&articles, "1BIS").unwrap() else {
//!     panic!("article should be found");
//! };
//! assert_eq!(found[0].display_label, "Artículo 1 bis");
//! ```
//!
//! # Architecture
//!
//! The pure core:
//!
//! - [`text`]: Text cleaning, truncation and accent folding
//! - [`normalize`](mod@normalize): Article label normalization
//! - [`references`]: Legal citation extraction
//! - [`parser`]: LeyChile XML parsing
//! - [`resolver`]: Layered article lookup with suggestions
//! - [`search`]: Phrase search over parsed articles
//!
//! Around it:
//!
//! - [`config`]: Configuration constants and validation
//! - [`types`]: Core data types (ArticleRecord, Law, ...)
//! - [`error`]: Error types and Result alias
//! - [`http`]: HTTP client with retries
//! - [`client`]: Upstream document sources
//! - [`html`]: Article extraction from rendered pages
//! - [`xml`]: XML utilities
//! - [`harvester`]: Main harvester service
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod harvester;
pub mod html;
pub mod http;
pub mod normalize;
pub mod parser;
pub mod references;
pub mod resolver;
pub mod search;
pub mod text;
pub mod types;
pub mod xml;

// Re-export main functions
pub use harvester::{download_law, global_search};
pub use normalize::normalize;
pub use parser::parse_articles;
pub use resolver::{resolve, Resolution};

// Re-export commonly used items
pub use client::{DocumentSource, LeyChileClient};
pub use config::{validate_id_norma, validate_id_parte, validate_law_number};
pub use error::{HarvesterError, Result};
pub use types::{ArticleRecord, Law, LawDetail};
