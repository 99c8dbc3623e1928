//! Command-line interface for the harvester.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::client::{DocumentSource, LeyChileClient};
use crate::config::{SourceConfig, BCN_BASE_URL, LEYCHILE_BASE_URL, MAX_ARTICLES_RETURNED};
use crate::error::Result;
use crate::harvester::{download_law, global_search};
use crate::normalize::normalize;
use crate::parser::parse_articles;
use crate::resolver::{resolve, NotFoundDiagnostic, Resolution};
use crate::text::wrap_text_default;
use crate::types::{ArticleRecord, ArticleSummary, HtmlFragment, LawDetail, SearchHit};

/// LeyChile Harvester - Look up Chilean statutes article by article.
#[derive(Parser)]
#[command(name = "leychile-harvester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(short, long, value_enum, global = true, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Base URL of the LeyChile XML service
    #[arg(long, global = true, default_value = LEYCHILE_BASE_URL)]
    pub leychile_url: String,

    /// Base URL of the BCN viewer
    #[arg(long, global = true, default_value = BCN_BASE_URL)]
    pub bcn_url: String,
}

/// Output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Styled text for terminals.
    Text,
    /// Pretty-printed JSON.
    Json,
    /// YAML.
    Yaml,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show a law, or the articles matching a query.
    Law {
        /// Law number (e.g., 21595) or code alias (e.g., codigo-civil)
        law_number: String,

        /// Article to look up (e.g., "15", "1 bis", "Primero Transitorio")
        #[arg(short, long)]
        article: Option<String>,

        /// Maximum articles shown when no article is given
        #[arg(short, long, default_value_t = MAX_ARTICLES_RETURNED)]
        max: usize,
    },

    /// List the article identifiers of a law.
    Ids {
        /// Law number or code alias
        law_number: String,
    },

    /// Show the article of a law with the given idParte.
    Part {
        /// Law number or code alias
        law_number: String,

        /// idParte of the article
        id_parte: String,
    },

    /// Extract an article's text from the rendered BCN page.
    Html {
        /// idNorma of the law
        id_norma: String,

        /// idParte of the article
        id_parte: String,
    },

    /// Search a phrase in the most recently published laws.
    Search {
        /// Word or phrase to search for
        phrase: String,

        /// Number of recent laws to search
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..=50))]
        max_laws: u16,

        /// Maximum number of results
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..=50))]
        max_results: u16,
    },

    /// Print the canonical identifier of article labels (offline).
    Normalize {
        /// Labels to normalize
        #[arg(required = true)]
        labels: Vec<String>,
    },

    /// Parse a local LeyChile XML file (offline).
    Parse {
        /// Path to the XML file
        file: PathBuf,

        /// Article to look up
        #[arg(short, long)]
        article: Option<String>,
    },
}

/// A label and its canonical identifier.
#[derive(Debug, Serialize)]
struct NormalizedLabel<'a> {
    label: &'a str,
    canonical_id: String,
}

/// Run the CLI.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let format = cli.format;
    let source_config = SourceConfig {
        leychile_base_url: cli.leychile_url,
        bcn_base_url: cli.bcn_url,
    };

    match cli.command {
        Commands::Normalize { labels } => normalize_command(&labels, format),
        Commands::Parse { file, article } => parse_command(&file, article.as_deref(), format),
        command => {
            let client = LeyChileClient::with_config(source_config)?;
            network_command(&client, command, format)
        }
    }
}

fn network_command(
    source: &dyn DocumentSource,
    command: Commands,
    format: OutputFormat,
) -> Result<ExitCode> {
    match command {
        Commands::Law {
            law_number,
            article,
            max,
        } => {
            let law = with_spinner(&format!("Downloading law {law_number}..."), || {
                download_law(source, &law_number)
            })?;
            match law.detail(article.as_deref(), max)? {
                Resolution::Found(detail) => {
                    emit(format, &detail, print_detail)?;
                    Ok(ExitCode::SUCCESS)
                }
                Resolution::NotFound(diagnostic) => not_found(format, &diagnostic),
            }
        }
        Commands::Ids { law_number } => {
            let law = with_spinner(&format!("Downloading law {law_number}..."), || {
                download_law(source, &law_number)
            })?;
            emit(format, &law.summaries(), |summaries| print_summaries(summaries))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Part {
            law_number,
            id_parte,
        } => {
            let law = with_spinner(&format!("Downloading law {law_number}..."), || {
                download_law(source, &law_number)
            })?;
            match law.find_part(&id_parte) {
                Some(article) => {
                    emit(format, article, print_article)?;
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!(
                        "{} no article with idParte {} in law {}",
                        style("Not found:").red().bold(),
                        style(&id_parte).cyan(),
                        style(&law.law_number).cyan()
                    );
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Html { id_norma, id_parte } => {
            let fragment = with_spinner("Downloading article page...", || {
                source.fetch_html_fragment(&id_norma, &id_parte)
            })?;
            emit(format, &fragment, print_fragment)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Search {
            phrase,
            max_laws,
            max_results,
        } => {
            let hits = with_spinner(&format!("Searching \"{phrase}\"..."), || {
                global_search(source, &phrase, usize::from(max_laws), usize::from(max_results))
            })?;
            emit(format, &hits, |hits| print_hits(hits))?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Normalize { labels } => normalize_command(&labels, format),
        Commands::Parse { file, article } => parse_command(&file, article.as_deref(), format),
    }
}

fn normalize_command(labels: &[String], format: OutputFormat) -> Result<ExitCode> {
    let normalized: Vec<NormalizedLabel<'_>> = labels
        .iter()
        .map(|label| NormalizedLabel {
            label,
            canonical_id: normalize(label),
        })
        .collect();

    emit(format, &normalized, |items| {
        for item in items {
            println!("{}\t{}", item.label, style(&item.canonical_id).green());
        }
    })?;
    Ok(ExitCode::SUCCESS)
}

fn parse_command(file: &Path, article: Option<&str>, format: OutputFormat) -> Result<ExitCode> {
    let raw = std::fs::read(file)?;
    let articles = parse_articles(&raw)?;

    let Some(query) = article else {
        emit(format, &articles, |articles| articles.iter().for_each(print_article))?;
        return Ok(ExitCode::SUCCESS);
    };

    match resolve(&articles, query)? {
        Resolution::Found(found) => {
            emit(format, &found, |found| found.iter().for_each(print_article))?;
            Ok(ExitCode::SUCCESS)
        }
        Resolution::NotFound(diagnostic) => not_found(format, &diagnostic),
    }
}

/// Print a value in the requested format, using `text` for terminal output.
fn emit<T: Serialize + ?Sized>(format: OutputFormat, value: &T, text: impl FnOnce(&T)) -> Result<()> {
    match format {
        OutputFormat::Text => text(value),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml_ng::to_string(value)?),
    }
    Ok(())
}

fn not_found(format: OutputFormat, diagnostic: &NotFoundDiagnostic) -> Result<ExitCode> {
    emit(format, diagnostic, print_diagnostic)?;
    Ok(ExitCode::FAILURE)
}

fn with_spinner<T>(message: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = f();
    pb.finish_and_clear();
    result
}

fn print_article(article: &ArticleRecord) {
    println!(
        "{} {}",
        style(&article.display_label).bold().cyan(),
        style(format!("[{}]", article.canonical_id)).dim()
    );
    if let Some(id_parte) = &article.source_part_id {
        println!("  idParte: {id_parte}");
    }
    if let Some(note) = &article.search_note {
        println!("  {}", style(note).yellow());
    }
    println!();
    println!("{}", wrap_text_default(&article.body_text));
    if !article.legal_references.is_empty() {
        println!();
        println!("  {}", style("References:").bold());
        for reference in &article.legal_references {
            println!("  - {reference}");
        }
    }
    println!();
}

fn print_detail(detail: &LawDetail) {
    println!(
        "{} {} (idNorma {})",
        style("Law").bold(),
        style(&detail.law_number).cyan(),
        detail.id_norma
    );
    if let Some(total) = detail.total_articles {
        println!("  Articles: {total}");
    }
    if let Some(note) = &detail.truncation_note {
        println!("  {}", style(note).yellow());
    }
    println!();
    detail.articles.iter().for_each(print_article);
}

fn print_summaries(summaries: &[ArticleSummary]) {
    for summary in summaries {
        println!(
            "{:<12} {:<40} {}",
            summary.canonical_id,
            summary.display_label,
            summary.source_part_id.as_deref().unwrap_or("-")
        );
    }
}

fn print_fragment(fragment: &HtmlFragment) {
    println!("{} {}", style("Source:").bold(), fragment.source_url);
    println!("{} {}", style("Selector:").bold(), fragment.selector);
    println!();
    println!("{}", wrap_text_default(&fragment.text));
}

fn print_hits(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("{}", style("No results").yellow());
        return;
    }
    for hit in hits {
        println!(
            "{} {} {}",
            style(format!("Ley {}", hit.law_number)).bold(),
            style(&hit.display_label).cyan(),
            style(format!("[{}]", hit.canonical_id)).dim()
        );
        println!("  {}", hit.fragment.replace('\n', " "));
        println!();
    }
}

fn print_diagnostic(diagnostic: &NotFoundDiagnostic) {
    eprintln!("{} {}", style("Not found:").red().bold(), diagnostic.message);
    if !diagnostic.suggestions.is_empty() {
        eprintln!("  Did you mean: {}", diagnostic.suggestions.join(", "));
    }
    if !diagnostic.available_ids.is_empty() {
        eprintln!("  Available: {}", diagnostic.available_ids.join(", "));
    }
}
