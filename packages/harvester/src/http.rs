//! HTTP client wrapper for downloading from LeyChile and BCN.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::USER_AGENT as USER_AGENT_HEADER;

use crate::config::HTTP_TIMEOUT_SECS;
use crate::error::{HarvesterError, Result};

/// User agent string identifying this harvester.
const USER_AGENT: &str = concat!("leychile-harvester/", env!("CARGO_PKG_VERSION"));

/// User agent sent to the BCN viewer, which serves reduced pages to unknown agents.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Maximum number of attempts for transient failures.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Create a configured HTTP client.
pub fn create_client() -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Download content from a URL with retry logic.
///
/// Uses exponential backoff for transient failures (connection errors,
/// timeouts, 5xx responses). Client errors (4xx) fail immediately.
pub fn download_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    download(client, url, None)
}

/// Download a rendered page as text, presenting a browser user agent.
pub fn download_page(client: &Client, url: &str) -> Result<String> {
    download(client, url, Some(BROWSER_USER_AGENT)).map(|bytes| bytes_to_string(&bytes))
}

/// Decode a response body as UTF-8, replacing invalid sequences.
pub fn bytes_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn download(client: &Client, url: &str, user_agent: Option<&str>) -> Result<Vec<u8>> {
    let mut last_error: Option<String> = None;

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            // 500ms, 1000ms, ...
            let delay = RETRY_BASE_DELAY_MS * (1 << (attempt - 1));
            tracing::debug!(attempt, delay_ms = delay, url, "Retrying after delay");
            thread::sleep(Duration::from_millis(delay));
        }

        let mut request = client.get(url);
        if let Some(agent) = user_agent {
            request = request.header(USER_AGENT_HEADER, agent);
        }

        match request.send() {
            Ok(response) => {
                let status = response.status();

                if status.is_server_error() {
                    tracing::warn!(
                        status = %status,
                        attempt = attempt + 1,
                        max_retries = MAX_RETRIES,
                        url,
                        "Server error, will retry"
                    );
                    last_error = Some(format!("Server error: {status}"));
                    continue;
                }

                let response = response
                    .error_for_status()
                    .map_err(|source| HarvesterError::Download {
                        url: url.to_string(),
                        source,
                    })?;
                let bytes = response.bytes()?;
                return Ok(bytes.to_vec());
            }
            Err(e) if e.is_connect() || e.is_timeout() => {
                tracing::warn!(
                    error = %e,
                    attempt = attempt + 1,
                    max_retries = MAX_RETRIES,
                    url,
                    "Connection error, will retry"
                );
                last_error = Some(e.to_string());
            }
            Err(source) => {
                return Err(HarvesterError::Download {
                    url: url.to_string(),
                    source,
                });
            }
        }
    }

    Err(HarvesterError::RetriesExhausted {
        attempts: MAX_RETRIES,
        message: last_error.unwrap_or_else(|| "Unknown error".to_string()),
    })
}
