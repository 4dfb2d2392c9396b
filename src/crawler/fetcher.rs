//! HTTP fetcher implementation
//!
//! This module handles all page requests for the harvester, including:
//! - Building the HTTP client with the identifying headers
//! - Single GET requests for listing pages
//! - Windowed GET batches for recipe pages
//! - Turning failures into soft [`FetchOutcome`] variants

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::batch::run_windowed;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use std::time::Duration;

/// Result of a page fetch
///
/// Fetching never fails hard: a page that cannot be read simply contributes
/// no links to the crawl.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Successfully fetched the page
    Page {
        /// The requested URL
        url: String,
        /// Final URL after redirects
        final_url: String,
        /// Decoded page body
        body: String,
    },

    /// The server answered with a non-success status
    Unreachable {
        /// The requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The request or body read failed
    NetworkError {
        /// The requested URL
        url: String,
        /// Error description
        error: String,
    },
}

impl FetchOutcome {
    /// The URL this outcome belongs to
    pub fn url(&self) -> &str {
        match self {
            Self::Page { url, .. } | Self::Unreachable { url, .. } | Self::NetworkError { url, .. } => {
                url
            }
        }
    }

    /// Returns true if a body was received
    pub fn is_page(&self) -> bool {
        matches!(self, Self::Page { .. })
    }

    /// The page body, or an empty string for soft failures
    pub fn into_body(self) -> String {
        match self {
            Self::Page { body, .. } => body,
            _ => String::new(),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// Every request carries `User-Agent: <crawler-name>/<crawler-version>` and
/// `Accept: */*`.
///
/// # Example
///
/// ```no_run
/// use hf_harvest::config::{CrawlerConfig, UserAgentConfig};
/// use hf_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

    Client::builder()
        .user_agent(agent.header_value())
        .default_headers(headers)
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a single page
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | 2xx | `Page` with the decoded body |
/// | any other status | `Unreachable`, logged as a warning |
/// | transport or decode error | `NetworkError`, logged as a warning |
pub async fn fetch_page(client: &Client, url: &str) -> FetchOutcome {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Could not reach {}: {}", url, e);
            return FetchOutcome::NetworkError {
                url: url.to_string(),
                error: e.to_string(),
            };
        }
    };

    let status = response.status();
    let final_url = response.url().to_string();
    tracing::debug!("GET {} -> {} ({})", url, status, final_url);

    if !status.is_success() {
        tracing::warn!("The following url could not be reached: {} (HTTP {})", url, status);
        return FetchOutcome::Unreachable {
            url: url.to_string(),
            status: status.as_u16(),
        };
    }

    match response.text().await {
        Ok(body) => FetchOutcome::Page {
            url: url.to_string(),
            final_url,
            body,
        },
        Err(e) => {
            tracing::warn!("Failed to read body of {}: {}", url, e);
            FetchOutcome::NetworkError {
                url: url.to_string(),
                error: e.to_string(),
            }
        }
    }
}

/// Fetches many pages in windows of `concurrency` requests
///
/// Returns one outcome per URL, window by window.
pub async fn fetch_pages(client: &Client, urls: Vec<String>, concurrency: usize) -> Vec<FetchOutcome> {
    let outcome = run_windowed(urls, concurrency, |url| {
        let client = client.clone();
        async move { fetch_page(&client, &url).await }
    })
    .await;

    if outcome.aborted > 0 {
        tracing::warn!("{} page fetches aborted", outcome.aborted);
    }

    outcome.results
}
