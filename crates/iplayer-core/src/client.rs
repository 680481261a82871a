//! HTTP client for BBC iPlayer pages
//!
//! This module fetches program pages as text and resolves relative links
//! against the site's base authority. Failed requests are not retried.

use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::error::{IplayerError, Result};

/// Base URL for BBC iPlayer
pub const IPLAYER_BASE_URL: &str = "https://www.bbc.co.uk";

/// Default User-Agent mimicking a modern browser
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default Accept-Language header for UK content
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-GB,en;q=0.9";

/// Configuration for the iPlayer HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Authority relative links are resolved against (default: https://www.bbc.co.uk)
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: IPLAYER_BASE_URL.to_string(),
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// HTTP client for iPlayer pages
///
/// Cheap to share behind an `Arc`; the underlying `reqwest::Client` pools
/// connections across concurrent series crawls.
pub struct IplayerClient {
    /// Underlying HTTP client
    client: reqwest::Client,
    /// Parsed base authority
    base_url: Url,
}

impl IplayerClient {
    /// Create a new client with default configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    ///
    /// # Arguments
    /// * `config` - Client configuration
    ///
    /// # Errors
    /// - `IplayerError::InvalidUrl` - `base_url` is not an absolute URL
    /// - `IplayerError::HttpError` - the HTTP client cannot be built
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE),
        );

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// The base authority links are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch the markup of an absolute page URL
    ///
    /// # Returns
    /// The response body as text
    ///
    /// # Errors
    /// - `IplayerError::NotFound` - Server returned 404
    /// - `IplayerError::HttpError` - Network error or any other unsuccessful status
    pub async fn fetch(&self, url: &str) -> Result<String> {
        debug!(url, "fetching page");

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(IplayerError::NotFound(url.to_string()));
        }

        let body = response.error_for_status()?.text().await?;
        debug!(url, bytes = body.len(), "page fetched");
        Ok(body)
    }

    /// Resolve an href against the base authority
    ///
    /// Absolute hrefs are returned unchanged.
    pub fn resolve(&self, href: &str) -> Result<String> {
        resolve_href(self.base_url.as_str(), href)
    }
}

/// Resolve `href` relative to `base`.
///
/// # Examples
/// ```
/// use iplayer_core::client::resolve_href;
///
/// assert_eq!(
///     resolve_href("https://www.bbc.co.uk", "/iplayer/episode/b0074dlv").unwrap(),
///     "https://www.bbc.co.uk/iplayer/episode/b0074dlv"
/// );
/// assert_eq!(
///     resolve_href("https://www.bbc.co.uk/iplayer/episodes/b006q2x0?page=3", "?page=4").unwrap(),
///     "https://www.bbc.co.uk/iplayer/episodes/b006q2x0?page=4"
/// );
/// ```
pub fn resolve_href(base: &str, href: &str) -> Result<String> {
    let base = Url::parse(base)?;
    let joined = base
        .join(href)
        .map_err(|e| IplayerError::ParseError(format!("cannot resolve link '{}': {}", href, e)))?;
    Ok(joined.to_string())
}
