//! Page fetching
//!
//! This module retrieves rendered HTML for documentation pages:
//! - `PageRenderer`: the collaborator seam (plain HTTP or a headless browser service)
//! - `HttpRenderer`: GET with the configured user agent, no script execution
//! - `BrowserlessRenderer`: POST to a Browserless `/content` endpoint that waits for the page to settle
//! - `PageFetcher`: hard timeout plus retry on transient failures around any renderer
//!
//! # Error classification
//!
//! | Condition | Kind | Retried |
//! |-----------|------|---------|
//! | HTTP 404, 410 and other 4xx | NotFound | no |
//! | HTTP 401, 403, 429 | Blocked | no |
//! | HTTP 408, 504, render timeout | Timeout | yes |
//! | Other 5xx, connection errors | Network | yes |

use crate::config::{Config, RendererConfig, RendererKind, UserAgentConfig};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Category of a fetch failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    NotFound,
    Timeout,
    Network,
    Blocked,
}

impl FetchErrorKind {
    /// Only transient kinds are retried; the others are terminal for the URL
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Timeout)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Blocked => "blocked",
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed attempt to obtain rendered HTML for a URL
#[derive(Debug, Clone, Error)]
#[error("{kind} fetching {url}: {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub url: String,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// Maps a non-success HTTP status to a fetch error kind
///
/// Returns None for success statuses.
pub fn classify_status(status: StatusCode) -> Option<FetchErrorKind> {
    if status.is_success() {
        return None;
    }
    let kind = match status.as_u16() {
        401 | 403 | 429 => FetchErrorKind::Blocked,
        408 | 504 => FetchErrorKind::Timeout,
        code if code >= 500 => FetchErrorKind::Network,
        _ => FetchErrorKind::NotFound,
    };
    Some(kind)
}

fn classify_reqwest_error(url: &str, e: &reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::new(FetchErrorKind::Timeout, url, "request timed out")
    } else if e.is_connect() {
        FetchError::new(FetchErrorKind::Network, url, format!("connection failed: {}", e))
    } else {
        FetchError::new(FetchErrorKind::Network, url, e.to_string())
    }
}

/// Something that can produce the rendered HTML of a page
///
/// Implementations own their session; the crawler gives every worker its own
/// renderer instance.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Renders `url`, giving up after `timeout`
    async fn render(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

/// Builds an HTTP client with the crawler's user agent
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Whole-request timeout
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use mambu_docs::config::UserAgentConfig;
/// use mambu_docs::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "MambuDocs".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "docs@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages with a plain GET
///
/// Suitable for statically served documentation; hash-routed single-page
/// sites need [`BrowserlessRenderer`].
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(url, &e))?;

        let status = response.status();
        if let Some(kind) = classify_status(status) {
            return Err(FetchError::new(kind, url, format!("HTTP {}", status.as_u16())));
        }

        response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(url, &e))
    }
}

/// Fetches fully rendered HTML through a Browserless `/content` endpoint
///
/// The browser waits for network idle and, when configured, for a selector
/// to appear; both waits are bounded by the fetch timeout.
pub struct BrowserlessRenderer {
    client: Client,
    base_url: String,
    token: Option<String>,
    wait_for_selector: Option<String>,
}

impl BrowserlessRenderer {
    pub fn new(
        client: Client,
        base_url: &str,
        token: Option<&str>,
        wait_for_selector: Option<&str>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            wait_for_selector: wait_for_selector.map(String::from),
        }
    }

    fn request_body(&self, url: &str, timeout: Duration) -> serde_json::Value {
        let timeout_ms = timeout.as_millis() as u64;
        let mut body = serde_json::json!({
            "url": url,
            "gotoOptions": { "waitUntil": "networkidle2", "timeout": timeout_ms },
        });
        if let Some(selector) = &self.wait_for_selector {
            body["waitForSelector"] = serde_json::json!({
                "selector": selector,
                "timeout": timeout_ms,
            });
        }
        body
    }
}

#[async_trait]
impl PageRenderer for BrowserlessRenderer {
    async fn render(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let endpoint = format!("{}/content", self.base_url);
        let mut request = self.client.post(&endpoint);
        if let Some(token) = &self.token {
            request = request.query(&[("token", token.as_str())]);
        }

        let response = request
            .json(&self.request_body(url, timeout))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(url, &e))?;

        let status = response.status();
        if let Some(kind) = classify_status(status) {
            let message = response.text().await.unwrap_or_default();
            return Err(FetchError::new(
                kind,
                url,
                format!("renderer returned HTTP {}: {}", status.as_u16(), message),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(url, &e))
    }
}

/// Builds one renderer (one session) from configuration
pub fn build_renderer(
    renderer: &RendererConfig,
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Arc<dyn PageRenderer>, reqwest::Error> {
    let client = build_http_client(user_agent, timeout)?;
    let renderer: Arc<dyn PageRenderer> = match renderer.kind {
        RendererKind::Http => Arc::new(HttpRenderer::new(client)),
        RendererKind::Browserless => Arc::new(BrowserlessRenderer::new(
            client,
            renderer.endpoint.as_deref().unwrap_or_default(),
            renderer.token.as_deref(),
            renderer.wait_for_selector.as_deref(),
        )),
    };
    Ok(renderer)
}

/// Retrieves rendered HTML with a hard time bound and retries
#[derive(Clone)]
pub struct PageFetcher {
    renderer: Arc<dyn PageRenderer>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl PageFetcher {
    pub fn new(renderer: Arc<dyn PageRenderer>, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            renderer,
            timeout,
            retry,
        }
    }

    /// Builds a fetcher with its own session from the run configuration
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let timeout = config.crawler.fetch_timeout();
        let renderer = build_renderer(&config.renderer, &config.user_agent, timeout)?;
        Ok(Self::new(renderer, timeout, config.crawler.retry.to_policy()))
    }

    /// Fetches the rendered HTML of `url`
    ///
    /// A render that does not settle within the timeout fails with
    /// `FetchErrorKind::Timeout`. `Network` and `Timeout` failures are retried
    /// with exponential backoff; `NotFound` and `Blocked` are returned at once.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!("Fetching {}", url);
        self.retry
            .run(
                url,
                move || async move {
                    match tokio::time::timeout(self.timeout, self.renderer.render(url, self.timeout))
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(FetchError::new(
                            FetchErrorKind::Timeout,
                            url,
                            format!("page did not settle within {:?}", self.timeout),
                        )),
                    }
                },
                FetchError::is_retryable,
            )
            .await
    }
}
