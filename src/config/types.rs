use crate::model::LanguageFilter;
use crate::retry::RetryPolicy;
use serde::Deserialize;
use std::time::Duration;

/// Base URL of the Mambu API reference
pub const MAMBU_API_URL: &str = "https://api.mambu.com";

/// Main configuration structure for Mambu-Docs
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub publish: PublishConfig,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// API version being scraped (v1, v2, payments, streaming, ...)
    #[serde(rename = "api-version", default = "default_api_version")]
    pub api_version: String,

    /// Start URLs; derived from the API version when empty
    #[serde(rename = "start-urls", default)]
    pub start_urls: Vec<String>,

    /// Route prefix a page must live under; "/{api-version}" when unset
    #[serde(rename = "version-filter", default)]
    pub version_filter: Option<String>,

    /// Code-sample languages to keep
    #[serde(rename = "language-filter", default)]
    pub language_filter: LanguageFilter,

    /// Safety bound on the number of fetches in one run
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Pause between fetches (milliseconds)
    #[serde(rename = "inter-page-delay", default = "default_inter_page_delay")]
    pub inter_page_delay: u64,

    /// Hard bound on waiting for a page to render (milliseconds)
    #[serde(rename = "fetch-timeout", default = "default_fetch_timeout")]
    pub fetch_timeout: u64,

    /// Number of concurrent fetch workers, each with its own session
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Follow links to PDFs and images
    #[serde(rename = "follow-assets", default)]
    pub follow_assets: bool,

    /// Optional sitemap used to seed the frontier
    #[serde(rename = "sitemap-url", default)]
    pub sitemap_url: Option<String>,

    #[serde(default)]
    pub retry: RetryConfig,
}

impl CrawlerConfig {
    /// Start URLs to seed the crawl with
    ///
    /// Explicit `start-urls` win; otherwise the API version maps to its
    /// hash-routed page on the Mambu API reference.
    pub fn effective_start_urls(&self) -> Vec<String> {
        if !self.start_urls.is_empty() {
            return self.start_urls.clone();
        }
        vec![api_version_url(&self.api_version)]
    }

    /// Route prefix pages must match to be in scope
    pub fn effective_version_filter(&self) -> String {
        match &self.version_filter {
            Some(filter) => filter.clone(),
            None => format!("/{}", self.api_version.trim_matches('/')),
        }
    }

    pub fn inter_page_delay(&self) -> Duration {
        Duration::from_millis(self.inter_page_delay)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout)
    }
}

/// Returns the documentation entry point for an API version
///
/// # Examples
///
/// ```
/// use mambu_docs::config::api_version_url;
///
/// assert_eq!(api_version_url("v2"), "https://api.mambu.com/#/v2");
/// assert_eq!(api_version_url("payments"), "https://api.mambu.com/#/payments");
/// ```
pub fn api_version_url(api_version: &str) -> String {
    format!("{}/#/{}", MAMBU_API_URL, api_version.trim_matches('/'))
}

/// Retry policy settings shared by fetching and publishing
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds)
    #[serde(rename = "base-delay", default = "default_base_delay")]
    pub base_delay: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay: default_base_delay(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay),
            self.multiplier,
        )
    }
}

/// Which collaborator renders pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Plain HTTP GET, no client-side rendering
    #[default]
    Http,
    /// Headless browser behind a Browserless `/content` endpoint
    Browserless,
}

/// Page renderer configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RendererConfig {
    #[serde(default)]
    pub kind: RendererKind,

    /// Browserless base URL
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub token: Option<String>,

    /// Element to wait for before the page counts as rendered
    #[serde(rename = "wait-for-selector", default)]
    pub wait_for_selector: Option<String>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Content extraction overrides
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractorConfig {
    /// CSS selectors for the main content region, tried in order
    #[serde(rename = "content-selectors", default)]
    pub content_selectors: Vec<String>,
}

/// Local output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory the artifacts are written to
    pub directory: String,

    /// Prefix of every artifact name
    #[serde(rename = "artifact-prefix", default = "default_artifact_prefix")]
    pub artifact_prefix: String,
}

/// Remote publish configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Root of the object store (a mounted shared drive)
    #[serde(rename = "store-root", default)]
    pub store_root: Option<String>,

    /// Location the current generation is published to
    #[serde(default = "default_target")]
    pub target: String,

    /// Location previous generations are moved to
    #[serde(default = "default_archive")]
    pub archive: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            store_root: None,
            target: default_target(),
            archive: default_archive(),
        }
    }
}

fn default_api_version() -> String {
    "v2".to_string()
}

fn default_max_pages() -> u32 {
    500
}

fn default_inter_page_delay() -> u64 {
    1000
}

fn default_fetch_timeout() -> u64 {
    30_000
}

fn default_workers() -> u32 {
    1
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    1000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_artifact_prefix() -> String {
    "mambu_api_".to_string()
}

fn default_target() -> String {
    "current".to_string()
}

fn default_archive() -> String {
    "archive".to_string()
}
