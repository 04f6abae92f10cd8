//! Link discovery
//!
//! Finds the documentation pages a rendered page links to:
//! - `<a href>` targets and `<link rel="canonical">`, resolved against the page URL
//! - hash routes (`href="#/v2/loans"`) count as page links; plain anchors do not
//! - only links on the same site whose route lies under the version filter
//! - documents and images are skipped unless asset following is enabled
//!
//! Sitemaps can seed the frontier through [`sitemap_urls`].

use crate::url::{canonicalize_url, in_scope, route_path};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// File extensions treated as assets rather than documentation pages
const ASSET_EXTENSIONS: &[&str] = &[
    "pdf", "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "zip",
];

/// Extracts in-scope documentation links from rendered pages
#[derive(Debug, Clone)]
pub struct LinkDiscoverer {
    version_filter: String,
    follow_assets: bool,
}

impl LinkDiscoverer {
    pub fn new(version_filter: impl Into<String>, follow_assets: bool) -> Self {
        Self {
            version_filter: version_filter.into(),
            follow_assets,
        }
    }

    /// Discovers canonical page URLs linked from `html`
    ///
    /// The result has set semantics (no duplicates, never the page itself)
    /// and keeps the order links appear in the page. A page without
    /// qualifying links yields an empty result.
    ///
    /// # Example
    ///
    /// ```
    /// use mambu_docs::crawler::LinkDiscoverer;
    /// use url::Url;
    ///
    /// let html = r##"<nav>
    ///     <a href="#/v2/loans">Loans</a>
    ///     <a href="#/v1/loans">Old loans</a>
    ///     <a href="#top">Top</a>
    /// </nav>"##;
    /// let base = Url::parse("https://api.mambu.com/#/v2").unwrap();
    ///
    /// let links = LinkDiscoverer::new("/v2", false).discover(html, &base);
    /// assert_eq!(links.len(), 1);
    /// assert_eq!(links[0].as_str(), "https://api.mambu.com/#/v2/loans");
    /// ```
    pub fn discover(&self, html: &str, base_url: &Url) -> Vec<Url> {
        let document = Html::parse_document(html);
        let self_key = canonicalize_url(base_url.clone()).ok();

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for (href, is_download) in candidate_hrefs(&document) {
            if is_download && !self.follow_assets {
                continue;
            }

            let Some(resolved) = resolve_link(&href, base_url) else {
                continue;
            };
            let Ok(canonical) = canonicalize_url(resolved) else {
                continue;
            };

            if Some(&canonical) == self_key.as_ref() {
                continue;
            }
            if !in_scope(base_url, &canonical, &self.version_filter) {
                continue;
            }
            if !self.follow_assets && is_asset(&canonical) {
                continue;
            }

            if seen.insert(canonical.to_string()) {
                links.push(canonical);
            }
        }

        links
    }

    /// Filters sitemap entries down to canonical in-scope page URLs
    pub fn filter_seeds(&self, urls: &[String], anchor: &Url) -> Vec<Url> {
        let mut seen = HashSet::new();
        urls.iter()
            .filter_map(|raw| Url::parse(raw).ok())
            .filter_map(|url| canonicalize_url(url).ok())
            .filter(|url| in_scope(anchor, url, &self.version_filter))
            .filter(|url| self.follow_assets || !is_asset(url))
            .filter(|url| seen.insert(url.to_string()))
            .collect()
    }
}

/// Collects `(href, has_download_attribute)` pairs from anchors and canonical links
fn candidate_hrefs(document: &Html) -> Vec<(String, bool)> {
    let mut hrefs = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                let is_download = element.value().attr("download").is_some();
                hrefs.push((href.to_string(), is_download));
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(href) = element.value().attr("href") {
                hrefs.push((href.to_string(), false));
            }
        }
    }

    hrefs
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes and data: URIs
/// - fragment-only anchors that are not hash routes
/// - Invalid or non-HTTP(S) URLs
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') && !href.starts_with("#/") {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(absolute_url)
    } else {
        None
    }
}

/// Returns true if the URL's route ends in a document or image extension
fn is_asset(url: &Url) -> bool {
    let route = route_path(url);
    let last_segment = route.rsplit('/').next().unwrap_or_default();
    match last_segment.rsplit_once('.') {
        Some((_, extension)) => ASSET_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str()),
        None => false,
    }
}

fn loc_regex() -> &'static Regex {
    static LOC: OnceLock<Regex> = OnceLock::new();
    LOC.get_or_init(|| Regex::new(r"(?s)<loc>\s*(.*?)\s*</loc>").expect("valid sitemap regex"))
}

/// Extracts the `<loc>` entries of a sitemap
///
/// # Example
///
/// ```
/// use mambu_docs::crawler::sitemap_urls;
///
/// let xml = "<urlset><url><loc> https://docs.example/api/v2/loans </loc></url></urlset>";
/// assert_eq!(sitemap_urls(xml), vec!["https://docs.example/api/v2/loans".to_string()]);
/// ```
pub fn sitemap_urls(xml: &str) -> Vec<String> {
    loc_regex()
        .captures_iter(xml)
        .filter_map(|captures| captures.get(1))
        .map(|m| m.as_str().replace("&amp;", "&"))
        .filter(|loc| !loc.is_empty())
        .collect()
}
