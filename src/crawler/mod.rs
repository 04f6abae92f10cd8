//! Crawler module for documentation fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Rendered page fetching with timeout and retry (`fetcher`)
//! - Link discovery and sitemap seeding (`discover`)
//! - Content extraction into pages and endpoints (`extractor`)
//! - The frontier and visited set (`frontier`)
//! - Overall crawl coordination (`coordinator`)

mod coordinator;
mod discover;
mod extractor;
mod fetcher;
mod frontier;

pub use coordinator::{run_crawl, CrawlController};
pub use discover::{sitemap_urls, LinkDiscoverer};
pub use extractor::{
    ContentExtractor, Extraction, ExtractionError, ExtractionErrorKind, RegionStrategy,
    DEFAULT_REGION_SELECTORS,
};
pub use fetcher::{
    build_http_client, build_renderer, classify_status, BrowserlessRenderer, FetchError,
    FetchErrorKind, HttpRenderer, PageFetcher, PageRenderer,
};
pub use frontier::{CrawlState, VisitRecord};

use crate::model::Document;
use crate::output::CrawlSummary;
use thiserror::Error;

/// Result of a crawl: the assembled document and what happened on the way
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub document: Document,
    pub summary: CrawlSummary,
}

/// Errors fatal to a crawl run
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The run was cancelled; the partial outcome is kept for best-effort persistence
    #[error("crawl aborted after {} pages", .0.document.pages.len())]
    Aborted(Box<CrawlOutcome>),

    #[error("invalid crawl configuration: {0}")]
    ConfigInvalid(String),
}
