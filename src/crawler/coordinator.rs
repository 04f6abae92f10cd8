//! Crawl controller - main crawl orchestration logic
//!
//! Breadth-first traversal from the configured start URLs:
//! - The frontier and visited set live in one [`CrawlState`] owned by the controller
//! - Up to `workers` fetches run at once, each on its own fetcher session
//! - Results are applied in dispatch order, so the frontier evolves exactly
//!   as in a sequential crawl no matter which fetch finishes first
//! - Fetch and extraction failures are recorded and the crawl moves on
//! - The run stops when the frontier is empty, the page limit is reached, or
//!   the cancellation token fires (in-flight fetches are allowed to finish)

use crate::config::{validate, validate_crawler_config, Config, CrawlerConfig};
use crate::crawler::discover::{sitemap_urls, LinkDiscoverer};
use crate::crawler::extractor::{ContentExtractor, Extraction, ExtractionError};
use crate::crawler::fetcher::{FetchError, PageFetcher};
use crate::crawler::frontier::CrawlState;
use crate::crawler::{CrawlError, CrawlOutcome};
use crate::output::{assemble, CollectedPage, CrawlSummary};
use crate::state::{RunState, VisitOutcome};
use crate::url::canonicalize;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

/// What one fetch task produced
struct Visit {
    dispatch_idx: u64,
    url: Url,
    discovery_seq: u64,
    result: Result<Fetched, FetchError>,
}

struct Fetched {
    extraction: Result<Extraction, ExtractionError>,
    links: Vec<Url>,
}

/// Drives one crawl run
pub struct CrawlController {
    crawler: CrawlerConfig,
    fetchers: Vec<PageFetcher>,
    extractor: Arc<ContentExtractor>,
    discoverer: Arc<LinkDiscoverer>,
}

impl CrawlController {
    /// Creates a controller from a full configuration
    ///
    /// One fetcher (with its own renderer session) is built per worker.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlController)` - Ready to run
    /// * `Err(CrawlError::ConfigInvalid)` - The configuration failed validation
    pub fn from_config(config: &Config) -> Result<Self, CrawlError> {
        validate(config).map_err(|e| CrawlError::ConfigInvalid(e.to_string()))?;

        let fetchers = (0..config.crawler.workers)
            .map(|_| PageFetcher::from_config(config))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CrawlError::ConfigInvalid(format!("cannot build renderer: {}", e)))?;

        let extractor = ContentExtractor::new(
            &config.extractor.content_selectors,
            config.crawler.language_filter.clone(),
        )
        .map_err(CrawlError::ConfigInvalid)?;

        Self::with_fetchers(config.crawler.clone(), extractor, fetchers)
    }

    /// Creates a controller around caller-supplied fetchers
    ///
    /// The number of fetchers bounds the number of concurrent fetches.
    pub fn with_fetchers(
        crawler: CrawlerConfig,
        extractor: ContentExtractor,
        fetchers: Vec<PageFetcher>,
    ) -> Result<Self, CrawlError> {
        validate_crawler_config(&crawler).map_err(|e| CrawlError::ConfigInvalid(e.to_string()))?;
        if fetchers.is_empty() {
            return Err(CrawlError::ConfigInvalid(
                "at least one fetcher is required".to_string(),
            ));
        }

        let discoverer =
            LinkDiscoverer::new(crawler.effective_version_filter(), crawler.follow_assets);

        Ok(Self {
            crawler,
            fetchers,
            extractor: Arc::new(extractor),
            discoverer: Arc::new(discoverer),
        })
    }

    /// Runs the crawl to completion or cancellation
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOutcome)` - Frontier exhausted or page limit reached (see `summary.truncated`)
    /// * `Err(CrawlError::Aborted)` - Cancelled; carries the partial outcome
    /// * `Err(CrawlError::ConfigInvalid)` - A start URL could not be canonicalized
    pub async fn run(&self, cancel: CancellationToken) -> Result<CrawlOutcome, CrawlError> {
        let start_urls = self
            .crawler
            .effective_start_urls()
            .iter()
            .map(|raw| {
                canonicalize(raw)
                    .map_err(|e| CrawlError::ConfigInvalid(format!("start URL '{}': {}", raw, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut state = CrawlState::new();
        for url in &start_urls {
            state.enqueue(url.clone());
        }
        if let (Some(sitemap), Some(anchor)) = (&self.crawler.sitemap_url, start_urls.first()) {
            self.seed_from_sitemap(sitemap, anchor, &mut state).await;
        }

        let max_pages = u64::from(self.crawler.max_pages);
        info!(
            "Starting crawl of {} ({} seed URLs, max {} pages, {} workers)",
            self.crawler.api_version,
            state.frontier_len(),
            max_pages,
            self.fetchers.len()
        );
        let start_time = Instant::now();

        let mut summary = CrawlSummary {
            run_state: RunState::Running,
            ..Default::default()
        };
        let mut pages: Vec<CollectedPage> = Vec::new();

        let mut idle = self.fetchers.clone();
        let mut in_flight: JoinSet<(PageFetcher, Visit)> = JoinSet::new();
        let mut finished: BTreeMap<u64, Visit> = BTreeMap::new();
        let mut dispatched: u64 = 0;
        let mut next_to_apply: u64 = 0;
        let mut last_dispatch: Option<Instant> = None;

        loop {
            while dispatched < max_pages && state.has_pending() && !idle.is_empty() {
                if !self.wait_for_slot(last_dispatch, &cancel).await {
                    break;
                }
                let Some((url, discovery_seq)) = state.next() else {
                    break;
                };
                let Some(fetcher) = idle.pop() else {
                    break;
                };
                last_dispatch = Some(Instant::now());
                debug!("Dispatching {} ({} queued)", url, state.frontier_len());

                let extractor = Arc::clone(&self.extractor);
                let discoverer = Arc::clone(&self.discoverer);
                let dispatch_idx = dispatched;
                in_flight.spawn(async move {
                    let result = visit(&url, &fetcher, &extractor, &discoverer).await;
                    (
                        fetcher,
                        Visit {
                            dispatch_idx,
                            url,
                            discovery_seq,
                            result,
                        },
                    )
                });
                dispatched += 1;
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };
            match joined {
                Ok((fetcher, visit)) => {
                    idle.push(fetcher);
                    finished.insert(visit.dispatch_idx, visit);
                }
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => warn!("Fetch task ended unexpectedly: {}", e),
            }

            while let Some(visit) = finished.remove(&next_to_apply) {
                record_visit(visit, &mut state, &mut summary, &mut pages);
                next_to_apply += 1;

                if summary.visited() % 10 == 0 {
                    info!(
                        "Progress: {} pages visited, {} queued, {:.1}s elapsed",
                        summary.visited(),
                        state.frontier_len(),
                        start_time.elapsed().as_secs_f64()
                    );
                }
            }
        }

        // Only reachable with gaps left by tasks that never reported
        for visit in std::mem::take(&mut finished).into_values() {
            record_visit(visit, &mut state, &mut summary, &mut pages);
        }

        let aborted = cancel.is_cancelled() && state.has_pending();
        summary.truncated = !aborted && dispatched >= max_pages && state.has_pending();
        if summary.truncated {
            warn!(
                "Page limit of {} reached with {} URLs still queued",
                max_pages,
                state.frontier_len()
            );
        }

        let document = assemble(&self.crawler.api_version, pages, Utc::now());
        summary.pages_in_document = document.pages.len();
        summary.run_state = if aborted {
            RunState::Aborted
        } else {
            RunState::Completed
        };

        info!(
            "Crawl {}: {} fetched, {} extraction-failed, {} fetch-failed, {} pages in {:?}",
            summary.run_state,
            summary.fetched,
            summary.extraction_failed,
            summary.fetch_failed,
            summary.pages_in_document,
            start_time.elapsed()
        );

        let outcome = CrawlOutcome { document, summary };
        if aborted {
            Err(CrawlError::Aborted(Box::new(outcome)))
        } else {
            Ok(outcome)
        }
    }

    /// Waits out the inter-page delay since the last dispatch
    ///
    /// # Returns
    ///
    /// `false` if the run was cancelled before or during the wait
    async fn wait_for_slot(&self, last_dispatch: Option<Instant>, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        let delay = self.crawler.inter_page_delay();
        if let Some(last) = last_dispatch {
            let elapsed = last.elapsed();
            if elapsed < delay {
                tokio::select! {
                    _ = cancel.cancelled() => return false,
                    _ = tokio::time::sleep(delay - elapsed) => {}
                }
            }
        }
        !cancel.is_cancelled()
    }

    /// Queues in-scope sitemap entries behind the start URLs
    async fn seed_from_sitemap(&self, sitemap: &str, anchor: &Url, state: &mut CrawlState) {
        let Some(fetcher) = self.fetchers.first() else {
            return;
        };
        match fetcher.fetch(sitemap).await {
            Ok(xml) => {
                let seeds = self.discoverer.filter_seeds(&sitemap_urls(&xml), anchor);
                let queued = seeds.into_iter().filter(|url| state.enqueue(url.clone())).count();
                info!("Seeded {} URLs from sitemap {}", queued, sitemap);
            }
            Err(e) => warn!("Could not read sitemap {}: {}", sitemap, e),
        }
    }
}

/// Fetches one URL, then extracts it and discovers its links
async fn visit(
    url: &Url,
    fetcher: &PageFetcher,
    extractor: &ContentExtractor,
    discoverer: &LinkDiscoverer,
) -> Result<Fetched, FetchError> {
    let html = fetcher.fetch(url.as_str()).await?;
    let links = discoverer.discover(&html, url);
    let extraction = extractor.extract(&html, url);
    Ok(Fetched { extraction, links })
}

/// Applies a finished visit to the crawl state, the summary and the page list
fn record_visit(
    visit: Visit,
    state: &mut CrawlState,
    summary: &mut CrawlSummary,
    pages: &mut Vec<CollectedPage>,
) {
    let Visit {
        url,
        discovery_seq,
        result,
        ..
    } = visit;

    match result {
        Ok(fetched) => {
            let discovered = fetched.links.len();
            let queued = fetched
                .links
                .into_iter()
                .filter(|link| state.enqueue(link.clone()))
                .count();
            debug!("{}: {} links, {} new", url, discovered, queued);

            match fetched.extraction {
                Ok(extraction) => {
                    state.complete(&url, VisitOutcome::Success);
                    summary.record(url.as_str(), VisitOutcome::Success, None);
                    for e in extraction.rejected {
                        warn!("Extraction failed: {}", e);
                        summary.record_rejected_section(&e.url, e.to_string());
                    }
                    pages.extend(extraction.pages.into_iter().map(|page| CollectedPage {
                        discovery_seq,
                        page,
                    }));
                }
                Err(e) => {
                    warn!("Extraction failed: {}", e);
                    state.complete(&url, VisitOutcome::ExtractionFailed);
                    summary.record(url.as_str(), VisitOutcome::ExtractionFailed, Some(e.to_string()));
                }
            }
        }
        Err(e) => {
            warn!("Fetch failed: {}", e);
            state.complete(&url, VisitOutcome::FetchFailed);
            summary.record(url.as_str(), VisitOutcome::FetchFailed, Some(e.to_string()));
        }
    }
}

/// Runs a complete crawl from configuration
///
/// # Arguments
///
/// * `config` - The run configuration
/// * `cancel` - Fired to stop the run; pages extracted so far are returned in `CrawlError::Aborted`
pub async fn run_crawl(config: &Config, cancel: CancellationToken) -> Result<CrawlOutcome, CrawlError> {
    CrawlController::from_config(config)?.run(cancel).await
}
