//! Crawl state: the FIFO frontier and the visited set
//!
//! Owned by the crawl controller for the duration of one run and never
//! persisted. Every URL enters the visited set the moment it is queued, so
//! a URL can be queued, and therefore fetched, at most once per run.

use crate::state::{UrlState, VisitOutcome};
use std::collections::{HashMap, VecDeque};
use tracing::debug;
use url::Url;

/// What the visited set knows about one canonical URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitRecord {
    pub state: UrlState,
    /// Set once the visit finished
    pub outcome: Option<VisitOutcome>,
    /// Position at which the URL was first queued
    pub discovery_seq: u64,
}

/// Frontier plus visited set for one crawl run
#[derive(Debug, Default)]
pub struct CrawlState {
    frontier: VecDeque<Url>,
    visited: HashMap<String, VisitRecord>,
    next_seq: u64,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a canonical URL unless it has been seen before
    ///
    /// # Returns
    ///
    /// * `true` - The URL was new and is now pending
    /// * `false` - The URL was already pending, in progress or finished
    pub fn enqueue(&mut self, url: Url) -> bool {
        let key = url.as_str().to_string();
        if self.visited.contains_key(&key) {
            return false;
        }

        self.visited.insert(
            key,
            VisitRecord {
                state: UrlState::Pending,
                outcome: None,
                discovery_seq: self.next_seq,
            },
        );
        self.next_seq += 1;
        self.frontier.push_back(url);
        true
    }

    /// Takes the next pending URL and marks it in progress
    ///
    /// # Returns
    ///
    /// The URL with its discovery sequence number, or None when the frontier is empty
    pub fn next(&mut self) -> Option<(Url, u64)> {
        while let Some(url) = self.frontier.pop_front() {
            let Some(record) = self.visited.get_mut(url.as_str()) else {
                continue;
            };
            if !record.state.can_transition_to(UrlState::InProgress) {
                debug!("Skipping {} already {}", url, record.state);
                continue;
            }
            record.state = UrlState::InProgress;
            return Some((url, record.discovery_seq));
        }
        None
    }

    /// Records the outcome of a visit
    pub fn complete(&mut self, url: &Url, outcome: VisitOutcome) {
        if let Some(record) = self.visited.get_mut(url.as_str()) {
            let next = outcome.url_state();
            if record.state.can_transition_to(next) {
                record.state = next;
                record.outcome = Some(outcome);
            } else {
                debug!("Ignoring {} for {} in state {}", outcome, url, record.state);
            }
        }
    }

    pub fn record(&self, url: &Url) -> Option<&VisitRecord> {
        self.visited.get(url.as_str())
    }

    pub fn state_of(&self, url: &Url) -> Option<UrlState> {
        self.record(url).map(|r| r.state)
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.frontier.is_empty()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }
}
