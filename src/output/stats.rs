//! Run summary
//!
//! Counts of what happened to every visited URL, reported at the end of
//! every run whether it completed or was aborted.

use crate::state::{RunState, VisitOutcome};

/// A URL that did not make it into the document, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub url: String,
    pub outcome: VisitOutcome,
    pub message: String,
}

/// Summary statistics for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub run_state: RunState,

    /// Pages fetched successfully, whether or not extraction worked
    pub fetched: u64,

    pub extraction_failed: u64,

    pub fetch_failed: u64,

    pub pages_in_document: usize,

    /// True if the page limit stopped the crawl with URLs still queued
    pub truncated: bool,

    pub failures: Vec<FailureRecord>,
}

impl CrawlSummary {
    /// Records the outcome of one visit
    pub fn record(&mut self, url: &str, outcome: VisitOutcome, message: Option<String>) {
        match outcome {
            VisitOutcome::Success => self.fetched += 1,
            VisitOutcome::ExtractionFailed => {
                self.fetched += 1;
                self.extraction_failed += 1;
            }
            VisitOutcome::FetchFailed => self.fetch_failed += 1,
        }

        if outcome != VisitOutcome::Success {
            self.failures.push(FailureRecord {
                url: url.to_string(),
                outcome,
                message: message.unwrap_or_default(),
            });
        }
    }

    /// Records an endpoint section left out of a page that was otherwise extracted
    ///
    /// The page's URL already counts as fetched; only the failure is added.
    pub fn record_rejected_section(&mut self, section_url: &str, message: String) {
        self.extraction_failed += 1;
        self.failures.push(FailureRecord {
            url: section_url.to_string(),
            outcome: VisitOutcome::ExtractionFailed,
            message,
        });
    }

    /// Number of URLs a fetch was attempted for
    pub fn visited(&self) -> u64 {
        self.fetched + self.fetch_failed
    }

    /// Failures with the given outcome
    pub fn failures_with(&self, outcome: VisitOutcome) -> impl Iterator<Item = &FailureRecord> {
        self.failures.iter().filter(move |f| f.outcome == outcome)
    }
}

/// Prints the summary to stdout
///
/// # Arguments
///
/// * `summary` - The run summary to display
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Run state: {}", summary.run_state);
    println!("  Pages fetched: {}", summary.fetched);
    println!("  Extraction failed: {}", summary.extraction_failed);
    println!("  Fetch failed: {}", summary.fetch_failed);
    println!("  Pages in document: {}", summary.pages_in_document);
    if summary.truncated {
        println!("  Truncated: page limit reached with URLs still queued");
    }
    println!();

    for outcome in [VisitOutcome::FetchFailed, VisitOutcome::ExtractionFailed] {
        let failures: Vec<&FailureRecord> = summary.failures_with(outcome).collect();
        if failures.is_empty() {
            continue;
        }
        println!("{} ({}):", outcome, failures.len());
        for failure in failures {
            println!("  - {}: {}", failure.url, failure.message);
        }
        println!();
    }
}
