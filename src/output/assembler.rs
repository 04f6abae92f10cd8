//! Document assembly
//!
//! Merges extracted pages into one [`Document`] in table-of-contents order
//! and derives the heading outline the narrative rendering uses.
//!
//! Ordering is a pre-order walk of the section tree: sections and pages
//! are placed in the order they were first discovered, so the result does
//! not depend on which worker finished first.

use crate::model::{Document, Page};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// Deepest Markdown heading level
const MAX_HEADING_LEVEL: usize = 6;

/// An extracted page with the position its URL was discovered at
#[derive(Debug, Clone)]
pub struct CollectedPage {
    pub discovery_seq: u64,
    pub page: Page,
}

/// Builds the document for `version` from collected pages
///
/// Duplicate URLs keep the earliest-discovered page. Transient raw HTML is dropped.
///
/// # Arguments
///
/// * `version` - The API version that was crawled
/// * `pages` - Pages in any order
/// * `generated_at` - Timestamp recorded on the document
pub fn assemble(version: &str, pages: Vec<CollectedPage>, generated_at: DateTime<Utc>) -> Document {
    let mut pages = pages;
    pages.sort_by_key(|p| p.discovery_seq);

    let mut seen = HashSet::new();
    pages.retain(|p| seen.insert(p.page.url.clone()));

    // First discovery of every section prefix
    let mut first_seen: HashMap<Vec<String>, u64> = HashMap::new();
    for collected in &pages {
        let path = &collected.page.section_path;
        for depth in 1..=path.len() {
            first_seen
                .entry(path[..depth].to_vec())
                .or_insert(collected.discovery_seq);
        }
    }

    let mut keyed: Vec<(Vec<u64>, Page)> = pages
        .into_iter()
        .map(|collected| {
            let path = &collected.page.section_path;
            let mut key: Vec<u64> = (1..=path.len())
                .map(|depth| first_seen.get(&path[..depth]).copied().unwrap_or(u64::MAX))
                .collect();
            key.push(collected.discovery_seq);

            let mut page = collected.page;
            page.raw_html = None;
            (key, page)
        })
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    Document {
        version: version.to_string(),
        pages: keyed.into_iter().map(|(_, page)| page).collect(),
        generated_at,
    }
}

/// What an outline heading stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineTarget {
    Section,
    /// Index into `Document::pages`
    Page(usize),
}

/// One heading of the narrative rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    /// Markdown heading level (2..=6)
    pub level: usize,
    pub title: String,
    /// Anchor the heading resolves to, unique within the document
    pub anchor: String,
    pub target: OutlineTarget,
}

/// Generates GitHub-style heading anchors, suffixing repeats with `-1`, `-2`, ...
#[derive(Debug, Default)]
pub struct Slugger {
    used: HashMap<String, usize>,
}

impl Slugger {
    /// Returns the anchor for the next heading with this text
    pub fn slug(&mut self, heading: &str) -> String {
        let base: String = heading
            .trim()
            .to_lowercase()
            .chars()
            .filter_map(|c| match c {
                ' ' => Some('-'),
                c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
                _ => None,
            })
            .collect();

        let mut slug = base.clone();
        while self.used.contains_key(&slug) {
            let count = self.used.entry(base.clone()).or_insert(0);
            *count += 1;
            let suffix = *count;
            slug = format!("{}-{}", base, suffix);
        }
        self.used.insert(slug.clone(), 0);
        slug
    }
}

/// Headings of the narrative rendering in document order
///
/// `reserved` are headings rendered before the outline (document title, TOC
/// heading) so their anchors are accounted for.
pub fn outline(document: &Document, reserved: &[&str]) -> Vec<OutlineEntry> {
    let mut slugger = Slugger::default();
    for heading in reserved {
        slugger.slug(heading);
    }

    let mut entries = Vec::new();
    let mut open: Vec<String> = Vec::new();

    for (index, page) in document.pages.iter().enumerate() {
        let path = &page.section_path;
        let shared = open
            .iter()
            .zip(path.iter())
            .take_while(|(a, b)| a == b)
            .count();
        open.truncate(shared);

        for section in &path[shared..] {
            open.push(section.clone());
            entries.push(OutlineEntry {
                level: (open.len() + 1).min(MAX_HEADING_LEVEL),
                title: section.clone(),
                anchor: slugger.slug(section),
                target: OutlineTarget::Section,
            });
        }

        entries.push(OutlineEntry {
            level: (path.len() + 2).min(MAX_HEADING_LEVEL),
            title: page.title.clone(),
            anchor: slugger.slug(&page.title),
            target: OutlineTarget::Page(index),
        });
    }

    entries
}
