//! Content extraction
//!
//! Turns the rendered HTML of one documentation page into [`Page`]s:
//! 1. The main content region is located with an ordered list of selector strategies
//! 2. The region is flattened into typed blocks (headings, prose, code, tables, ...)
//! 3. A `METHOD /path` line marks the page as an endpoint; pages without one are prose
//! 4. Blocks under "Parameters" headings become parameters, code blocks become
//!    samples keyed by language, response-labelled code becomes response examples,
//!    and the remaining prose becomes the page description in Markdown form
//! 5. A region documenting several endpoints is split into one page per endpoint section
//!
//! Failures are per page: [`ExtractionError`] never aborts a crawl.

mod blocks;
mod endpoint;
mod region;

pub use region::{RegionStrategy, DEFAULT_REGION_SELECTORS};

use crate::model::{Endpoint, LanguageFilter, Page, ParameterLocation, ResponseExample};
use crate::output::Slugger;
use crate::url::route_path;
use blocks::{collapse_whitespace, Block, CodeBlock, Table};
use chrono::Utc;
use endpoint::{MethodLine, PendingParameter};
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::ops::Range;
use thiserror::Error;
use tracing::debug;
use url::Url;

const BREADCRUMB_SELECTOR: &str =
    ".breadcrumb, .breadcrumbs, [aria-label='breadcrumb'], [aria-label='Breadcrumb']";

/// Longest text still treated as a section label rather than prose
const MAX_LABEL_LEN: usize = 60;

/// Category of an extraction failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionErrorKind {
    /// No region selector matched anything with text
    NoContentRegion,
    /// The page looks like an endpoint but its method line cannot be read
    MalformedStructure,
    /// The page yielded neither an endpoint nor any prose
    NoUsableContent,
}

impl ExtractionErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoContentRegion => "no-content-region",
            Self::MalformedStructure => "malformed-structure",
            Self::NoUsableContent => "no-usable-content",
        }
    }
}

impl fmt::Display for ExtractionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page that could not be turned into a [`Page`]
#[derive(Debug, Clone, Error)]
#[error("{kind} extracting {url}: {message}")]
pub struct ExtractionError {
    pub kind: ExtractionErrorKind,
    pub url: String,
    pub message: String,
}

impl ExtractionError {
    pub fn new(
        kind: ExtractionErrorKind,
        url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Pages read from one URL
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// In document order; never empty when returned from [`ContentExtractor::extract`]
    pub pages: Vec<Page>,
    /// Endpoint sections that could not be read while their siblings could
    pub rejected: Vec<ExtractionError>,
}

/// The parsed page every section of it is read from
struct Source<'a> {
    html: &'a str,
    document: &'a Html,
    url: &'a Url,
}

/// Extracts normalized pages from rendered HTML
///
/// Extraction is pure: the same HTML and URL always give the same page
/// (apart from `extracted_at`).
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    strategies: Vec<RegionStrategy>,
    language_filter: LanguageFilter,
}

impl ContentExtractor {
    /// Creates an extractor
    ///
    /// # Arguments
    ///
    /// * `content_selectors` - Region selectors in priority order; empty means the built-in list
    /// * `language_filter` - Code-sample languages to keep
    ///
    /// # Returns
    ///
    /// * `Err(String)` - A selector failed to parse
    pub fn new(content_selectors: &[String], language_filter: LanguageFilter) -> Result<Self, String> {
        Ok(Self {
            strategies: region::strategies_from(content_selectors)?,
            language_filter,
        })
    }

    /// Extracts the pages at `url` from its rendered HTML
    ///
    /// A region documenting one endpoint (or none) gives a single page keyed
    /// by `url`. A region documenting several endpoints is split at their
    /// headings: each section becomes its own page keyed `{url}#{anchor}`,
    /// and text ahead of the first section stays on a page keyed by `url`.
    ///
    /// # Example
    ///
    /// ```
    /// use mambu_docs::crawler::ContentExtractor;
    /// use mambu_docs::model::{HttpMethod, LanguageFilter};
    /// use url::Url;
    ///
    /// let html = r#"<div class="content">
    ///   <h2>Get loan account</h2>
    ///   <p>GET /loans/{loanAccountId}</p>
    ///   <p>Returns a single loan account.</p>
    /// </div>"#;
    /// let url = Url::parse("https://api.mambu.com/#/v2/loans/get").unwrap();
    ///
    /// let extractor = ContentExtractor::new(&[], LanguageFilter::All).unwrap();
    /// let extraction = extractor.extract(html, &url).unwrap();
    ///
    /// assert_eq!(extraction.pages.len(), 1);
    /// let page = &extraction.pages[0];
    /// assert_eq!(page.title, "Get loan account");
    /// let endpoint = page.endpoint.as_ref().unwrap();
    /// assert_eq!(endpoint.http_method, HttpMethod::Get);
    /// assert_eq!(endpoint.path, "/loans/{loanAccountId}");
    /// ```
    pub fn extract(&self, html: &str, url: &Url) -> Result<Extraction, ExtractionError> {
        let document = Html::parse_document(html);

        let (strategy, region) =
            region::locate_region(&document, &self.strategies).ok_or_else(|| {
                ExtractionError::new(
                    ExtractionErrorKind::NoContentRegion,
                    url.as_str(),
                    "no content region selector matched",
                )
            })?;
        debug!("Content region for {} found with '{}'", url, strategy.name());

        let blocks = blocks::classify(region);
        let source = Source {
            html,
            document: &document,
            url,
        };

        let starts = section_starts(&blocks);
        if starts.is_empty() {
            let page = self.extract_section(&source, &blocks, 0..blocks.len(), url.to_string(), true)?;
            return Ok(Extraction {
                pages: vec![page],
                rejected: Vec::new(),
            });
        }
        debug!("{} documents {} sections", url, starts.len());

        let mut ranges = vec![(None, 0..starts[0])];
        for (i, &start) in starts.iter().enumerate() {
            let end = starts.get(i + 1).copied().unwrap_or(blocks.len());
            ranges.push((Some(start), start..end));
        }

        let mut slugger = Slugger::default();
        let mut extraction = Extraction::default();
        for (heading, range) in ranges {
            if range.is_empty() {
                continue;
            }
            let page_url = match heading.and_then(|i| heading_text(&blocks[i])) {
                Some(text) => format!("{}#{}", url, slugger.slug(&endpoint::clean_title(text))),
                None => url.to_string(),
            };

            match self.extract_section(&source, &blocks, range, page_url, false) {
                Ok(page) => extraction.pages.push(page),
                // Group headings with nothing under them only shape section paths
                Err(e) if e.kind == ExtractionErrorKind::NoUsableContent => {
                    debug!("Section {} has no content", e.url)
                }
                Err(e) => extraction.rejected.push(e),
            }
        }

        if extraction.pages.is_empty() {
            return Err(extraction.rejected.into_iter().next().unwrap_or_else(|| {
                ExtractionError::new(
                    ExtractionErrorKind::NoUsableContent,
                    url.as_str(),
                    "no section has an endpoint or prose",
                )
            }));
        }

        // One copy of the source is enough until assembly drops it
        if let Some(first) = extraction.pages.first_mut() {
            first.raw_html = Some(html.to_string());
        }

        Ok(extraction)
    }

    /// Builds one page from `blocks[range]`
    ///
    /// `whole_page` sections may take their section path from a breadcrumb
    /// trail and keep the source HTML; split sections take their path from
    /// the headings above them.
    fn extract_section(
        &self,
        source: &Source<'_>,
        blocks: &[Block],
        range: Range<usize>,
        page_url: String,
        whole_page: bool,
    ) -> Result<Page, ExtractionError> {
        let offset = range.start;
        let section = &blocks[range];

        let method = find_method_line(section);
        if let Some(hit) = &method {
            if !endpoint::braces_balanced(&hit.line.path) {
                return Err(ExtractionError::new(
                    ExtractionErrorKind::MalformedStructure,
                    page_url,
                    format!("unbalanced placeholder in path '{}'", hit.line.path),
                ));
            }
        }

        let title_index = title_heading_index(section, method.as_ref().map(|hit| hit.index));
        let title = title_index
            .and_then(|i| heading_text(&section[i]))
            .map(endpoint::clean_title)
            .filter(|t| !t.is_empty())
            .or_else(|| document_title(source.document))
            .unwrap_or_else(|| endpoint::title_from_route(&route_path(source.url)));

        let ancestors = || heading_ancestors(blocks, title_index.map(|i| i + offset));
        let section_path = if whole_page {
            breadcrumbs(source.document, &title).unwrap_or_else(ancestors)
        } else {
            ancestors()
        };

        let body = self.walk_blocks(section, method.as_ref(), title_index, &title);

        let endpoint = method.map(|hit| {
            let mut endpoint = Endpoint::new(hit.line.method, hit.line.path.clone());
            let mut seen = HashSet::new();
            endpoint.parameters = body
                .parameters
                .into_iter()
                .map(|pending| pending.resolve(&hit.line.path))
                .filter(|param| seen.insert((param.name.clone(), param.location)))
                .collect();
            endpoint.code_samples = body.code_samples;
            endpoint.response_examples = body.response_examples;
            endpoint
        });

        let page = Page {
            url: page_url,
            title,
            section_path,
            raw_html: whole_page.then(|| source.html.to_string()),
            extracted_at: Utc::now(),
            description: body.description.join("\n\n"),
            endpoint,
        };

        if !page.has_usable_content() {
            return Err(ExtractionError::new(
                ExtractionErrorKind::NoUsableContent,
                page.url,
                "page has no endpoint and no prose",
            ));
        }

        Ok(page)
    }

    /// Sorts every block into parameters, samples, responses or description
    fn walk_blocks(
        &self,
        blocks: &[Block],
        method: Option<&MethodHit>,
        title_index: Option<usize>,
        title: &str,
    ) -> PageBody {
        let is_endpoint = method.is_some();
        let mut body = PageBody::default();
        let mut context = Context::default();

        // Blocks between the first heading and the title belong to ancestor sections
        let first_heading = blocks
            .iter()
            .position(|block| matches!(block, Block::Heading { .. }));
        let ancestor_range = match (first_heading, title_index) {
            (Some(first), Some(title)) => first..title,
            _ => 0..0,
        };

        for (index, block) in blocks.iter().enumerate() {
            if Some(index) == title_index || ancestor_range.contains(&index) {
                continue;
            }

            if let Some(hit) = method.filter(|hit| hit.index == index) {
                if hit.consumed {
                    if !hit.line.remainder.is_empty() {
                        body.description.push(hit.line.remainder.clone());
                    }
                    continue;
                }
            }

            match block {
                Block::Heading { text, .. } => {
                    if is_endpoint && is_context_label(text) {
                        context = Context::from_label(text);
                        continue;
                    }
                    context = Context::default();
                    body.description.push(format!("**{}**", text));
                }
                Block::Quote(text) => {
                    if is_endpoint && is_context_label(text) {
                        context = Context::from_label(text);
                        continue;
                    }
                    body.description.push(format!("> {}", text));
                }
                Block::Paragraph(text) => {
                    if text == title {
                        continue;
                    }
                    if is_endpoint && is_context_label(text) {
                        context = Context::from_label(text);
                        continue;
                    }
                    body.description.push(text.clone());
                }
                Block::Code(code) => {
                    if !is_endpoint {
                        body.description.push(fenced(code));
                    } else if context.responses {
                        body.response_examples.push(ResponseExample {
                            status: context.status,
                            payload: code.text.clone(),
                        });
                    } else {
                        self.add_sample(&mut body, code);
                    }
                }
                Block::Table(table) => {
                    if is_endpoint && context.parameters {
                        body.parameters
                            .extend(endpoint::parameters_from_table(table, context.location));
                    } else {
                        body.description.push(markdown_table(table));
                    }
                }
                Block::Definitions(pairs) => {
                    if is_endpoint && context.parameters {
                        body.parameters
                            .extend(endpoint::parameters_from_definitions(pairs, context.location));
                    } else {
                        let lines: Vec<String> = pairs
                            .iter()
                            .map(|(term, def)| format!("**{}**: {}", term, def))
                            .collect();
                        body.description.push(lines.join("\n"));
                    }
                }
                Block::List { ordered, items } => {
                    let lines: Vec<String> = items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| {
                            if *ordered {
                                format!("{}. {}", i + 1, item)
                            } else {
                                format!("- {}", item)
                            }
                        })
                        .collect();
                    body.description.push(lines.join("\n"));
                }
            }
        }

        body
    }

    fn add_sample(&self, body: &mut PageBody, code: &CodeBlock) {
        let language = endpoint::infer_language(code.label.as_deref(), &code.text);
        if !self.language_filter.retains(&language) {
            return;
        }
        body.code_samples
            .entry(language)
            .and_modify(|existing| {
                existing.push_str("\n\n");
                existing.push_str(&code.text);
            })
            .or_insert_with(|| code.text.clone());
    }
}

/// Accumulated content of a page while its blocks are walked
#[derive(Debug, Default)]
struct PageBody {
    description: Vec<String>,
    parameters: Vec<PendingParameter>,
    code_samples: std::collections::BTreeMap<String, String>,
    response_examples: Vec<ResponseExample>,
}

/// What the most recent section label says the following blocks are
#[derive(Debug, Default, Clone, Copy)]
struct Context {
    parameters: bool,
    responses: bool,
    location: Option<ParameterLocation>,
    status: Option<u16>,
}

impl Context {
    fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        let parameters = lower.contains("parameter");
        Self {
            parameters,
            responses: lower.contains("response") && !parameters,
            location: if parameters {
                endpoint::location_from_heading(&lower)
            } else {
                None
            },
            status: endpoint::parse_status(&lower),
        }
    }
}

/// Short labels that introduce parameters, samples or responses
fn is_context_label(text: &str) -> bool {
    if text.chars().count() > MAX_LABEL_LEN {
        return false;
    }
    let lower = text.to_lowercase();
    lower.contains("parameter")
        || lower.contains("response")
        || lower.contains("code sample")
        || lower.contains("example request")
}

/// Where the method line was found
#[derive(Debug, Clone)]
struct MethodHit {
    index: usize,
    line: MethodLine,
    /// True when the block holds nothing but the method line
    consumed: bool,
}

/// Finds the method line: prose first, then one-line code blocks, then HTTP request samples
fn find_method_line(blocks: &[Block]) -> Option<MethodHit> {
    let in_prose = blocks.iter().enumerate().find_map(|(index, block)| match block {
        Block::Paragraph(text) | Block::Heading { text, .. } => {
            endpoint::parse_method_line(text).map(|line| MethodHit {
                index,
                line,
                consumed: true,
            })
        }
        _ => None,
    });
    if in_prose.is_some() {
        return in_prose;
    }

    let single_line_code = blocks.iter().enumerate().find_map(|(index, block)| match block {
        Block::Code(code) if code.text.lines().count() == 1 => {
            endpoint::parse_method_line(&code.text).map(|line| MethodHit {
                index,
                line,
                consumed: true,
            })
        }
        _ => None,
    });
    if single_line_code.is_some() {
        return single_line_code;
    }

    blocks.iter().enumerate().find_map(|(index, block)| match block {
        Block::Code(code)
            if endpoint::infer_language(code.label.as_deref(), &code.text) == "http" =>
        {
            let first = code.text.lines().next()?;
            endpoint::parse_method_line(first).map(|mut line| {
                // "HTTP/1.1" is part of the request line, not the path
                line.remainder.clear();
                MethodHit {
                    index,
                    line,
                    consumed: false,
                }
            })
        }
        _ => None,
    })
}

/// Every method line in prose or code, whatever its priority
fn method_line_indices(blocks: &[Block]) -> Vec<usize> {
    let prose: Vec<usize> = blocks
        .iter()
        .enumerate()
        .filter(|(_, block)| match block {
            Block::Paragraph(text) | Block::Heading { text, .. } => {
                endpoint::parse_method_line(text).is_some()
            }
            _ => false,
        })
        .map(|(index, _)| index)
        .collect();
    if !prose.is_empty() {
        return prose;
    }

    blocks
        .iter()
        .enumerate()
        .filter(|(_, block)| match block {
            Block::Code(code) => code
                .text
                .lines()
                .next()
                .is_some_and(|first| endpoint::parse_method_line(first).is_some()),
            _ => false,
        })
        .map(|(index, _)| index)
        .collect()
}

/// Headings where a new page starts when the region documents several endpoints
///
/// An endpoint is owned by the nearest heading above its method line that is
/// not a label such as "Parameters". With fewer than two owners the region is
/// one page and the result is empty. Otherwise every heading at or above the
/// deepest owner's level starts a section.
fn section_starts(blocks: &[Block]) -> Vec<usize> {
    let owners: BTreeSet<usize> = method_line_indices(blocks)
        .into_iter()
        .filter_map(|hit| {
            blocks[..hit].iter().rposition(|block| {
                heading_text(block).is_some_and(|text| !is_context_label(text))
            })
        })
        .collect();
    if owners.len() < 2 {
        return Vec::new();
    }

    let Some(split_level) = owners.iter().filter_map(|&i| heading_level(&blocks[i])).max() else {
        return Vec::new();
    };
    blocks
        .iter()
        .enumerate()
        .filter(|(_, block)| heading_level(block).is_some_and(|level| level <= split_level))
        .map(|(index, _)| index)
        .collect()
}

fn heading_text(block: &Block) -> Option<&str> {
    match block {
        Block::Heading { text, .. } => Some(text.as_str()),
        _ => None,
    }
}

fn heading_level(block: &Block) -> Option<u8> {
    match block {
        Block::Heading { level, .. } => Some(*level),
        _ => None,
    }
}

/// The heading that titles the page
///
/// For endpoints this is the last heading before the method line; otherwise the first heading.
fn title_heading_index(blocks: &[Block], method_index: Option<usize>) -> Option<usize> {
    let is_heading = |block: &Block| matches!(block, Block::Heading { .. });
    if let Some(method_index) = method_index {
        if let Some(index) = blocks[..method_index].iter().rposition(is_heading) {
            return Some(index);
        }
    }
    blocks
        .iter()
        .enumerate()
        .position(|(index, block)| is_heading(block) && Some(index) != method_index)
}

/// Headings enclosing the title heading, outermost first
fn heading_ancestors(blocks: &[Block], title_index: Option<usize>) -> Vec<String> {
    let Some(title_index) = title_index else {
        return Vec::new();
    };
    let title_level = match &blocks[title_index] {
        Block::Heading { level, .. } => *level,
        _ => return Vec::new(),
    };

    let mut stack: Vec<(u8, String)> = Vec::new();
    for block in &blocks[..title_index] {
        if let Block::Heading { level, text } = block {
            while stack.last().is_some_and(|(top, _)| *top >= *level) {
                stack.pop();
            }
            stack.push((*level, endpoint::clean_title(text)));
        }
    }
    while stack.last().is_some_and(|(top, _)| *top >= title_level) {
        stack.pop();
    }

    stack.into_iter().map(|(_, text)| text).collect()
}

/// Section path from a breadcrumb trail, when the page has one
fn breadcrumbs(document: &Html, title: &str) -> Option<Vec<String>> {
    let selector = Selector::parse(BREADCRUMB_SELECTOR).ok()?;
    let trail = document.select(&selector).next()?;

    let mut items = crumb_texts(trail, "li");
    if items.is_empty() {
        items = crumb_texts(trail, "a");
    }
    if items.last().is_some_and(|last| last == title) {
        items.pop();
    }

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn crumb_texts(trail: ElementRef<'_>, tag: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(tag) else {
        return Vec::new();
    };
    trail
        .select(&selector)
        .map(|item| {
            let text = collapse_whitespace(&item.text().collect::<String>());
            text.trim_matches(|c: char| matches!(c, '>' | '/' | '»' | '›') || c.is_whitespace())
                .to_string()
        })
        .filter(|text| !text.is_empty())
        .collect()
}

fn document_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    let element = document.select(&selector).next()?;
    let title = endpoint::clean_title(&element.text().collect::<String>());
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

fn fenced(code: &CodeBlock) -> String {
    let language = match code.label.as_deref() {
        Some(label) => crate::model::canonical_language(label),
        None => String::new(),
    };
    format!("```{}\n{}\n```", language, code.text)
}

fn markdown_table(table: &Table) -> String {
    let width = table
        .rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(table.headers.len()))
        .max()
        .unwrap_or(0);
    let row_line = |cells: &[String]| {
        let padded: Vec<String> = (0..width)
            .map(|i| cells.get(i).map(|c| c.replace('|', "\\|")).unwrap_or_default())
            .collect();
        format!("| {} |", padded.join(" | "))
    };

    let mut lines = Vec::new();
    let headers = if table.headers.is_empty() {
        vec![String::new(); width]
    } else {
        table.headers.clone()
    };
    lines.push(row_line(&headers));
    lines.push(format!("|{}", " --- |".repeat(width)));
    for row in &table.rows {
        lines.push(row_line(row));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HttpMethod;

    fn url(route: &str) -> Url {
        Url::parse(&format!("https://api.mambu.com/#{}", route)).unwrap()
    }

    fn extract_all(html: &str) -> Result<Extraction, ExtractionError> {
        ContentExtractor::new(&[], LanguageFilter::All)
            .unwrap()
            .extract(html, &url("/v2/loans"))
    }

    fn extract(html: &str) -> Result<Page, ExtractionError> {
        ContentExtractor::new(&[], LanguageFilter::All)
            .unwrap()
            .extract(html, &url("/v2/loans/create"))
            .map(|mut extraction| {
                assert_eq!(extraction.pages.len(), 1);
                extraction.pages.remove(0)
            })
    }

    const ENDPOINT_PAGE: &str = r#"
<html><head><title>Mambu API v2</title></head><body>
<div class="page-wrapper"><div class="content">
  <h1>Loan Accounts</h1>
  <p>Loan accounts hold the balances of a loan.</p>
  <h2>Create loan account (1)</h2>
  <p>POST /loans</p>
  <p>Creates a new loan account.</p>
  <blockquote><p>Code samples</p></blockquote>
  <pre class="highlight tab-shell"><code>curl -X POST https://example.mambu.com/api/loans</code></pre>
  <pre class="highlight tab-python"><code>import requests
r = requests.post('https://example.mambu.com/api/loans')</code></pre>
  <blockquote><p>Body parameter</p></blockquote>
  <pre class="highlight json"><code>{"loanAmount": 1000}</code></pre>
  <h3>Parameters</h3>
  <table>
    <thead><tr><th>Name</th><th>In</th><th>Type</th><th>Required</th><th>Description</th></tr></thead>
    <tbody>
      <tr><td>Idempotency-Key</td><td>header</td><td>string</td><td>false</td><td>Key for retries</td></tr>
      <tr><td>body</td><td>body</td><td>LoanAccount</td><td>true</td><td>Loan account to create</td></tr>
    </tbody>
  </table>
  <blockquote><p>Example responses</p></blockquote>
  <blockquote><p>201 Response</p></blockquote>
  <pre class="highlight json"><code>{"id": "ABC123"}</code></pre>
  <h3>Responses</h3>
  <table>
    <thead><tr><th>Status</th><th>Meaning</th></tr></thead>
    <tbody><tr><td>201</td><td>Created</td></tr></tbody>
  </table>
</div></div></body></html>"#;

    #[test]
    fn test_endpoint_page() {
        let page = extract(ENDPOINT_PAGE).unwrap();
        assert_eq!(page.title, "Create loan account");
        assert_eq!(page.section_path, vec!["Loan Accounts".to_string()]);
        assert_eq!(page.url, "https://api.mambu.com/#/v2/loans/create");
        assert!(page.raw_html.is_some());

        let endpoint = page.endpoint.unwrap();
        assert_eq!(endpoint.http_method, HttpMethod::Post);
        assert_eq!(endpoint.path, "/loans");

        assert_eq!(endpoint.parameters.len(), 2);
        assert_eq!(endpoint.parameters[0].name, "Idempotency-Key");
        assert_eq!(endpoint.parameters[0].location, ParameterLocation::Header);
        assert!(endpoint.parameters[1].required);

        let languages: Vec<&str> = endpoint.code_samples.keys().map(String::as_str).collect();
        assert_eq!(languages, vec!["curl", "json", "python"]);

        assert_eq!(endpoint.response_examples.len(), 1);
        assert_eq!(endpoint.response_examples[0].status, Some(201));
        assert_eq!(endpoint.response_examples[0].payload, r#"{"id": "ABC123"}"#);

        assert!(page.description.contains("Creates a new loan account."));
        assert!(page.description.contains("| Status | Meaning |"));
        assert!(!page.description.contains("Loan accounts hold"));
        assert!(!page.description.contains("POST /loans"));
        assert!(!page.description.contains("Code samples"));
    }

    #[test]
    fn test_language_filter_applies_to_samples() {
        let filter = LanguageFilter::parse("curl");
        let extraction = ContentExtractor::new(&[], filter)
            .unwrap()
            .extract(ENDPOINT_PAGE, &url("/v2/loans/create"))
            .unwrap();
        let endpoint = extraction.pages[0].endpoint.clone().unwrap();
        assert_eq!(endpoint.code_samples.len(), 1);
        assert!(endpoint.code_samples.contains_key("curl"));
    }

    #[test]
    fn test_same_language_samples_are_joined() {
        let html = r#"<main><h2>List loans</h2><p>GET /loans</p>
            <pre class="language-shell">curl one</pre>
            <pre class="language-shell">curl two</pre></main>"#;
        let endpoint = extract(html).unwrap().endpoint.unwrap();
        assert_eq!(endpoint.code_samples["curl"], "curl one\n\ncurl two");
    }

    #[test]
    fn test_prose_page_keeps_code_inline() {
        let html = r#"<main>
            <h1>Authentication</h1>
            <p>Use basic authentication or API keys.</p>
            <pre class="language-shell">curl -u user:pass https://x</pre>
            <ul><li>Basic</li><li>API key</li></ul>
        </main>"#;
        let page = extract(html).unwrap();
        assert!(page.endpoint.is_none());
        assert_eq!(page.title, "Authentication");
        assert!(page.section_path.is_empty());
        assert_eq!(
            page.description,
            "Use basic authentication or API keys.\n\n```curl\ncurl -u user:pass https://x\n```\n\n- Basic\n- API key"
        );
    }

    #[test]
    fn test_endpoint_without_parameters() {
        let html = r#"<main><h2>Get health</h2><pre>GET /health</pre><p>Liveness check.</p></main>"#;
        let page = extract(html).unwrap();
        let endpoint = page.endpoint.unwrap();
        assert_eq!(endpoint.path, "/health");
        assert!(endpoint.parameters.is_empty());
        assert_eq!(page.description, "Liveness check.");
    }

    #[test]
    fn test_method_line_in_http_sample() {
        let html = r#"<main><h2>Delete client</h2>
            <pre class="language-http">DELETE /clients/{clientId} HTTP/1.1
Host: example.mambu.com</pre></main>"#;
        let endpoint = extract(html).unwrap().endpoint.unwrap();
        assert_eq!(endpoint.http_method, HttpMethod::Delete);
        assert_eq!(endpoint.path, "/clients/{clientId}");
        assert!(endpoint.code_samples.contains_key("http"));
    }

    #[test]
    fn test_parameter_location_defaults() {
        let html = r#"<main><h2>Get client</h2><p>GET /clients/{clientId}</p>
            <h3>Query Parameters</h3>
            <dl><dt>detailsLevel (string)</dt><dd>BASIC or FULL</dd></dl>
            <h3>Parameters</h3>
            <table><tr><th>Name</th><th>Type</th></tr><tr><td>clientId</td><td>string</td></tr>
            <tr><td>offset</td><td>integer</td></tr></table></main>"#;
        let params = extract(html).unwrap().endpoint.unwrap().parameters;
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].location, ParameterLocation::Query);
        assert_eq!(params[1].name, "clientId");
        assert_eq!(params[1].location, ParameterLocation::Path);
        assert_eq!(params[2].location, ParameterLocation::Query);
    }

    #[test]
    fn test_breadcrumbs_win_over_headings() {
        let html = r#"<body>
            <ol class="breadcrumb"><li>API</li><li>Loans</li><li>Get loan</li></ol>
            <main><h1>Everything</h1><h2>Get loan</h2><p>GET /loans/{id}</p></main></body>"#;
        let page = extract(html).unwrap();
        assert_eq!(page.section_path, vec!["API".to_string(), "Loans".to_string()]);
    }

    #[test]
    fn test_title_fallbacks() {
        let with_title = extract("<html><head><title>Overview</title></head><body><p>Some text</p></body></html>")
            .unwrap();
        assert_eq!(with_title.title, "Overview");

        let from_route = extract("<body><p>Some text</p></body>").unwrap();
        assert_eq!(from_route.title, "Create");
    }

    #[test]
    fn test_no_content_region() {
        let err = extract("<html><body>   </body></html>").unwrap_err();
        assert_eq!(err.kind, ExtractionErrorKind::NoContentRegion);
    }

    #[test]
    fn test_malformed_path() {
        let err = extract("<main><h2>Broken</h2><p>GET /loans/{id</p></main>").unwrap_err();
        assert_eq!(err.kind, ExtractionErrorKind::MalformedStructure);
    }

    #[test]
    fn test_no_usable_content() {
        let err = extract("<main><h1>Only a title</h1></main>").unwrap_err();
        assert_eq!(err.kind, ExtractionErrorKind::NoUsableContent);
    }

    const LOANS_PAGE: &str = r#"
<html><body><div class="content">
  <h1>Loan Accounts</h1>
  <p>Loan accounts hold the balances of a loan.</p>
  <h2>Create loan account</h2>
  <p>POST /loans</p>
  <p>Creates a new loan account.</p>
  <h3>Parameters</h3>
  <table>
    <tr><th>Name</th><th>In</th><th>Type</th></tr>
    <tr><td>body</td><td>body</td><td>LoanAccount</td></tr>
  </table>
  <h2>Get loan account</h2>
  <p>GET /loans/{loanId}</p>
  <p>Returns one loan account.</p>
  <h3>Parameters</h3>
  <table>
    <tr><th>Name</th><th>Type</th></tr>
    <tr><td>loanId</td><td>string</td></tr>
  </table>
  <pre class="language-http">GET /loans/{loanId} HTTP/1.1</pre>
</div></body></html>"#;

    #[test]
    fn test_each_endpoint_gets_its_own_page() {
        let extraction = extract_all(LOANS_PAGE).unwrap();
        assert!(extraction.rejected.is_empty());

        let urls: Vec<&str> = extraction.pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://api.mambu.com/#/v2/loans#loan-accounts",
                "https://api.mambu.com/#/v2/loans#create-loan-account",
                "https://api.mambu.com/#/v2/loans#get-loan-account",
            ]
        );

        let intro = &extraction.pages[0];
        assert!(intro.endpoint.is_none());
        assert_eq!(intro.description, "Loan accounts hold the balances of a loan.");

        let create = &extraction.pages[1];
        assert_eq!(create.title, "Create loan account");
        assert_eq!(create.section_path, vec!["Loan Accounts".to_string()]);
        assert_eq!(create.description, "Creates a new loan account.");
        let create_endpoint = create.endpoint.as_ref().unwrap();
        assert_eq!(create_endpoint.http_method, HttpMethod::Post);
        assert_eq!(create_endpoint.path, "/loans");
        let names: Vec<&str> = create_endpoint.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["body"]);
        assert!(create_endpoint.code_samples.is_empty());

        let get = &extraction.pages[2];
        assert_eq!(get.title, "Get loan account");
        let get_endpoint = get.endpoint.as_ref().unwrap();
        assert_eq!(get_endpoint.http_method, HttpMethod::Get);
        assert_eq!(get_endpoint.path, "/loans/{loanId}");
        assert_eq!(get_endpoint.parameters.len(), 1);
        assert_eq!(get_endpoint.parameters[0].name, "loanId");
        assert_eq!(get_endpoint.parameters[0].location, ParameterLocation::Path);
        assert!(get_endpoint.code_samples.contains_key("http"));
        assert!(!get.description.contains("Creates"));

        assert!(intro.raw_html.is_some());
        assert!(get.raw_html.is_none());
    }

    #[test]
    fn test_unreadable_section_does_not_drop_siblings() {
        let html = r#"<main>
            <h2>List clients</h2><p>GET /clients</p>
            <h2>Broken</h2><p>GET /clients/{id</p>
        </main>"#;
        let extraction = extract_all(html).unwrap();
        assert_eq!(extraction.pages.len(), 1);
        assert_eq!(extraction.pages[0].title, "List clients");
        assert_eq!(extraction.rejected.len(), 1);
        assert_eq!(extraction.rejected[0].kind, ExtractionErrorKind::MalformedStructure);
        assert_eq!(extraction.rejected[0].url, "https://api.mambu.com/#/v2/loans#broken");
    }

    #[test]
    fn test_labels_do_not_split_an_endpoint() {
        let html = r#"<main><h2>Delete client</h2><p>DELETE /clients/{clientId}</p>
            <h3>Code samples</h3>
            <pre class="language-http">DELETE /clients/{clientId} HTTP/1.1</pre></main>"#;
        let extraction = extract_all(html).unwrap();
        assert_eq!(extraction.pages.len(), 1);
        assert_eq!(extraction.pages[0].url, "https://api.mambu.com/#/v2/loans");
    }

    #[test]
    fn test_configured_selector_is_used() {
        let extractor = ContentExtractor::new(&["div.docs".to_string()], LanguageFilter::All).unwrap();
        let html = r#"<body><main><p>Chrome</p></main><div class="docs"><h1>Real</h1><p>Body</p></div></body>"#;
        let extraction = extractor.extract(html, &url("/v2/real")).unwrap();
        let page = &extraction.pages[0];
        assert_eq!(page.title, "Real");
        assert_eq!(page.description, "Body");
    }
}
