use scraper::{ElementRef, Html, Selector};

/// Region selectors tried in order when none are configured
pub const DEFAULT_REGION_SELECTORS: &[&str] = &[
    ".page-wrapper .content",
    "div.content",
    "article.article-content",
    "div.article-body",
    "main",
    "article",
    "[role='main']",
    "body",
];

/// One way of locating the main content region
///
/// A strategy matches the first element its selector finds that has
/// visible text; an empty shell does not count as a match.
#[derive(Debug, Clone)]
pub struct RegionStrategy {
    name: String,
    selector: Selector,
}

impl RegionStrategy {
    pub fn parse(css: &str) -> Result<Self, String> {
        let selector =
            Selector::parse(css).map_err(|e| format!("invalid selector '{}': {:?}", css, e))?;
        Ok(Self {
            name: css.to_string(),
            selector,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the region this strategy finds in `document`, if any
    pub fn locate<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        document
            .select(&self.selector)
            .find(|element| element.text().any(|t| !t.trim().is_empty()))
    }
}

/// Builds strategies from configured selectors, falling back to the defaults
pub fn strategies_from(selectors: &[String]) -> Result<Vec<RegionStrategy>, String> {
    if selectors.is_empty() {
        return DEFAULT_REGION_SELECTORS
            .iter()
            .map(|css| RegionStrategy::parse(css))
            .collect();
    }
    selectors.iter().map(|css| RegionStrategy::parse(css)).collect()
}

/// Tries each strategy in order; the first match wins
pub fn locate_region<'s, 'a>(
    document: &'a Html,
    strategies: &'s [RegionStrategy],
) -> Option<(&'s RegionStrategy, ElementRef<'a>)> {
    strategies
        .iter()
        .find_map(|strategy| strategy.locate(document).map(|el| (strategy, el)))
}
