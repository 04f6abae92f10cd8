use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Code-sample languages the documentation site offers, in canonical form
pub const KNOWN_LANGUAGES: &[&str] = &[
    "curl",
    "http",
    "javascript",
    "ruby",
    "python",
    "java",
    "go",
    "php",
    "shell",
    "json",
];

/// Maps a language label or highlight class to its canonical name
///
/// Labels come from tab captions ("cURL", "Node.js"), highlighter classes
/// (`language-py`, `tab-shell`) or `data-lang` attributes. Unknown labels are
/// lowercased and returned as-is so they can still key a sample.
///
/// # Examples
///
/// ```
/// use mambu_docs::model::canonical_language;
///
/// assert_eq!(canonical_language("cURL"), "curl");
/// assert_eq!(canonical_language("py"), "python");
/// assert_eq!(canonical_language("Node.js"), "javascript");
/// ```
pub fn canonical_language(label: &str) -> String {
    let lower = label.trim().to_lowercase();
    match lower.as_str() {
        "curl" | "shell" | "sh" | "bash" | "zsh" | "console" => "curl".to_string(),
        "js" | "javascript" | "node" | "nodejs" | "node.js" | "jquery" => "javascript".to_string(),
        "py" | "python" | "python3" => "python".to_string(),
        "rb" | "ruby" => "ruby".to_string(),
        "golang" | "go" => "go".to_string(),
        "http" | "http1" | "raw" => "http".to_string(),
        _ => lower,
    }
}

/// Which code-sample languages are retained during extraction
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "LanguageFilterRepr", into = "LanguageFilterRepr")]
pub enum LanguageFilter {
    /// Keep every discovered language
    #[default]
    All,
    /// Keep only these canonical language names
    Only(BTreeSet<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum LanguageFilterRepr {
    Keyword(String),
    List(Vec<String>),
}

impl TryFrom<LanguageFilterRepr> for LanguageFilter {
    type Error = String;

    fn try_from(repr: LanguageFilterRepr) -> Result<Self, Self::Error> {
        let labels = match repr {
            LanguageFilterRepr::Keyword(keyword) => vec![keyword],
            LanguageFilterRepr::List(list) => list,
        };
        if labels.is_empty() {
            return Err("language filter list cannot be empty".to_string());
        }
        Ok(Self::from_labels(labels.iter().map(String::as_str)))
    }
}

impl From<LanguageFilter> for LanguageFilterRepr {
    fn from(filter: LanguageFilter) -> Self {
        match filter {
            LanguageFilter::All => LanguageFilterRepr::Keyword("all".to_string()),
            LanguageFilter::Only(set) => LanguageFilterRepr::List(set.into_iter().collect()),
        }
    }
}

impl LanguageFilter {
    /// Builds a filter from labels; any "all" label makes the filter unrestricted
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut set = BTreeSet::new();
        for label in labels {
            let label = label.trim();
            if label.is_empty() {
                continue;
            }
            if label.eq_ignore_ascii_case("all") {
                return Self::All;
            }
            set.insert(canonical_language(label));
        }
        if set.is_empty() {
            Self::All
        } else {
            Self::Only(set)
        }
    }

    /// Parses a CLI value: `all` or a comma-separated list
    pub fn parse(value: &str) -> Self {
        Self::from_labels(value.split(','))
    }

    /// Returns true if samples in `language` (canonical) should be kept
    pub fn retains(&self, language: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(set) => set.contains(language),
        }
    }

    /// Languages named by an explicit filter that are not in [`KNOWN_LANGUAGES`]
    pub fn unknown_languages(&self) -> Vec<String> {
        match self {
            Self::All => Vec::new(),
            Self::Only(set) => set
                .iter()
                .filter(|lang| !KNOWN_LANGUAGES.contains(&lang.as_str()))
                .cloned()
                .collect(),
        }
    }
}

impl fmt::Display for LanguageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Only(set) => {
                let names: Vec<&str> = set.iter().map(String::as_str).collect();
                write!(f, "{}", names.join(","))
            }
        }
    }
}
