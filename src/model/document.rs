use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// HTTP methods recognized on an endpoint's method+path line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(format!("unsupported HTTP method: {}", other)),
        }
    }
}

/// Where a parameter is carried in the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Body,
}

impl ParameterLocation {
    /// Parses the "In" column of a parameter table
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        if label.contains("path") {
            Some(Self::Path)
        } else if label.contains("query") {
            Some(Self::Query)
        } else if label.contains("header") {
            Some(Self::Header)
        } else if label.contains("body") || label.contains("form") {
            Some(Self::Body)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single documented request parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    #[serde(rename = "type")]
    pub param_type: String,
    pub required: bool,
    pub description: String,
}

/// An example response payload with its status code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseExample {
    /// HTTP status code, when the page labels one
    pub status: Option<u16>,
    pub payload: String,
}

/// Endpoint-specific content of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub http_method: HttpMethod,

    /// Templated path with `{param}` placeholders
    pub path: String,

    pub parameters: Vec<Parameter>,

    /// Language name -> sample text, restricted to the configured languages
    pub code_samples: BTreeMap<String, String>,

    pub response_examples: Vec<ResponseExample>,
}

impl Endpoint {
    pub fn new(http_method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            http_method,
            path: path.into(),
            parameters: Vec::new(),
            code_samples: BTreeMap::new(),
            response_examples: Vec::new(),
        }
    }

    /// The `METHOD /path` line as it appears in the documentation
    pub fn method_line(&self) -> String {
        format!("{} {}", self.http_method, self.path)
    }

    /// Names of the `{placeholders}` in the templated path
    pub fn path_placeholders(&self) -> Vec<&str> {
        self.path
            .split('{')
            .skip(1)
            .filter_map(|rest| rest.split('}').next())
            .filter(|name| !name.is_empty())
            .collect()
    }
}

/// One extracted documentation page
///
/// Prose-only pages have no [`Endpoint`]; they still appear in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Canonical URL, unique within a document
    pub url: String,

    pub title: String,

    /// Ancestor section titles, outermost first
    pub section_path: Vec<String>,

    /// Rendered HTML the page was extracted from; dropped before assembly
    #[serde(skip)]
    pub raw_html: Option<String>,

    pub extracted_at: DateTime<Utc>,

    /// Prose of the page in Markdown form
    pub description: String,

    pub endpoint: Option<Endpoint>,
}

impl Page {
    /// Returns true if the page carries anything worth publishing
    pub fn has_usable_content(&self) -> bool {
        if self.title.trim().is_empty() {
            return false;
        }
        self.endpoint.is_some() || !self.description.trim().is_empty()
    }

    pub fn is_endpoint(&self) -> bool {
        self.endpoint.is_some()
    }
}

/// The assembled documentation for one API version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// API version that was crawled (e.g. "v2")
    pub version: String,

    /// Pages in table-of-contents order
    pub pages: Vec<Page>,

    pub generated_at: DateTime<Utc>,
}

impl Document {
    pub fn endpoint_count(&self) -> usize {
        self.pages.iter().filter(|p| p.is_endpoint()).count()
    }
}
