use super::blocks::Table;
use crate::model::{canonical_language, HttpMethod, Parameter, ParameterLocation};
use regex::Regex;
use std::sync::OnceLock;

/// A `METHOD /path` line found in the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodLine {
    pub method: HttpMethod,
    pub path: String,
    /// Whatever followed the path on the same line
    pub remainder: String,
}

fn method_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(GET|POST|PUT|PATCH|DELETE)\s+(/\S+)(.*)$").expect("valid method regex")
    })
}

fn status_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b([1-5]\d\d)\b").expect("valid status regex"))
}

fn trailing_counter_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\(\d+\)$").expect("valid counter regex"))
}

/// Matches a single line against the method+path pattern
pub fn parse_method_line(line: &str) -> Option<MethodLine> {
    let captures = method_line_regex().captures(line.trim())?;
    let method = captures.get(1)?.as_str().parse().ok()?;
    let path = captures.get(2)?.as_str().trim_end_matches(['.', ',', ';']).to_string();
    if path == "/" {
        return None;
    }
    let remainder = captures
        .get(3)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    Some(MethodLine {
        method,
        path,
        remainder,
    })
}

/// Returns true if every `{` in the path is closed before the next opens
pub fn braces_balanced(path: &str) -> bool {
    let mut open = false;
    for c in path.chars() {
        match c {
            '{' if open => return false,
            '{' => open = true,
            '}' if !open => return false,
            '}' => open = false,
            _ => {}
        }
    }
    !open
}

/// Extracts an HTTP status code from a label such as "200 Response"
pub fn parse_status(label: &str) -> Option<u16> {
    status_regex()
        .captures(label)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Cleans a title: collapses whitespace, drops anchor glyphs and trailing `(n)` counters
pub fn clean_title(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_end_matches(['¶', '#']).trim();
    trailing_counter_regex().replace(trimmed, "").trim().to_string()
}

/// Builds a title from the last route segment, e.g. `loan-accounts` -> `Loan Accounts`
pub fn title_from_route(route: &str) -> String {
    let segment = route
        .trim_end_matches('/')
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or_default();
    segment
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves the language of a code block
///
/// An explicit label wins; otherwise the first line of the sample is inspected.
/// Samples nothing can be said about are keyed as `text`.
pub fn infer_language(label: Option<&str>, code: &str) -> String {
    if let Some(label) = label {
        return canonical_language(label);
    }

    let first = code.lines().find(|l| !l.trim().is_empty()).unwrap_or_default().trim();
    let language = if first.starts_with("curl ") || first == "curl" {
        "curl"
    } else if first.starts_with('{') || first.starts_with('[') {
        "json"
    } else if first.starts_with("<?php") {
        "php"
    } else if first.starts_with("package main") {
        "go"
    } else if first.starts_with("import requests") || first.starts_with("from ") {
        "python"
    } else if first.starts_with("require '") || first.starts_with("require \"") {
        "ruby"
    } else if first.starts_with("import java") || first.starts_with("public class") {
        "java"
    } else if first.starts_with("const ") || first.starts_with("fetch(") || first.starts_with("var ") {
        "javascript"
    } else if first.starts_with("HTTP/") || parse_method_line(first).is_some() {
        "http"
    } else {
        "text"
    };
    language.to_string()
}

/// Infers a parameter location from a section heading such as "Query Parameters"
pub fn location_from_heading(heading: &str) -> Option<ParameterLocation> {
    let lower = heading.to_lowercase();
    if lower.contains("path") {
        Some(ParameterLocation::Path)
    } else if lower.contains("query") {
        Some(ParameterLocation::Query)
    } else if lower.contains("header") {
        Some(ParameterLocation::Header)
    } else if lower.contains("body") || lower.contains("request") {
        Some(ParameterLocation::Body)
    } else {
        None
    }
}

/// A parameter row whose location may still depend on the endpoint path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingParameter {
    pub name: String,
    pub location: Option<ParameterLocation>,
    pub param_type: String,
    pub required: bool,
    pub description: String,
}

impl PendingParameter {
    /// Fixes the location: explicit, else a `{name}` placeholder in the path, else query
    pub fn resolve(self, path: &str) -> Parameter {
        let location = self.location.unwrap_or_else(|| {
            if path.contains(&format!("{{{}}}", self.name)) {
                ParameterLocation::Path
            } else {
                ParameterLocation::Query
            }
        });
        Parameter {
            name: self.name,
            location,
            param_type: self.param_type,
            required: self.required,
            description: self.description,
        }
    }
}

#[derive(Debug, Default)]
struct Columns {
    name: Option<usize>,
    location: Option<usize>,
    param_type: Option<usize>,
    required: Option<usize>,
    description: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &[String]) -> Self {
        let mut columns = Columns::default();
        for (index, header) in headers.iter().enumerate() {
            let header = header.trim().to_lowercase();
            let slot = match header.as_str() {
                "name" | "parameter" | "param" | "field" | "property" => &mut columns.name,
                "in" | "location" | "parameter type" => &mut columns.location,
                "type" | "data type" | "schema" | "format" => &mut columns.param_type,
                "required" | "mandatory" => &mut columns.required,
                "description" | "details" | "notes" => &mut columns.description,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(index);
            }
        }
        columns
    }

    /// Positional layout used when a table has no header row
    fn positional(width: usize) -> Self {
        match width {
            0 | 1 => Columns {
                name: Some(0),
                ..Default::default()
            },
            2 => Columns {
                name: Some(0),
                description: Some(1),
                ..Default::default()
            },
            3 => Columns {
                name: Some(0),
                param_type: Some(1),
                description: Some(2),
                ..Default::default()
            },
            _ => Columns {
                name: Some(0),
                location: Some(1),
                param_type: Some(2),
                required: Some(3),
                description: Some(4),
            },
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "yes" | "y" | "required" | "mandatory" | "✓" | "x"
    )
}

fn cell(row: &[String], index: Option<usize>) -> String {
    index
        .and_then(|i| row.get(i))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Cleans a parameter name cell: nested-field markers and backticks go
fn clean_param_name(raw: &str) -> String {
    raw.trim()
        .trim_start_matches(['»', '›', '-', '*'])
        .trim()
        .trim_matches('`')
        .to_string()
}

/// Turns a parameter table into parameters
///
/// Columns are matched by header text; tables without a header row are read
/// positionally. `heading_location` applies when the table has no "In" column.
pub fn parameters_from_table(
    table: &Table,
    heading_location: Option<ParameterLocation>,
) -> Vec<PendingParameter> {
    let columns = if table.headers.is_empty() {
        Columns::positional(table.rows.first().map_or(0, Vec::len))
    } else {
        let mut columns = Columns::from_headers(&table.headers);
        if columns.name.is_none() {
            columns.name = Some(0);
        }
        columns
    };

    table
        .rows
        .iter()
        .filter_map(|row| {
            let name = clean_param_name(&cell(row, columns.name));
            if name.is_empty() {
                return None;
            }
            let location = ParameterLocation::from_label(&cell(row, columns.location))
                .or(heading_location);
            Some(PendingParameter {
                name,
                location,
                param_type: cell(row, columns.param_type),
                required: is_truthy(&cell(row, columns.required)),
                description: cell(row, columns.description),
            })
        })
        .collect()
}

/// Turns `term: definition` pairs into parameters
///
/// A term may carry details in parentheses, e.g. `limit (integer, required)`.
pub fn parameters_from_definitions(
    pairs: &[(String, String)],
    heading_location: Option<ParameterLocation>,
) -> Vec<PendingParameter> {
    pairs
        .iter()
        .filter_map(|(term, definition)| {
            let (raw_name, details) = match term.split_once('(') {
                Some((name, rest)) => (name, rest.trim_end_matches(')')),
                None => (term.as_str(), ""),
            };
            let name = clean_param_name(raw_name);
            if name.is_empty() {
                return None;
            }

            let mut param_type = String::new();
            let mut required = false;
            let mut location = heading_location;
            for detail in details.split(',').map(str::trim).filter(|d| !d.is_empty()) {
                if is_truthy(detail) {
                    required = true;
                } else if detail.eq_ignore_ascii_case("optional") {
                    continue;
                } else if let Some(loc) = ParameterLocation::from_label(detail) {
                    location = Some(loc);
                } else if param_type.is_empty() {
                    param_type = detail.to_string();
                }
            }

            Some(PendingParameter {
                name,
                location,
                param_type,
                required,
                description: definition.trim().to_string(),
            })
        })
        .collect()
}
