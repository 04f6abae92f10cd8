//! Narrative artifact generation
//!
//! Renders a document as one Markdown file meant for people and LLM
//! context windows: a header, a table of contents whose links match the
//! heading anchors, then every section and page in document order.

use crate::model::{Document, Endpoint, Page};
use crate::output::assembler::{outline, OutlineEntry, OutlineTarget};

const TOC_HEADING: &str = "Table of Contents";

/// Title line of the narrative artifact
pub fn document_title(document: &Document) -> String {
    format!("Mambu API {} Documentation", document.version)
}

/// Renders the narrative form of a document
///
/// Rendering is pure: the same document always yields the same text.
///
/// # Arguments
///
/// * `document` - The assembled document
///
/// # Returns
///
/// The Markdown text
pub fn render_narrative(document: &Document) -> String {
    let title = document_title(document);
    let entries = outline(document, &[title.as_str(), TOC_HEADING]);

    let mut md = String::new();

    md.push_str(&format!("# {}\n\n", title));
    md.push_str(&format!(
        "Generated: {}\n\n",
        document.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!(
        "Contains {} pages ({} endpoints)\n\n",
        document.pages.len(),
        document.endpoint_count()
    ));

    md.push_str(&format!("## {}\n\n", TOC_HEADING));
    md.push_str(&format_toc(&entries));
    md.push('\n');

    for entry in &entries {
        md.push_str(&format!("{} {}\n\n", "#".repeat(entry.level), entry.title));
        if let OutlineTarget::Page(index) = entry.target {
            if let Some(page) = document.pages.get(index) {
                md.push_str(&format_page(page));
            }
        }
    }

    md
}

fn format_toc(entries: &[OutlineEntry]) -> String {
    let mut toc = String::new();
    for entry in entries {
        let indent = "  ".repeat(entry.level.saturating_sub(2));
        toc.push_str(&format!("{}- [{}](#{})\n", indent, entry.title, entry.anchor));
    }
    toc
}

fn format_page(page: &Page) -> String {
    let mut md = String::new();

    if let Some(endpoint) = &page.endpoint {
        md.push_str(&format!("`{}`\n\n", endpoint.method_line()));
    }

    if !page.description.trim().is_empty() {
        md.push_str(page.description.trim());
        md.push_str("\n\n");
    }

    if let Some(endpoint) = &page.endpoint {
        md.push_str(&format_endpoint(endpoint));
        md.push_str(&format!("Source: <{}>\n\n", page.url));
    }

    md
}

fn format_endpoint(endpoint: &Endpoint) -> String {
    let mut md = String::new();

    if !endpoint.parameters.is_empty() {
        md.push_str("**Parameters**\n\n");
        md.push_str("| Name | In | Type | Required | Description |\n");
        md.push_str("|------|----|------|----------|-------------|\n");
        for param in &endpoint.parameters {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                table_cell(&param.name),
                param.location,
                table_cell(&param.param_type),
                if param.required { "yes" } else { "no" },
                table_cell(&param.description)
            ));
        }
        md.push('\n');
    }

    if !endpoint.code_samples.is_empty() {
        md.push_str("**Code samples**\n\n");
        for (language, sample) in &endpoint.code_samples {
            md.push_str(&fenced(language, sample));
        }
    }

    if !endpoint.response_examples.is_empty() {
        md.push_str("**Response examples**\n\n");
        for example in &endpoint.response_examples {
            match example.status {
                Some(status) => md.push_str(&format!("Status {}:\n\n", status)),
                None => md.push_str("Example:\n\n"),
            }
            let language = if looks_like_json(&example.payload) {
                "json"
            } else {
                ""
            };
            md.push_str(&fenced(language, &example.payload));
        }
    }

    md
}

/// A fenced block whose fence is longer than any backtick run in the body
fn fenced(language: &str, body: &str) -> String {
    let longest_run = body
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest_run.max(2) + 1);
    format!("{}{}\n{}\n{}\n\n", fence, language, body.trim_end(), fence)
}

fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn looks_like_json(payload: &str) -> bool {
    let trimmed = payload.trim_start();
    trimmed.starts_with('{') || trimmed.starts_with('[')
}
