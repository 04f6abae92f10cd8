//! Block classification
//!
//! Flattens a content region into a sequence of typed blocks in document
//! order. Containers are walked recursively; runs of inline content become
//! paragraphs.

use scraper::node::Node;
use scraper::{ElementRef, Selector};

/// A structural unit of page content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    Code(CodeBlock),
    Table(Table),
    Definitions(Vec<(String, String)>),
    List { ordered: bool, items: Vec<String> },
    Quote(String),
}

impl Block {
    /// Plain text of the block, one logical line per line
    pub fn text(&self) -> String {
        match self {
            Block::Heading { text, .. } | Block::Paragraph(text) | Block::Quote(text) => {
                text.clone()
            }
            Block::Code(code) => code.text.clone(),
            Block::Table(table) => table
                .rows
                .iter()
                .map(|row| row.join(" "))
                .collect::<Vec<_>>()
                .join("\n"),
            Block::Definitions(pairs) => pairs
                .iter()
                .map(|(term, def)| format!("{} {}", term, def))
                .collect::<Vec<_>>()
                .join("\n"),
            Block::List { items, .. } => items.join("\n"),
        }
    }
}

/// A preformatted block and the language hint found on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Raw language label from a class or `data-lang` attribute
    pub label: Option<String>,
    pub text: String,
}

/// A table with its header cells separated from the body rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "br", "code", "em", "i", "kbd", "label", "mark", "small", "span", "strong",
    "sub", "sup", "u", "time",
];

const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "nav", "button", "form", "input", "select",
    "iframe", "img", "head",
];

const BLOCK_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "pre", "table", "dl", "ul", "ol", "blockquote",
    "div", "section", "article",
];

/// Collapses runs of whitespace into single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of an element with script and style content removed
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_visible_text(element, &mut out);
    collapse_whitespace(&out)
}

fn push_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                if name == "br" {
                    out.push(' ');
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    let inline = INLINE_TAGS.contains(&name);
                    if !inline {
                        out.push(' ');
                    }
                    push_visible_text(child_el, out);
                    if !inline {
                        out.push(' ');
                    }
                }
            }
            _ => {}
        }
    }
}

/// Classifies the content of `region` into blocks
pub fn classify(region: ElementRef<'_>) -> Vec<Block> {
    let mut blocks = Vec::new();
    walk_container(region, &mut blocks);
    blocks
}

fn walk_container(container: ElementRef<'_>, blocks: &mut Vec<Block>) {
    let mut inline = String::new();

    for child in container.children() {
        match child.value() {
            Node::Text(text) => inline.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                let Some(element) = ElementRef::wrap(child) else {
                    continue;
                };
                if name == "br" {
                    inline.push(' ');
                    continue;
                }
                if INLINE_TAGS.contains(&name) && !has_block_descendant(element) {
                    inline.push_str(&visible_text(element));
                    continue;
                }
                flush_inline(&mut inline, blocks);
                classify_element(element, blocks);
            }
            _ => {}
        }
    }

    flush_inline(&mut inline, blocks);
}

fn flush_inline(inline: &mut String, blocks: &mut Vec<Block>) {
    let text = collapse_whitespace(inline);
    if !text.is_empty() {
        blocks.push(Block::Paragraph(text));
    }
    inline.clear();
}

fn has_block_descendant(element: ElementRef<'_>) -> bool {
    element
        .descendants()
        .skip(1)
        .filter_map(|node| node.value().as_element())
        .any(|el| BLOCK_TAGS.contains(&el.name()))
}

fn classify_element(element: ElementRef<'_>, blocks: &mut Vec<Block>) {
    let name = element.value().name();
    match name {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse().unwrap_or(6);
            let text = visible_text(element);
            if !text.is_empty() {
                blocks.push(Block::Heading { level, text });
            }
        }
        "p" => {
            let text = visible_text(element);
            if !text.is_empty() {
                blocks.push(Block::Paragraph(text));
            }
        }
        "pre" => {
            let text = preformatted_text(element);
            if !text.trim().is_empty() {
                blocks.push(Block::Code(CodeBlock {
                    label: code_label(element),
                    text,
                }));
            }
        }
        "table" => {
            let table = parse_table(element);
            if !table.rows.is_empty() || !table.headers.is_empty() {
                blocks.push(Block::Table(table));
            }
        }
        "dl" => {
            let pairs = parse_definitions(element);
            if !pairs.is_empty() {
                blocks.push(Block::Definitions(pairs));
            }
        }
        "ul" | "ol" => {
            let items: Vec<String> = element
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|li| li.value().name() == "li")
                .map(visible_text)
                .filter(|text| !text.is_empty())
                .collect();
            if !items.is_empty() {
                blocks.push(Block::List {
                    ordered: name == "ol",
                    items,
                });
            }
        }
        "blockquote" => {
            let text = visible_text(element);
            if !text.is_empty() {
                blocks.push(Block::Quote(text));
            }
        }
        _ => {
            if has_block_descendant(element) {
                walk_container(element, blocks);
            } else {
                let text = visible_text(element);
                if !text.is_empty() {
                    blocks.push(Block::Paragraph(text));
                }
            }
        }
    }
}

/// Text of a `<pre>` with line structure preserved and outer blank lines removed
fn preformatted_text(element: ElementRef<'_>) -> String {
    let raw: String = element.text().collect();
    let lines: Vec<&str> = raw.lines().map(str::trim_end).collect();
    let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);
    lines[start..end].join("\n")
}

/// Finds a language hint on a `<pre>` or its `<code>` child
///
/// Recognized forms: `language-x`, `lang-x`, `tab-x`, `highlight x` and `data-lang="x"`.
pub fn code_label(pre: ElementRef<'_>) -> Option<String> {
    let mut candidates = vec![pre];
    candidates.extend(
        pre.children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name() == "code"),
    );

    for element in &candidates {
        if let Some(lang) = element.value().attr("data-lang") {
            if !lang.trim().is_empty() {
                return Some(lang.trim().to_string());
            }
        }
        for class in element.value().classes() {
            for prefix in ["language-", "lang-", "tab-"] {
                if let Some(lang) = class.strip_prefix(prefix) {
                    if !lang.is_empty() {
                        return Some(lang.to_string());
                    }
                }
            }
        }
    }

    for element in &candidates {
        let classes: Vec<&str> = element.value().classes().collect();
        if classes.contains(&"highlight") {
            if let Some(lang) = classes
                .iter()
                .find(|c| **c != "highlight" && **c != "source" && !c.contains('-'))
            {
                return Some(lang.to_string());
            }
        }
    }

    None
}

fn parse_table(table: ElementRef<'_>) -> Table {
    let mut parsed = Table::default();
    let Ok(row_selector) = Selector::parse("tr") else {
        return parsed;
    };

    for row in table.select(&row_selector) {
        let cells: Vec<ElementRef<'_>> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|cell| matches!(cell.value().name(), "td" | "th"))
            .collect();
        if cells.is_empty() {
            continue;
        }

        let texts: Vec<String> = cells.iter().map(|cell| visible_text(*cell)).collect();
        let all_headers = cells.iter().all(|cell| cell.value().name() == "th");
        if all_headers && parsed.headers.is_empty() && parsed.rows.is_empty() {
            parsed.headers = texts;
        } else if texts.iter().any(|t| !t.is_empty()) {
            parsed.rows.push(texts);
        }
    }

    parsed
}

fn parse_definitions(list: ElementRef<'_>) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for child in list.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "dt" => pairs.push((visible_text(child), String::new())),
            "dd" => {
                let text = visible_text(child);
                match pairs.last_mut() {
                    Some((_, def)) if def.is_empty() => *def = text,
                    Some((_, def)) => {
                        def.push(' ');
                        def.push_str(&text);
                    }
                    None => pairs.push((String::new(), text)),
                }
            }
            _ => {}
        }
    }
    pairs.retain(|(term, _)| !term.is_empty());
    pairs
}
