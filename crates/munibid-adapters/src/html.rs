//! Small shared helpers over `scraper` documents.

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

use crate::AdapterError;

pub fn parse_selector(css: &str) -> Result<Selector, AdapterError> {
    Selector::parse(css).map_err(|e| AdapterError::Message(format!("selector `{css}`: {e}")))
}

/// Trim and drop empty strings.
pub fn text_or_none(value: String) -> Option<String> {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Element text with internal whitespace collapsed to single spaces.
pub fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn select_first_text(root: &Html, css: &str) -> Result<Option<String>, AdapterError> {
    let selector = parse_selector(css)?;
    Ok(root
        .select(&selector)
        .next()
        .and_then(|el| text_or_none(element_text(&el))))
}

pub fn select_first_attr(
    root: &Html,
    css: &str,
    attr: &str,
) -> Result<Option<String>, AdapterError> {
    let selector = parse_selector(css)?;
    Ok(root
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .and_then(|v| text_or_none(v.to_string())))
}

/// Non-empty text nodes of the whole document, in document order. The
/// closest equivalent of splitting a rendered page into lines, which is
/// how sources without real markup structure get mined for dates.
pub fn text_lines(document: &Html) -> Vec<String> {
    document
        .root_element()
        .text()
        .filter_map(|t| text_or_none(t.to_string()))
        .collect()
}

/// Whole-page text with line boundaries preserved, for regexes anchored
/// on label lines ("Posted: ...", "Location: ...").
pub fn document_text(document: &Html) -> String {
    text_lines(document).join("\n")
}

/// Find the first text node matching `pattern` and return its parent
/// element's full text. Mirrors the label-then-parent idiom the sources'
/// loosely structured detail pages force on us.
pub fn labeled_parent_text(document: &Html, pattern: &Regex) -> Option<String> {
    for node in document.tree.nodes() {
        if let Node::Text(text) = node.value() {
            if pattern.is_match(&text.text) {
                if let Some(parent) = node.parent().and_then(ElementRef::wrap) {
                    return text_or_none(element_text(&parent));
                }
            }
        }
    }
    None
}

/// Resolve an href against a site base. Absolute URLs pass through.
pub fn absolutize(base: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", base.trim_end_matches('/'), href)
    } else {
        format!("{}/{}", base.trim_end_matches('/'), href)
    }
}
