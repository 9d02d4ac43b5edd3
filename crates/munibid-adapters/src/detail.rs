//! Detail-page enrichment shared across adapters: currency tokens,
//! scope paragraphs, submission instructions, compliance-form vocabulary
//! and document links. All extraction is best-effort; `None` means the
//! page did not give the field up, never an error.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use crate::html::{element_text, parse_selector, text_or_none};

/// Currency-token candidates, tried in order; the first match wins.
static VALUE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)estimated construction cost[:\s]*\$?([\d,]+(?:\.\d{2})?)").unwrap(),
        Regex::new(r"(?i)(?:estimated|estimate|budget|value|amount)\s*[:\-]\s*\$?([\d,]+(?:\.\d{2})?)")
            .unwrap(),
        Regex::new(r"(?i)not\s+to\s+exceed\s*\$?([\d,]+(?:\.\d{2})?)").unwrap(),
        Regex::new(r"\$([\d,]+(?:\.\d{2})?)").unwrap(),
    ]
});

static INSTRUCTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)submission[:\s]+([^\n.]+)").unwrap(),
        Regex::new(r"(?i)(usb flash drives[^\n.]+)").unwrap(),
        Regex::new(r"(?i)(sealed (?:package|bid|envelope)[^\n.]+)").unwrap(),
        Regex::new(r"(?i)(pdf format[^\n.]+)").unwrap(),
    ]
});

/// Known compliance-form vocabulary. Presence anywhere on a detail page
/// is recorded; nothing else about the form is interpreted.
pub const FORM_KEYWORDS: [&str; 8] = [
    "Prevailing Wage",
    "DCAMM Certification",
    "MWBE",
    "CORI",
    "EPP",
    "REAP",
    "Wage Theft",
    "Union",
];

const SCOPE_KEYWORDS: [&str; 4] = ["project", "services", "scope", "background"];
const DOCUMENT_EXTENSIONS: [&str; 5] = [".pdf", ".doc", ".docx", ".xls", ".xlsx"];
const FORM_LINK_WORDS: [&str; 6] = ["form", "spec", "drawing", "addendum", "attachment", "document"];

pub const COMMENT_MAX_LEN: usize = 500;
pub const INSTRUCTIONS_MAX_LEN: usize = 300;

/// First currency-like token in the page text, normalized to a leading `$`.
pub fn extract_estimated_value(text: &str) -> Option<String> {
    for pattern in VALUE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            return Some(format!("${}", &caps[1]));
        }
    }
    None
}

/// First paragraph of substance that reads like a scope description.
pub fn extract_scope_comment(document: &Html) -> Option<String> {
    let selector = parse_selector("p").ok()?;
    for paragraph in document.select(&selector) {
        let text = element_text(&paragraph);
        let lower = text.to_ascii_lowercase();
        if text.len() > 100 && SCOPE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            return Some(truncate(&text, COMMENT_MAX_LEN));
        }
    }
    None
}

/// Submission-instruction fragments, at most three, joined with ` | `.
pub fn extract_instructions(text: &str) -> Option<String> {
    let mut parts = Vec::new();
    for pattern in INSTRUCTION_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let fragment = caps[1].trim().to_string();
            if fragment.len() > 10 && !parts.contains(&fragment) {
                parts.push(fragment);
            }
        }
    }
    if parts.is_empty() {
        None
    } else {
        parts.truncate(3);
        Some(truncate(&parts.join(" | "), INSTRUCTIONS_MAX_LEN))
    }
}

/// Which compliance-form keywords appear on the page, comma-joined in
/// vocabulary order.
pub fn detect_standard_forms(text: &str) -> Option<String> {
    let lower = text.to_ascii_lowercase();
    let found: Vec<&str> = FORM_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| lower.contains(&keyword.to_ascii_lowercase()))
        .collect();
    if found.is_empty() {
        None
    } else {
        Some(found.join(", "))
    }
}

/// Link texts of up to five bid-specific documents (specs, drawings,
/// addenda) found on the page.
pub fn extract_bid_forms(document: &Html) -> Option<String> {
    let selector = parse_selector("a[href]").ok()?;
    let mut names = Vec::new();
    for link in document.select(&selector) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let href_lower = href.to_ascii_lowercase();
        if !DOCUMENT_EXTENSIONS.iter().any(|ext| href_lower.contains(ext)) {
            continue;
        }
        let Some(text) = text_or_none(element_text(&link)) else {
            continue;
        };
        let text_lower = text.to_ascii_lowercase();
        if FORM_LINK_WORDS.iter().any(|word| text_lower.contains(word)) && !names.contains(&text) {
            names.push(text);
        }
        if names.len() == 5 {
            break;
        }
    }
    if names.is_empty() {
        None
    } else {
        Some(names.join(", "))
    }
}

/// Truncate on a character boundary.
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labeled_values_beat_bare_dollar_tokens() {
        let text = "Fee: $25 per set. Estimated Construction Cost: $50,000,000 total.";
        assert_eq!(extract_estimated_value(text).as_deref(), Some("$50,000,000"));
    }

    #[test]
    fn bare_dollar_token_is_the_last_resort() {
        assert_eq!(
            extract_estimated_value("Contract worth $1,500,000 over 3 years").as_deref(),
            Some("$1,500,000")
        );
        assert_eq!(extract_estimated_value("No pricing information"), None);
    }

    #[test]
    fn scope_paragraph_needs_length_and_a_scope_word() {
        let document = Html::parse_document(
            "<p>Short note.</p>\
             <p>The scope of this project covers the removal and replacement of the \
             existing roof membrane at the public safety building, including staging, \
             disposal and related site services.</p>",
        );
        let comment = extract_scope_comment(&document).unwrap();
        assert!(comment.starts_with("The scope of this project"));
    }

    #[test]
    fn instructions_join_fragments_and_cap_length() {
        let text = "Submission: one original and three copies.\n\
                    Responses must arrive in a sealed package clearly marked with the bid number.\n";
        let instructions = extract_instructions(text).unwrap();
        assert!(instructions.contains("one original and three copies"));
        assert!(instructions.contains(" | "));
        assert!(instructions.len() <= INSTRUCTIONS_MAX_LEN);
    }

    #[test]
    fn standard_forms_report_in_vocabulary_order() {
        let text = "Vendors must file CORI checks. Prevailing wage rates apply. MWBE encouraged.";
        assert_eq!(
            detect_standard_forms(text).as_deref(),
            Some("Prevailing Wage, MWBE, CORI")
        );
        assert_eq!(detect_standard_forms("nothing relevant"), None);
    }

    #[test]
    fn bid_form_links_filter_on_extension_and_wording() {
        let document = Html::parse_document(
            r##"<a href="/docs/spec-book.pdf">Specification Book</a>
                <a href="/docs/photo.jpg">Site Photo Document</a>
                <a href="/docs/addendum1.pdf">Addendum 1</a>
                <a href="/about.html">About</a>"##,
        );
        assert_eq!(
            extract_bid_forms(&document).as_deref(),
            Some("Specification Book, Addendum 1")
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "déjà vu".repeat(100);
        let cut = truncate(&text, 500);
        assert!(cut.len() <= 500);
        assert!(text.starts_with(&cut));
    }
}
