//! Title cleanup and bid-number extraction.

use std::sync::LazyLock;

use regex::Regex;

// Known solicitation prefixes: "IFB# 25-69", "RFP # 26-02", "RFS 2025-4",
// "Request for Quotes #12-3". The code must start with a digit so titles
// that merely begin with the acronym as a word are left alone.
static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:(?:IFB|RFP|RFS|RFQ)\s*[#-]?\s*\d[\w./-]*|Request\s+for\s+(?:Quotes?|Proposals?)\s*[#-]?\s*\d[\w./-]*)\s*[-–—:;]*\s*",
    )
    .unwrap()
});

static BID_NUMBER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(?:IFB|RFP|RFS|RFQ|Bid)\s*[#-]?\s*(\d[\w-]*)").unwrap(),
        Regex::new(r"#\s*([A-Za-z0-9][\w-]*)").unwrap(),
        Regex::new(r"\b(\d{2,4}-\d{1,4})\b").unwrap(),
    ]
});

/// Strip a leading solicitation-code prefix from a title. Idempotent, and
/// never returns an empty string: a title that is nothing but its code is
/// kept as-is.
pub fn clean_title(title: &str) -> String {
    let trimmed = title.trim();
    let cleaned = PREFIX_RE.replace(trimmed, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        trimmed.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Pull a bid/solicitation number out of a title, first matching pattern
/// wins. Runs against the original title, before [`clean_title`] strips
/// the code away.
pub fn extract_bid_number(title: &str) -> Option<String> {
    for pattern in BID_NUMBER_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(title) {
            return Some(caps[1].to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_rfp_prefix_with_code() {
        assert_eq!(
            clean_title("RFP # 26-02 Water & Sewer Director Search"),
            "Water & Sewer Director Search"
        );
    }

    #[test]
    fn strips_ifb_prefix_with_code() {
        assert_eq!(clean_title("IFB# 25-69 Roof Replacement"), "Roof Replacement");
    }

    #[test]
    fn strips_spelled_out_request_for_quotes() {
        assert_eq!(
            clean_title("Request for Quotes #12-3 Tree Removal"),
            "Tree Removal"
        );
    }

    #[test]
    fn cleanup_is_idempotent() {
        let once = clean_title("RFP # 26-02 Water & Sewer Director Search");
        assert_eq!(clean_title(&once), once);
    }

    #[test]
    fn title_without_prefix_is_untouched() {
        assert_eq!(clean_title("Snow Plowing Services"), "Snow Plowing Services");
    }

    #[test]
    fn acronym_as_a_word_is_not_a_prefix() {
        assert_eq!(
            clean_title("RFP Writing Workshop Services"),
            "RFP Writing Workshop Services"
        );
    }

    #[test]
    fn dashed_codes_are_prefixes_too() {
        assert_eq!(
            clean_title("RFP-2025-118 Community Center Renovation"),
            "Community Center Renovation"
        );
        assert_eq!(
            extract_bid_number("RFP-2025-118 Community Center Renovation").as_deref(),
            Some("2025-118")
        );
    }

    #[test]
    fn never_produces_an_empty_title() {
        assert_eq!(clean_title("IFB# 25-69"), "IFB# 25-69");
    }

    #[test]
    fn bid_number_comes_from_the_prefix() {
        assert_eq!(
            extract_bid_number("RFP # 26-02 Water & Sewer Director Search").as_deref(),
            Some("26-02")
        );
        assert_eq!(extract_bid_number("IFB# 25-69 Roof Replacement").as_deref(), Some("25-69"));
    }

    #[test]
    fn bare_hash_and_dashed_codes_are_fallbacks() {
        assert_eq!(extract_bid_number("Contract #C-1099 Paving").as_deref(), Some("C-1099"));
        assert_eq!(extract_bid_number("Paving Program 2025-14").as_deref(), Some("2025-14"));
        assert_eq!(extract_bid_number("Snow Plowing Services"), None);
    }
}
