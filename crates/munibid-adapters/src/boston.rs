//! Boston: paginated `/bid-listings` index, one `views-row` container per
//! bid, with detail pages that carry a Type/UNSPSC block and most of the
//! interesting fields as labeled text.

use std::sync::LazyLock;

use async_trait::async_trait;
use munibid_core::{title as title_rules, City, RawRecord};
use munibid_storage::{HttpFetcher, Politeness};
use regex::Regex;
use scraper::Html;
use tracing::warn;

use crate::html::{absolutize, document_text, element_text, parse_selector, text_or_none};
use crate::{detail, AdapterError, SourceAdapter};

const BASE_URL: &str = "https://www.boston.gov";
const LISTING_URL: &str = "https://www.boston.gov/bid-listings";

/// Backstop against a pagination-detection bug walking forever.
const MAX_PAGES: usize = 25;

static POSTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Posted:\s*([^|]+)").unwrap());
static DUE_LISTING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Due:\s*([^|]+)").unwrap());
static DEPARTMENT_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Department:\s*([^\n]+)").unwrap());

static UNSPSC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)UNSPSC[:\s]*(\d+)").unwrap());
static RFQ_AVAILABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)RFQ Available[:\s]*([A-Za-z]+ \d{1,2}, \d{4})").unwrap());
static POSTED_DETAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Posted[:\s]*(\d{1,2}/\d{1,2}/\d{4})").unwrap());
static SOQ_DEADLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)SOQ Submission Deadline[:\s]*([A-Za-z]+ \d{1,2}, \d{4})").unwrap()
});
static DEADLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Deadline[:\s]*(\d{1,2}/\d{1,2}/\d{4})").unwrap());
static DUE_DETAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bDue[:\s]*(\d{1,2}/\d{1,2}/\d{4})").unwrap());
static LOCATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Location[:\s]*([^\n]+)").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct BostonListing {
    pub title: String,
    pub detail_url: Option<String>,
    pub department: Option<String>,
    pub posted: Option<String>,
    pub due: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BostonDetail {
    pub industry: Option<String>,
    pub estimated_value: Option<String>,
    pub release_date: Option<String>,
    pub due_date: Option<String>,
    pub comments: Option<String>,
    pub instructions: Option<String>,
    pub standard_forms: Option<String>,
    pub bid_forms: Option<String>,
}

#[derive(Debug)]
pub struct BostonAdapter {
    politeness: Politeness,
}

impl Default for BostonAdapter {
    fn default() -> Self {
        Self {
            politeness: Politeness::default(),
        }
    }
}

#[async_trait]
impl SourceAdapter for BostonAdapter {
    fn source_id(&self) -> &'static str {
        "boston"
    }

    fn city(&self) -> City {
        City::Boston
    }

    fn source_type(&self) -> &'static str {
        "Open Bids"
    }

    async fn scrape(&self, http: &HttpFetcher) -> Result<Vec<RawRecord>, AdapterError> {
        let mut records = Vec::new();
        let mut page_number = 1;

        loop {
            let url = page_url(page_number);
            let page = if page_number == 1 {
                // A dead first page fails the whole adapter; later pages
                // just end the walk.
                http.get_text(self.source_id(), &url).await?
            } else {
                match http.get_text(self.source_id(), &url).await {
                    Ok(page) => page,
                    Err(err) => {
                        warn!(error = %err, page_number, "boston listing page fetch failed, stopping pagination");
                        break;
                    }
                }
            };

            let listings = parse_listing_page(&page)?;
            if listings.is_empty() {
                break;
            }

            for listing in listings {
                let mut enrichment = BostonDetail::default();
                if let Some(url) = &listing.detail_url {
                    self.politeness.before_detail().await;
                    match http.get_text(self.source_id(), url).await {
                        Ok(detail_page) => enrichment = parse_detail(&detail_page),
                        Err(err) => {
                            warn!(error = %err, url, "boston detail page unavailable, keeping listing fields");
                        }
                    }
                }
                records.push(build_record(listing, enrichment));
            }

            if !has_next_page(&page, page_number)? || page_number >= MAX_PAGES {
                break;
            }
            page_number += 1;
            self.politeness.before_page().await;
        }

        Ok(records)
    }
}

fn page_url(page_number: usize) -> String {
    if page_number == 1 {
        LISTING_URL.to_string()
    } else {
        format!("{LISTING_URL}?page={page_number}")
    }
}

/// One page of the listing index. Only `views-row` containers that hold a
/// real bid link count; the CMS pads the grid with empty rows.
pub fn parse_listing_page(page: &str) -> Result<Vec<BostonListing>, AdapterError> {
    let document = Html::parse_document(page);
    let row_selector = parse_selector("div.views-row")?;
    let link_selector = parse_selector("a[href]")?;
    let txt_selector = parse_selector("div.txt")?;
    let img_selector = parse_selector("img[alt]")?;

    let mut listings = Vec::new();
    for container in document.select(&row_selector) {
        let Some(link) = container
            .select(&link_selector)
            .find(|a| a.value().attr("href").is_some_and(|h| h.contains("/bid-listings/")))
        else {
            continue;
        };
        let Some(title) = text_or_none(element_text(&link)) else {
            continue;
        };
        let detail_url = link.value().attr("href").map(|href| absolutize(BASE_URL, href));

        let mut posted = None;
        let mut due = None;
        if let Some(txt) = container.select(&txt_selector).next() {
            let text = element_text(&txt);
            posted = POSTED_RE
                .captures(&text)
                .and_then(|c| text_or_none(c[1].to_string()));
            due = DUE_LISTING_RE
                .captures(&text)
                .and_then(|c| text_or_none(c[1].to_string()));
        }

        let department = container
            .select(&img_selector)
            .filter_map(|img| img.value().attr("alt"))
            .find(|alt| {
                let lower = alt.to_ascii_lowercase();
                lower.contains("department") || lower.contains("dept")
            })
            .map(str::to_string)
            .or_else(|| {
                DEPARTMENT_LINE_RE
                    .captures(&element_text(&container))
                    .and_then(|c| text_or_none(c[1].to_string()))
            });

        listings.push(BostonListing {
            title,
            detail_url,
            department,
            posted,
            due,
        });
    }
    Ok(listings)
}

/// Pagination check: a link pointing past the current page, a "next page"
/// title, or the `››` glyph.
pub fn has_next_page(page: &str, current_page: usize) -> Result<bool, AdapterError> {
    let document = Html::parse_document(page);
    let link_selector = parse_selector("a[href]")?;
    let next_marker = format!("page={}", current_page + 1);

    for link in document.select(&link_selector) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !href.contains("?page=") {
            continue;
        }
        let title = link.value().attr("title").unwrap_or("").to_ascii_lowercase();
        let text = element_text(&link);
        if href.contains(&next_marker) || title.contains("next page") || text.contains("››") {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn parse_detail(page: &str) -> BostonDetail {
    let document = Html::parse_document(page);
    let text = document_text(&document);

    BostonDetail {
        industry: classify_from_detail(&text),
        estimated_value: detail::extract_estimated_value(&text),
        release_date: first_capture(&[&RFQ_AVAILABLE_RE, &POSTED_DETAIL_RE], &text),
        due_date: first_capture(&[&SOQ_DEADLINE_RE, &DEADLINE_RE, &DUE_DETAIL_RE], &text),
        comments: detail_comments(&document, &text),
        instructions: detail::extract_instructions(&text),
        standard_forms: standard_forms_with_unspsc(&text),
        bid_forms: detail::extract_bid_forms(&document),
    }
}

/// Industry from the UNSPSC code when present, content keywords
/// otherwise. `None` leaves the gap for the shared classifier.
fn classify_from_detail(text: &str) -> Option<String> {
    if let Some(caps) = UNSPSC_RE.captures(text) {
        let code = &caps[1];
        let label = match code.get(..2) {
            Some("72") => Some("Construction (Buildings)"),
            Some("93") => Some("Design and Engineering"),
            Some("81") => Some("IT - Software and Services"),
            _ => None,
        };
        if let Some(label) = label {
            return Some(label.to_string());
        }
    }

    let lower = text.to_ascii_lowercase();
    let by_content = [
        ("Construction (Buildings)", &["construction", "community center", "renovation"][..]),
        ("Design and Engineering", &["fiscal agent", "professional services"][..]),
        ("IT - Software and Services", &["software", "digital", "monitoring"][..]),
        ("Vehicle Maintenance and Parts", &["vehicle", "boat", "equipment repair"][..]),
        ("Construction (Public Works, Parks, Roadways)", &["tree planting", "playground"][..]),
    ];
    for (label, keywords) in by_content {
        if keywords.iter().any(|k| lower.contains(k)) {
            return Some(label.to_string());
        }
    }
    None
}

fn detail_comments(document: &Html, text: &str) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(caps) = LOCATION_RE.captures(text) {
        if let Some(location) = text_or_none(caps[1].to_string()) {
            parts.push(format!("Location: {location}"));
        }
    }
    if let Some(scope) = detail::extract_scope_comment(document) {
        parts.push(scope);
    }
    if parts.is_empty() {
        None
    } else {
        Some(detail::truncate(&parts.join(" | "), detail::COMMENT_MAX_LEN))
    }
}

fn standard_forms_with_unspsc(text: &str) -> Option<String> {
    let mut forms = detail::detect_standard_forms(text);
    if let Some(caps) = UNSPSC_RE.captures(text) {
        let note = format!("UNSPSC: {}", &caps[1]);
        forms = Some(match forms {
            Some(existing) => format!("{existing}, {note}"),
            None => note,
        });
    }
    forms
}

fn first_capture(patterns: &[&LazyLock<Regex>], text: &str) -> Option<String> {
    for pattern in patterns {
        if let Some(caps) = pattern.captures(text) {
            if let Some(value) = text_or_none(caps[1].to_string()) {
                return Some(value);
            }
        }
    }
    None
}

fn build_record(listing: BostonListing, enrichment: BostonDetail) -> RawRecord {
    RawRecord {
        department: listing.department,
        industry: enrichment.industry,
        estimated_value: enrichment.estimated_value,
        release_date: enrichment.release_date.or(listing.posted),
        due_date: enrichment.due_date.or(listing.due),
        comments: enrichment.comments,
        instructions: enrichment.instructions,
        standard_forms: enrichment.standard_forms,
        bid_forms: enrichment.bid_forms,
        bid_number: title_rules::extract_bid_number(&listing.title),
        source_url: listing.detail_url.or_else(|| Some(LISTING_URL.to_string())),
        title: listing.title,
        ..RawRecord::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_PAGE: &str = r##"
        <html><body>
        <div class="views-row">
          <a href="/bid-listings/rfp-2025-118-community-center">RFP-2025-118 Community Center Renovation</a>
          <div class="txt">Posted: 07/07/2025 | Due: 07/22/2025</div>
          <img alt="Property Management Department" src="/x.png">
        </div>
        <div class="views-row"><span>advertisement</span></div>
        <div class="views-row">
          <a href="/bid-listings/tree-planting-fall">Fall Tree Planting Program</a>
          <div class="txt">Posted: 07/01/2025</div>
        </div>
        <a href="?page=2" title="Go to next page">››</a>
        </body></html>"##;

    #[test]
    fn listing_rows_without_bid_links_are_skipped() {
        let listings = parse_listing_page(LISTING_PAGE).unwrap();
        assert_eq!(listings.len(), 2);

        let first = &listings[0];
        assert_eq!(first.title, "RFP-2025-118 Community Center Renovation");
        assert_eq!(
            first.detail_url.as_deref(),
            Some("https://www.boston.gov/bid-listings/rfp-2025-118-community-center")
        );
        assert_eq!(first.posted.as_deref(), Some("07/07/2025"));
        assert_eq!(first.due.as_deref(), Some("07/22/2025"));
        assert_eq!(first.department.as_deref(), Some("Property Management Department"));

        assert_eq!(listings[1].due, None);
    }

    #[test]
    fn next_page_detection_reads_pagination_links() {
        assert!(has_next_page(LISTING_PAGE, 1).unwrap());
        assert!(!has_next_page("<html><body>no links</body></html>", 1).unwrap());
    }

    #[test]
    fn detail_page_fields_come_from_labeled_text() {
        let page = r##"
            <html><body>
            <p>Type: Electronic</p>
            <p>UNSPSC: 72101500</p>
            <p>Location: 1483 Tremont Street, Roxbury</p>
            <p>Estimated Construction Cost: $50,000,000</p>
            <p>RFQ Available: July 7, 2025</p>
            <p>SOQ Submission Deadline: July 22, 2025</p>
            <p>The project consists of the design and construction of a new community
            center serving the Roxbury neighborhood, with background site work and
            related services included in the scope.</p>
            <p>Submission: one PDF on a USB flash drive delivered to Room 808.</p>
            <p>Prevailing Wages Apply. DCAMM Certification required.</p>
            <a href="/forms/soq-form.pdf">SOQ Form</a>
            </body></html>"##;
        let detail = parse_detail(page);
        assert_eq!(detail.industry.as_deref(), Some("Construction (Buildings)"));
        assert_eq!(detail.estimated_value.as_deref(), Some("$50,000,000"));
        assert_eq!(detail.release_date.as_deref(), Some("July 7, 2025"));
        assert_eq!(detail.due_date.as_deref(), Some("July 22, 2025"));
        assert!(detail.comments.unwrap().starts_with("Location: 1483 Tremont Street"));
        assert!(detail.instructions.unwrap().contains("USB flash drive"));
        let forms = detail.standard_forms.unwrap();
        assert!(forms.contains("Prevailing Wage"));
        assert!(forms.contains("UNSPSC: 72101500"));
        assert_eq!(detail.bid_forms.as_deref(), Some("SOQ Form"));
    }

    #[test]
    fn detail_fields_win_over_listing_fields() {
        let listing = BostonListing {
            title: "RFP-2025-118 Community Center Renovation".into(),
            detail_url: None,
            department: None,
            posted: Some("07/07/2025".into()),
            due: Some("07/22/2025".into()),
        };
        let enrichment = BostonDetail {
            due_date: Some("July 29, 2025".into()),
            ..BostonDetail::default()
        };
        let record = build_record(listing, enrichment);
        assert_eq!(record.due_date.as_deref(), Some("July 29, 2025"));
        assert_eq!(record.release_date.as_deref(), Some("07/07/2025"));
        assert_eq!(record.bid_number.as_deref(), Some("2025-118"));
    }
}
