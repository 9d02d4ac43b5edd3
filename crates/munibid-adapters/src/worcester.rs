//! Worcester: open-bids table of bid number / title / close date, with a
//! detail page per bid number that labels its fields in running text.

use std::sync::LazyLock;

use async_trait::async_trait;
use munibid_core::{City, RawRecord};
use munibid_storage::{HttpFetcher, Politeness};
use regex::Regex;
use scraper::Html;
use tracing::warn;

use crate::html::{absolutize, element_text, labeled_parent_text, parse_selector, text_or_none};
use crate::{detail, AdapterError, SourceAdapter};

const BASE_URL: &str = "http://www.worcesterma.gov";
const LISTING_URL: &str = "http://www.worcesterma.gov/finance/purchasing-bids/bids/open-bids";

static INDUSTRY_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Industry|Category").unwrap());
static INDUSTRY_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:Industry|Category):\s*(.+)").unwrap());
static RELEASE_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Open Date|Issue Date|Posted").unwrap());
static SLASH_DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{1,2}/\d{1,2}/\d{4}").unwrap());
static COMMENTS_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Comments|Description|Details").unwrap());
static COMMENTS_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:Comments|Description|Details):\s*").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct WorcesterListing {
    pub bid_number: String,
    pub title: String,
    pub department: Option<String>,
    pub close_date: Option<String>,
    pub detail_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorcesterDetail {
    pub industry: Option<String>,
    pub release_date: Option<String>,
    pub comments: Option<String>,
    pub standard_forms: Option<String>,
    pub bid_forms: Option<String>,
}

#[derive(Debug)]
pub struct WorcesterAdapter {
    politeness: Politeness,
}

impl Default for WorcesterAdapter {
    fn default() -> Self {
        Self {
            politeness: Politeness::default(),
        }
    }
}

#[async_trait]
impl SourceAdapter for WorcesterAdapter {
    fn source_id(&self) -> &'static str {
        "worcester"
    }

    fn city(&self) -> City {
        City::Worcester
    }

    fn source_type(&self) -> &'static str {
        "Open Bids"
    }

    async fn scrape(&self, http: &HttpFetcher) -> Result<Vec<RawRecord>, AdapterError> {
        let page = http.get_text(self.source_id(), LISTING_URL).await?;
        let listings = parse_listing(&page)?;

        let mut records = Vec::with_capacity(listings.len());
        for listing in listings {
            let mut enrichment = WorcesterDetail::default();
            if let Some(url) = &listing.detail_url {
                self.politeness.before_detail().await;
                match http.get_text(self.source_id(), url).await {
                    Ok(detail_page) => enrichment = parse_detail(&detail_page),
                    Err(err) => {
                        warn!(error = %err, url, "worcester detail page unavailable, keeping table fields");
                    }
                }
            }
            records.push(build_record(listing, enrichment));
        }
        Ok(records)
    }
}

/// Rows of the open-bids table: bid number (linked), title, close date.
/// A ` / ` suffix on the title names the issuing department.
pub fn parse_listing(page: &str) -> Result<Vec<WorcesterListing>, AdapterError> {
    let document = Html::parse_document(page);
    let table_selector = parse_selector("table")?;
    let tr_selector = parse_selector("tr")?;
    let td_selector = parse_selector("td")?;
    let link_selector = parse_selector("a[href]")?;

    let Some(table) = document.select(&table_selector).next() else {
        return Ok(Vec::new());
    };

    let mut listings = Vec::new();
    for row in table.select(&tr_selector) {
        let cells: Vec<_> = row.select(&td_selector).collect();
        if cells.len() < 3 {
            continue;
        }
        let Some(bid_number) = text_or_none(element_text(&cells[0])) else {
            continue;
        };
        let Some(full_title) = text_or_none(element_text(&cells[1])) else {
            continue;
        };
        let close_date = text_or_none(element_text(&cells[2]));

        let detail_url = cells[0]
            .select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| absolutize(BASE_URL, href));

        let (title, department) = split_department(&full_title);
        listings.push(WorcesterListing {
            bid_number,
            title,
            department,
            close_date,
            detail_url,
        });
    }
    Ok(listings)
}

/// "Project Name / DPW" carries the department after the last separator.
fn split_department(full_title: &str) -> (String, Option<String>) {
    match full_title.rsplit_once(" / ") {
        Some((title, department)) if !department.trim().is_empty() => {
            (title.trim().to_string(), Some(department.trim().to_string()))
        }
        _ => (full_title.to_string(), None),
    }
}

pub fn parse_detail(page: &str) -> WorcesterDetail {
    let document = Html::parse_document(page);
    let page_text = crate::html::document_text(&document);

    let industry = labeled_parent_text(&document, &INDUSTRY_LABEL_RE)
        .and_then(|text| INDUSTRY_VALUE_RE.captures(&text).map(|c| c[1].trim().to_string()))
        .filter(|v| !v.is_empty());

    let release_date = labeled_parent_text(&document, &RELEASE_LABEL_RE)
        .and_then(|text| SLASH_DATE_RE.find(&text).map(|m| m.as_str().to_string()));

    let comments = labeled_parent_text(&document, &COMMENTS_LABEL_RE)
        .map(|text| COMMENTS_PREFIX_RE.replace(&text, "").trim().to_string())
        .filter(|text| text.len() > 10)
        .map(|text| detail::truncate(&text, detail::COMMENT_MAX_LEN));

    WorcesterDetail {
        industry,
        release_date,
        comments,
        standard_forms: detail::detect_standard_forms(&page_text),
        bid_forms: detail::extract_bid_forms(&document),
    }
}

fn build_record(listing: WorcesterListing, enrichment: WorcesterDetail) -> RawRecord {
    RawRecord {
        department: listing.department,
        industry: enrichment.industry,
        release_date: enrichment.release_date,
        due_date: listing.close_date,
        comments: enrichment.comments,
        standard_forms: enrichment.standard_forms,
        bid_forms: enrichment.bid_forms,
        bid_number: Some(listing.bid_number),
        source_url: listing.detail_url.or_else(|| Some(LISTING_URL.to_string())),
        title: listing.title,
        ..RawRecord::default()
    }
}
