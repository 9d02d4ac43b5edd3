//! Quincy: a purchasing page whose bid table is barely a table. Titles
//! link to `bid_detail_*.php` pages; issue and due dates live in the
//! loose text around each link, so they are mined from the surrounding
//! lines. Detail pages carry the richer fields.

use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use munibid_core::{title as title_rules, City, RawRecord};
use munibid_storage::{HttpFetcher, Politeness};
use regex::Regex;
use scraper::Html;
use tracing::warn;

use crate::html::{absolutize, document_text, element_text, labeled_parent_text, parse_selector, text_lines, text_or_none};
use crate::{detail, AdapterError, SourceAdapter};

const BASE_URL: &str = "https://www.quincyma.gov";
const LISTING_URL: &str = "https://www.quincyma.gov/departments/purchasing/current_bids.php";

/// How many text lines after the title participate in date mining.
const CONTEXT_LINES: usize = 4;

static DETAIL_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"bid_detail_.*\.php").unwrap());

static MONTH_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},\s+\d{4}").unwrap()
});

static CLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}:\d{2}\s*[AP]M").unwrap());

static DEPARTMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(DPW|Public Works|Police|Fire|Parks|Recreation|Engineering|IT|Finance|Purchasing|Water|Sewer|Highway|Building|Planning|Health)\b").unwrap()
});

static COMMENT_CLASS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"content|description|detail").unwrap());

static INSTRUCTION_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)instruction|requirement|specification").unwrap());

static DEPOSIT_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)deposit|bond").unwrap());

static ADDENDUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)addendum|amendment").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct QuincyListing {
    pub title: String,
    pub detail_url: Option<String>,
    pub release_date: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuincyDetail {
    pub estimated_value: Option<String>,
    pub comments: Option<String>,
    pub instructions: Option<String>,
    pub bid_deposit: Option<String>,
    pub addendum: Option<String>,
    pub standard_forms: Option<String>,
}

#[derive(Debug)]
pub struct QuincyAdapter {
    politeness: Politeness,
}

impl Default for QuincyAdapter {
    fn default() -> Self {
        Self {
            politeness: Politeness::default(),
        }
    }
}

#[async_trait]
impl SourceAdapter for QuincyAdapter {
    fn source_id(&self) -> &'static str {
        "quincy"
    }

    fn city(&self) -> City {
        City::Quincy
    }

    fn source_type(&self) -> &'static str {
        "Current Bids"
    }

    async fn scrape(&self, http: &HttpFetcher) -> Result<Vec<RawRecord>, AdapterError> {
        let page = http.get_text(self.source_id(), LISTING_URL).await?;
        let listings = parse_listing(&page)?;

        let mut records = Vec::with_capacity(listings.len());
        for listing in listings {
            let mut enrichment = QuincyDetail::default();
            if let Some(url) = &listing.detail_url {
                self.politeness.before_detail().await;
                match http.get_text(self.source_id(), url).await {
                    Ok(detail_page) => enrichment = parse_detail(&detail_page),
                    Err(err) => {
                        warn!(error = %err, url, "quincy detail page unavailable, keeping listing fields");
                    }
                }
            }
            records.push(build_record(listing, enrichment));
        }
        Ok(records)
    }
}

/// Extract the bid links plus whatever dates the surrounding text gives
/// up. Duplicate hrefs (the page repeats links in summaries) collapse to
/// the first occurrence.
pub fn parse_listing(page: &str) -> Result<Vec<QuincyListing>, AdapterError> {
    let document = Html::parse_document(page);
    let link_selector = parse_selector("a[href]")?;
    let lines = text_lines(&document);

    let mut seen = HashSet::new();
    let mut listings = Vec::new();
    for link in document.select(&link_selector) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !DETAIL_LINK_RE.is_match(href) || !seen.insert(href.to_string()) {
            continue;
        }
        let Some(title) = text_or_none(element_text(&link)) else {
            continue;
        };
        let (release_date, due_date) = dates_from_context(&lines, &title);
        listings.push(QuincyListing {
            title,
            detail_url: Some(absolutize(BASE_URL, href)),
            release_date,
            due_date,
        });
    }
    Ok(listings)
}

/// Month-name dates near the title: a date sharing its line with a clock
/// time is the due date; the first bare date is the issue date, a second
/// one the due date.
fn dates_from_context(lines: &[String], title: &str) -> (Option<String>, Option<String>) {
    let Some(position) = lines.iter().position(|line| line.contains(title)) else {
        return (None, None);
    };
    let context = &lines[position..(position + CONTEXT_LINES).min(lines.len())];

    let mut release = None;
    let mut due = None;
    for line in context {
        let Some(date) = MONTH_DATE_RE.find(line) else {
            continue;
        };
        if let Some(clock) = CLOCK_RE.find(line) {
            if due.is_none() {
                due = Some(format!("{} {}", date.as_str(), clock.as_str()));
            }
        } else if release.is_none() {
            release = Some(date.as_str().to_string());
        } else if due.is_none() {
            due = Some(date.as_str().to_string());
        }
    }
    (release, due)
}

pub fn parse_detail(page: &str) -> QuincyDetail {
    let document = Html::parse_document(page);
    let page_text = document_text(&document);

    let comments = comment_block(&document);
    let instructions = labeled_parent_text(&document, &INSTRUCTION_LABEL_RE)
        .map(|t| detail::truncate(&t, detail::INSTRUCTIONS_MAX_LEN));
    let bid_deposit =
        labeled_parent_text(&document, &DEPOSIT_LABEL_RE).map(|t| detail::truncate(&t, 200));
    let addendum = ADDENDUM_RE
        .is_match(&page_text)
        .then(|| "Addendum Available".to_string());

    QuincyDetail {
        estimated_value: detail::extract_estimated_value(&page_text),
        comments,
        instructions,
        bid_deposit,
        addendum,
        standard_forms: detail::detect_standard_forms(&page_text),
    }
}

/// First substantial block inside a content/description/detail container.
fn comment_block(document: &Html) -> Option<String> {
    let selector = parse_selector("div, p").ok()?;
    for element in document.select(&selector) {
        let Some(class) = element.value().attr("class") else {
            continue;
        };
        if !COMMENT_CLASS_RE.is_match(class) {
            continue;
        }
        let text = element_text(&element);
        if text.len() > 50 {
            return Some(detail::truncate(&text, detail::COMMENT_MAX_LEN));
        }
    }
    None
}

fn build_record(listing: QuincyListing, enrichment: QuincyDetail) -> RawRecord {
    RawRecord {
        department: DEPARTMENT_RE
            .captures(&listing.title)
            .map(|caps| caps[1].to_string()),
        bid_number: title_rules::extract_bid_number(&listing.title),
        release_date: listing.release_date,
        due_date: listing.due_date,
        source_url: listing.detail_url.clone().or_else(|| Some(LISTING_URL.to_string())),
        estimated_value: enrichment.estimated_value,
        comments: enrichment.comments,
        instructions: enrichment.instructions,
        bid_deposit: enrichment.bid_deposit,
        addendum: enrichment.addendum,
        standard_forms: enrichment.standard_forms,
        title: listing.title,
        ..RawRecord::default()
    }
}
