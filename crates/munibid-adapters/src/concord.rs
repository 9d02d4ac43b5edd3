//! Concord: CivicPlus-style bid list. Each row holds a title link and a
//! status block; detail pages lay out labeled values as alternating table
//! rows (`BidListHeader` label, `BidDetail` value on the next row).

use std::sync::LazyLock;

use async_trait::async_trait;
use munibid_core::{City, RawRecord};
use munibid_storage::{HttpFetcher, Politeness};
use regex::Regex;
use scraper::Html;
use tracing::warn;

use crate::html::{absolutize, document_text, element_text, parse_selector, text_or_none};
use crate::{detail, AdapterError, SourceAdapter};

const BASE_URL: &str = "https://concordma.gov";
const LISTING_URL: &str = "https://concordma.gov/bids.aspx";

const VALUE_LABEL_KEYWORDS: [&str; 6] = ["estimated", "budget", "value", "cost", "amount", "price"];

static NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\d,]+(?:\.\d{2})?").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct ConcordListing {
    pub title: String,
    pub detail_url: Option<String>,
    pub status: Option<String>,
    pub closing_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConcordDetail {
    pub release_date: Option<String>,
    pub estimated_value: Option<String>,
}

#[derive(Debug)]
pub struct ConcordAdapter {
    politeness: Politeness,
}

impl Default for ConcordAdapter {
    fn default() -> Self {
        Self {
            politeness: Politeness::default(),
        }
    }
}

#[async_trait]
impl SourceAdapter for ConcordAdapter {
    fn source_id(&self) -> &'static str {
        "concord"
    }

    fn city(&self) -> City {
        City::Concord
    }

    fn source_type(&self) -> &'static str {
        "Open Bids"
    }

    async fn scrape(&self, http: &HttpFetcher) -> Result<Vec<RawRecord>, AdapterError> {
        let page = http.get_text(self.source_id(), LISTING_URL).await?;
        let listings = parse_listing(&page)?;

        let mut records = Vec::with_capacity(listings.len());
        for listing in listings {
            let mut enrichment = ConcordDetail::default();
            if let Some(url) = &listing.detail_url {
                self.politeness.before_detail().await;
                match http.get_text(self.source_id(), url).await {
                    Ok(detail_page) => enrichment = parse_detail(&detail_page),
                    Err(err) => {
                        warn!(error = %err, url, "concord detail page unavailable, keeping list fields");
                    }
                }
            }
            records.push(build_record(listing, enrichment));
        }
        Ok(records)
    }
}

/// Rows of the bid list container. The status block's third span is the
/// status text, the fourth the closing date.
pub fn parse_listing(page: &str) -> Result<Vec<ConcordListing>, AdapterError> {
    let document = Html::parse_document(page);
    let row_selector = parse_selector("div.listItems div.listItemsRow")?;
    let title_selector = parse_selector("div.bidTitle a[href]")?;
    let span_selector = parse_selector("div.bidStatus span")?;

    let mut listings = Vec::new();
    for row in document.select(&row_selector) {
        let Some(link) = row.select(&title_selector).next() else {
            continue;
        };
        let Some(title) = text_or_none(element_text(&link)) else {
            continue;
        };
        let detail_url = link.value().attr("href").map(|href| absolutize(BASE_URL, href));

        let spans: Vec<String> = row.select(&span_selector).map(|s| element_text(&s)).collect();
        let status = spans.get(2).cloned().and_then(text_or_none);
        let closing_date = spans.get(3).cloned().and_then(text_or_none);

        listings.push(ConcordListing {
            title,
            detail_url,
            status,
            closing_date,
        });
    }
    Ok(listings)
}

/// Labeled rows first (`Publication Date/Time`, anything value-like), then
/// free-text currency patterns over the whole page.
pub fn parse_detail(page: &str) -> ConcordDetail {
    let document = Html::parse_document(page);
    let mut found = ConcordDetail::default();

    if let (Ok(tr_selector), Ok(header_selector), Ok(value_selector)) = (
        parse_selector("tr"),
        parse_selector("span.BidListHeader"),
        parse_selector("span.BidDetail"),
    ) {
        let rows: Vec<_> = document.select(&tr_selector).collect();
        for (index, row) in rows.iter().enumerate() {
            let Some(label) = row.select(&header_selector).next().map(|s| element_text(&s)) else {
                continue;
            };
            let next_value = rows
                .get(index + 1)
                .and_then(|next| next.select(&value_selector).next())
                .map(|s| element_text(&s));

            if label.contains("Publication Date/Time") {
                if found.release_date.is_none() {
                    found.release_date = next_value.clone().and_then(text_or_none);
                }
            } else if found.estimated_value.is_none() {
                let label_lower = label.to_ascii_lowercase();
                if VALUE_LABEL_KEYWORDS.iter().any(|k| label_lower.contains(k)) {
                    found.estimated_value = next_value.as_deref().and_then(numeric_value);
                }
            }
        }
    }

    if found.estimated_value.is_none() {
        found.estimated_value = detail::extract_estimated_value(&document_text(&document))
            .as_deref()
            .and_then(numeric_value);
    }
    found
}

/// Reduce "$1,500,000" or "1500000.00" to a plain integer string.
fn numeric_value(text: &str) -> Option<String> {
    let token = NUMERIC_RE.find(text)?.as_str().replace(',', "");
    let value = token.parse::<f64>().ok()?;
    if value <= 0.0 {
        return None;
    }
    Some(format!("{}", value as i64))
}

fn build_record(listing: ConcordListing, enrichment: ConcordDetail) -> RawRecord {
    RawRecord {
        estimated_value: enrichment.estimated_value,
        release_date: enrichment.release_date,
        due_date: listing.closing_date,
        source_status: listing.status,
        source_url: listing.detail_url.or_else(|| Some(LISTING_URL.to_string())),
        title: listing.title,
        ..RawRecord::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_PAGE: &str = r##"
        <html><body><div class="listItems">
          <div class="listItemsRow">
            <div class="bidTitle"><a href="bids.aspx?bidID=210">Keyes Road Generator Replacement</a></div>
            <div class="bidStatus">
              <span>Status</span><span>:</span><span>Open</span><span>7/31/2025 10:00 AM</span>
            </div>
          </div>
          <div class="listItemsRow">
            <div class="bidTitle"><a href="bids.aspx?bidID=211">Snow Hauling Services</a></div>
            <div class="bidStatus"><span>Status</span><span>:</span><span>Closed</span></div>
          </div>
        </div></body></html>"##;

    #[test]
    fn list_rows_carry_status_and_closing_date_spans() {
        let listings = parse_listing(LISTING_PAGE).unwrap();
        assert_eq!(listings.len(), 2);

        let first = &listings[0];
        assert_eq!(first.title, "Keyes Road Generator Replacement");
        assert_eq!(first.detail_url.as_deref(), Some("https://concordma.gov/bids.aspx?bidID=210"));
        assert_eq!(first.status.as_deref(), Some("Open"));
        assert_eq!(first.closing_date.as_deref(), Some("7/31/2025 10:00 AM"));

        let second = &listings[1];
        assert_eq!(second.status.as_deref(), Some("Closed"));
        assert_eq!(second.closing_date, None);
    }

    #[test]
    fn detail_rows_yield_publication_date_and_value() {
        let page = r##"
            <html><body><table>
              <tr><td><span class="BidListHeader">Publication Date/Time</span></td></tr>
              <tr><td><span class="BidDetail">7/10/2025 8:00 AM</span></td></tr>
              <tr><td><span class="BidListHeader">Estimated Cost</span></td></tr>
              <tr><td><span class="BidDetail">$1,500,000</span></td></tr>
            </table></body></html>"##;
        let detail = parse_detail(page);
        assert_eq!(detail.release_date.as_deref(), Some("7/10/2025 8:00 AM"));
        assert_eq!(detail.estimated_value.as_deref(), Some("1500000"));
    }

    #[test]
    fn free_text_value_patterns_are_the_fallback() {
        let page = r##"<html><body>
            <p>Proposals shall not exceed the project budget.</p>
            <p>The total contract amount is not to exceed $250,000.00 for all phases.</p>
        </body></html>"##;
        let detail = parse_detail(page);
        assert_eq!(detail.estimated_value.as_deref(), Some("250000"));
        assert_eq!(detail.release_date, None);
    }

    #[test]
    fn records_keep_source_status_text() {
        let listings = parse_listing(LISTING_PAGE).unwrap();
        let record = build_record(listings[1].clone(), ConcordDetail::default());
        assert_eq!(record.source_status.as_deref(), Some("Closed"));
        assert_eq!(record.title, "Snow Hauling Services");
    }
}
