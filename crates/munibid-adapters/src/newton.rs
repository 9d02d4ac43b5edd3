//! Newton: current-bids table whose cells carry `data-th` attributes.
//! Only open and pending rows are kept; pending postings are
//! planning-phase and surface as Upcoming downstream.

use async_trait::async_trait;
use munibid_core::{City, RawRecord};
use munibid_storage::HttpFetcher;
use scraper::Html;

use crate::html::{absolutize, element_text, parse_selector, text_or_none};
use crate::{AdapterError, SourceAdapter};

const BASE_URL: &str = "https://www.newtonma.gov";
const LISTING_URL: &str = "https://www.newtonma.gov/government/purchasing/current-bids";

#[derive(Debug, Default)]
pub struct NewtonAdapter;

#[async_trait]
impl SourceAdapter for NewtonAdapter {
    fn source_id(&self) -> &'static str {
        "newton"
    }

    fn city(&self) -> City {
        City::Newton
    }

    fn source_type(&self) -> &'static str {
        "Open Bids"
    }

    async fn scrape(&self, http: &HttpFetcher) -> Result<Vec<RawRecord>, AdapterError> {
        let page = http.get_text(self.source_id(), LISTING_URL).await?;
        parse_listing(&page)
    }
}

pub fn parse_listing(page: &str) -> Result<Vec<RawRecord>, AdapterError> {
    let document = Html::parse_document(page);
    let table_selector = parse_selector("table.listtable")?;
    let row_selector = parse_selector("tr")?;
    let title_selector = parse_selector(r#"td[data-th="Title"]"#)?;
    let start_selector = parse_selector(r#"td[data-th="Starting"]"#)?;
    let closing_selector = parse_selector(r#"td[data-th="Closing"]"#)?;
    let status_selector = parse_selector(r#"td[data-th="Status"]"#)?;
    let link_selector = parse_selector("a[href]")?;

    let Some(table) = document.select(&table_selector).next() else {
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for row in table.select(&row_selector) {
        let (Some(title_cell), Some(start_cell), Some(closing_cell), Some(status_cell)) = (
            row.select(&title_selector).next(),
            row.select(&start_selector).next(),
            row.select(&closing_selector).next(),
            row.select(&status_selector).next(),
        ) else {
            continue;
        };

        let raw_status = element_text(&status_cell);
        // Closed and awarded rows stay on the page for months; only live
        // and planning-phase rows are worth carrying.
        if !raw_status.eq_ignore_ascii_case("open") && !raw_status.eq_ignore_ascii_case("pending") {
            continue;
        }

        let link = title_cell.select(&link_selector).next();
        let title = link
            .map(|a| element_text(&a))
            .and_then(text_or_none)
            .or_else(|| text_or_none(element_text(&title_cell)));
        let Some(title) = title else {
            continue;
        };
        let source_url = link
            .and_then(|a| a.value().attr("href"))
            .map(|href| absolutize(BASE_URL, href));

        records.push(RawRecord {
            title,
            release_date: text_or_none(element_text(&start_cell)),
            due_date: text_or_none(element_text(&closing_cell)),
            source_status: text_or_none(raw_status),
            source_url,
            ..RawRecord::default()
        });
    }
    Ok(records)
}
