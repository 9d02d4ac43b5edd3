//! Somerville: procurement listing table on the finance department page,
//! plus a linked planning spreadsheet of upcoming solicitations.

use async_trait::async_trait;
use calamine::{Data, Reader, Xlsx};
use munibid_core::{dates, City, RawRecord, Status};
use munibid_storage::HttpFetcher;
use scraper::Html;
use tracing::warn;

use crate::html::{absolutize, element_text, parse_selector, text_or_none};
use crate::{AdapterError, SourceAdapter};

const BASE_URL: &str = "https://www.somervillema.gov";
const LISTING_URL: &str =
    "https://www.somervillema.gov/departments/finance/procurement-and-contracting-services";

/// Rows of boilerplate above the planning spreadsheet's header row.
const SPREADSHEET_HEADER_SKIP: usize = 8;

#[derive(Debug, Default)]
pub struct SomervilleAdapter;

#[async_trait]
impl SourceAdapter for SomervilleAdapter {
    fn source_id(&self) -> &'static str {
        "somerville"
    }

    fn city(&self) -> City {
        City::Somerville
    }

    fn source_type(&self) -> &'static str {
        "Open Bids"
    }

    // Somerville publishes planning-phase rows without deadlines; an
    // empty due date there means "not yet determined", not "no deadline".
    fn missing_due_status(&self) -> Status {
        Status::Upcoming
    }

    async fn scrape(&self, http: &HttpFetcher) -> Result<Vec<RawRecord>, AdapterError> {
        let page = http.get_text(self.source_id(), LISTING_URL).await?;
        let mut records = parse_listing_table(&page)?;

        match find_spreadsheet_url(&page)? {
            Some(url) => match http.get_bytes(self.source_id(), &url).await {
                Ok(bytes) => match parse_planning_spreadsheet(&bytes) {
                    Ok(mut upcoming) => records.append(&mut upcoming),
                    Err(err) => {
                        warn!(error = %err, "somerville planning spreadsheet unreadable, keeping web rows only");
                    }
                },
                Err(err) => {
                    warn!(error = %err, url, "somerville planning spreadsheet fetch failed, keeping web rows only");
                }
            },
            None => warn!("somerville page has no planning spreadsheet link"),
        }

        Ok(records)
    }
}

/// Extract the on-page open-bids table. Columns are located by header
/// name; the sortable-column suffix the CMS appends is stripped first.
pub fn parse_listing_table(page: &str) -> Result<Vec<RawRecord>, AdapterError> {
    let document = Html::parse_document(page);
    let table_selector = parse_selector("table")?;
    let th_selector = parse_selector("th")?;
    let tr_selector = parse_selector("tr")?;
    let td_selector = parse_selector("td")?;
    let link_selector = parse_selector("a[href]")?;

    let Some(table) = document.select(&table_selector).next() else {
        return Ok(Vec::new());
    };

    let headers: Vec<String> = table
        .select(&th_selector)
        .map(|th| element_text(&th).replace("Sort ascending", "").trim().to_string())
        .collect();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let title_col = column("Title");
    let release_col = column("Release Date");
    let due_col = column("Opening Date");
    let instructions_col = column("Instructions");
    let deposit_col = column("Bid Deposit");
    let addendum_col = column("Addendum");
    let notice_col = column("Bid Notice");

    let mut records = Vec::new();
    for row in table.select(&tr_selector) {
        let cells: Vec<_> = row.select(&td_selector).collect();
        if cells.is_empty() {
            continue;
        }
        let cell_text = |idx: Option<usize>| {
            idx.and_then(|i| cells.get(i)).and_then(|c| text_or_none(element_text(c)))
        };
        let Some(title) = cell_text(title_col) else {
            continue;
        };

        let source_url = notice_col
            .and_then(|i| cells.get(i))
            .and_then(|cell| {
                cell.select(&link_selector)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(|href| absolutize(BASE_URL, href))
            })
            .or_else(|| cell_text(notice_col));

        records.push(RawRecord {
            title,
            release_date: cell_text(release_col),
            due_date: cell_text(due_col),
            instructions: cell_text(instructions_col),
            bid_deposit: cell_text(deposit_col),
            addendum: cell_text(addendum_col),
            source_url,
            ..RawRecord::default()
        });
    }
    Ok(records)
}

/// First `.xlsx` link on the page, absolutized.
pub fn find_spreadsheet_url(page: &str) -> Result<Option<String>, AdapterError> {
    let document = Html::parse_document(page);
    let link_selector = parse_selector("a[href]")?;
    Ok(document
        .select(&link_selector)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.contains(".xlsx"))
        .map(|href| absolutize(BASE_URL, href)))
}

/// Parse the downloaded planning spreadsheet. The sheet fronts its data
/// with decorative rows, so the header is found at a known skip offset.
pub fn parse_planning_spreadsheet(bytes: &[u8]) -> Result<Vec<RawRecord>, AdapterError> {
    let cursor = std::io::Cursor::new(bytes.to_vec());
    let mut workbook: Xlsx<_> = Xlsx::new(cursor)
        .map_err(|e| AdapterError::Message(format!("opening planning spreadsheet: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AdapterError::Message("planning spreadsheet has no sheets".into()))?
        .map_err(|e| AdapterError::Message(format!("reading planning sheet: {e}")))?;

    let mut rows = range.rows().skip(SPREADSHEET_HEADER_SKIP);
    let header = rows
        .next()
        .ok_or_else(|| AdapterError::Message("planning sheet ends before its header row".into()))?;
    let column = |name: &str| {
        header
            .iter()
            .position(|cell| cell_text(cell).is_some_and(|t| t.eq_ignore_ascii_case(name)))
    };

    let title_col = column("DESCRIPTION OF PURCHASE")
        .ok_or_else(|| AdapterError::Message("planning sheet has no purchase column".into()))?;
    let department_col = column("DEPARTMENT");
    let industry_col = column("INDUSTRY TYPE");
    let value_col = column("ESTIMATED TOTAL VALUE");
    let month_col = column("MONTH");
    let year_col = column("YEAR");

    let mut records = Vec::new();
    for row in rows {
        let at = |idx: Option<usize>| idx.and_then(|i| row.get(i)).and_then(cell_text);
        let Some(title) = at(Some(title_col)) else {
            continue;
        };
        records.push(RawRecord {
            title,
            department: at(department_col),
            industry: at(industry_col),
            estimated_value: at(value_col),
            release_date: planning_release_date(at(month_col), at(year_col)),
            source_url: Some(LISTING_URL.to_string()),
            source_type: Some("Upcoming Bids".to_string()),
            ..RawRecord::default()
        });
    }
    Ok(records)
}

/// Render the sheet's split month/year columns as the planning-phase
/// "<Month> <Year>" form the date standardizer passes through.
fn planning_release_date(month: Option<String>, year: Option<String>) -> Option<String> {
    let month = month?;
    let year = year?;
    let month_name = month
        .parse::<u32>()
        .ok()
        .and_then(dates::month_name)
        .map(str::to_string)
        .unwrap_or(month);
    Some(format!("{month_name} {year}"))
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => text_or_none(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        Data::Float(f) => Some(f.to_string()),
        other => text_or_none(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_PAGE: &str = r##"
        <html><body>
        <a href="/sites/default/files/upcoming-bids.xlsx">Upcoming Bids Schedule</a>
        <table>
          <tr>
            <th>Title Sort ascending</th><th>Release Date</th><th>Opening Date</th>
            <th>Instructions</th><th>Bid Deposit</th><th>Addendum</th><th>Bid Notice</th>
          </tr>
          <tr>
            <td>IFB# 25-69 Sidewalk Repairs</td>
            <td>06/20/2025</td>
            <td>Wed, 07/09/2025 - 12:00pm</td>
            <td>Submit electronically</td>
            <td>5%</td>
            <td>Addendum 1 posted</td>
            <td><a href="/notices/25-69.pdf">Notice</a></td>
          </tr>
          <tr>
            <td>RFP # 26-02 Water &amp; Sewer Director Search</td>
            <td>07/01/2025</td>
            <td></td>
            <td></td><td></td><td></td>
            <td></td>
          </tr>
        </table>
        </body></html>"##;

    #[test]
    fn listing_table_maps_columns_onto_raw_records() {
        let records = parse_listing_table(LISTING_PAGE).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.title, "IFB# 25-69 Sidewalk Repairs");
        assert_eq!(first.release_date.as_deref(), Some("06/20/2025"));
        assert_eq!(first.due_date.as_deref(), Some("Wed, 07/09/2025 - 12:00pm"));
        assert_eq!(first.instructions.as_deref(), Some("Submit electronically"));
        assert_eq!(first.bid_deposit.as_deref(), Some("5%"));
        assert_eq!(
            first.source_url.as_deref(),
            Some("https://www.somervillema.gov/notices/25-69.pdf")
        );

        let second = &records[1];
        assert_eq!(second.title, "RFP # 26-02 Water & Sewer Director Search");
        assert_eq!(second.due_date, None);
        assert_eq!(second.source_url, None);
    }

    #[test]
    fn spreadsheet_link_is_found_and_absolutized() {
        let url = find_spreadsheet_url(LISTING_PAGE).unwrap().unwrap();
        assert_eq!(url, "https://www.somervillema.gov/sites/default/files/upcoming-bids.xlsx");
        assert_eq!(find_spreadsheet_url("<html></html>").unwrap(), None);
    }

    #[test]
    fn planning_release_date_prefers_month_names() {
        assert_eq!(
            planning_release_date(Some("8".into()), Some("2025".into())).as_deref(),
            Some("August 2025")
        );
        assert_eq!(
            planning_release_date(Some("August".into()), Some("2025".into())).as_deref(),
            Some("August 2025")
        );
        assert_eq!(planning_release_date(None, Some("2025".into())), None);
    }

    #[test]
    fn garbage_bytes_are_a_recoverable_spreadsheet_error() {
        assert!(parse_planning_spreadsheet(b"not a workbook").is_err());
    }

    #[test]
    fn pages_without_a_table_yield_an_empty_set() {
        assert!(parse_listing_table("<html><body>maintenance</body></html>")
            .unwrap()
            .is_empty());
    }
}
