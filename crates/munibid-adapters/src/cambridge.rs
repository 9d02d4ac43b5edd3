//! Cambridge: the city lists solicitations on an OpenGov procurement
//! portal whose JSON API serves the same data the JS front end renders.

use async_trait::async_trait;
use munibid_core::{City, RawRecord};
use munibid_storage::HttpFetcher;
use serde::Deserialize;

use crate::html::absolutize;
use crate::{AdapterError, SourceAdapter};

const PORTAL_BASE: &str = "https://procurement.opengov.com";
const API_URL: &str =
    "https://procurement.opengov.com/api/procurements?portal_slug=cambridgema&sort_by=closing_date&status=open";

// The portal returns an empty body to clients that do not look like the
// front end, so the request carries its headers.
const BROWSER_HEADERS: [(&str, &str); 3] = [
    (
        "User-Agent",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/113.0.0.0 Safari/537.36",
    ),
    ("Accept", "application/json, text/plain, */*"),
    ("Referer", "https://procurement.opengov.com/portal/cambridgema"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct ProcurementsResponse {
    #[serde(default)]
    pub data: Vec<ProcurementItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcurementItem {
    #[serde(default)]
    pub attributes: ProcurementAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcurementAttributes {
    pub title: Option<String>,
    pub department: Option<String>,
    pub closing_date: Option<String>,
    pub public_url: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default)]
pub struct CambridgeAdapter;

#[async_trait]
impl SourceAdapter for CambridgeAdapter {
    fn source_id(&self) -> &'static str {
        "cambridge"
    }

    fn city(&self) -> City {
        City::Cambridge
    }

    fn source_type(&self) -> &'static str {
        "Open Bids"
    }

    async fn scrape(&self, http: &HttpFetcher) -> Result<Vec<RawRecord>, AdapterError> {
        let response: ProcurementsResponse = http
            .get_json(self.source_id(), API_URL, &BROWSER_HEADERS)
            .await?;
        Ok(records_from_response(response))
    }
}

pub fn records_from_response(response: ProcurementsResponse) -> Vec<RawRecord> {
    let mut records = Vec::new();
    for item in response.data {
        let attributes = item.attributes;
        let Some(title) = attributes.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
        else {
            continue;
        };
        records.push(RawRecord {
            title,
            department: attributes.department,
            due_date: attributes.closing_date,
            source_status: attributes.status,
            source_url: attributes.public_url.map(|p| absolutize(PORTAL_BASE, &p)),
            ..RawRecord::default()
        });
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    const API_FIXTURE: &str = r#"{
        "data": [
            {
                "attributes": {
                    "title": "Citywide Elevator Maintenance",
                    "department": "Public Works",
                    "closing_date": "2025-07-09T14:00:00-04:00",
                    "public_url": "/portal/cambridgema/projects/123",
                    "status": "open"
                }
            },
            {
                "attributes": {
                    "title": "   ",
                    "closing_date": null
                }
            },
            {
                "attributes": {
                    "title": "Water Meter Replacement Program"
                }
            }
        ]
    }"#;

    #[test]
    fn api_rows_map_onto_raw_records() {
        let response: ProcurementsResponse = serde_json::from_str(API_FIXTURE).unwrap();
        let records = records_from_response(response);
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.title, "Citywide Elevator Maintenance");
        assert_eq!(first.department.as_deref(), Some("Public Works"));
        assert_eq!(first.due_date.as_deref(), Some("2025-07-09T14:00:00-04:00"));
        assert_eq!(first.source_status.as_deref(), Some("open"));
        assert_eq!(
            first.source_url.as_deref(),
            Some("https://procurement.opengov.com/portal/cambridgema/projects/123")
        );

        let second = &records[1];
        assert_eq!(second.title, "Water Meter Replacement Program");
        assert_eq!(second.due_date, None);
        assert_eq!(second.source_status, None);
    }

    #[test]
    fn empty_payload_means_an_empty_table() {
        let response: ProcurementsResponse = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(records_from_response(response).is_empty());
        let missing: ProcurementsResponse = serde_json::from_str("{}").unwrap();
        assert!(records_from_response(missing).is_empty());
    }
}
