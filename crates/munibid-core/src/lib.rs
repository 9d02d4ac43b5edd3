//! Canonical data model and normalization rules for municipal bid postings.

pub mod dates;
pub mod industry;
pub mod status;
pub mod title;

use serde::{Deserialize, Serialize};
use std::fmt;

pub const CRATE_NAME: &str = "munibid-core";

/// Column names of the persisted canonical table, in order. Case- and
/// punctuation-exact; the read side queries these names verbatim.
pub const CANONICAL_COLUMNS: [&str; 19] = [
    "Title",
    "Department",
    "Industry",
    "Estimated Value",
    "Release Date_Raw",
    "Release Date_Display",
    "Due Date_Raw",
    "Due Date_Display",
    "Instructions",
    "Bid Deposit",
    "Addendum",
    "Comments",
    "Standard_Forms",
    "Bid_Forms",
    "City",
    "Source Type",
    "Source URL",
    "Bid Number",
    "Status",
];

/// Covered municipalities. Each adapter hard-codes exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum City {
    Somerville,
    Cambridge,
    Quincy,
    Boston,
    Worcester,
    Concord,
    Newton,
}

impl City {
    pub fn as_str(&self) -> &'static str {
        match self {
            City::Somerville => "Somerville",
            City::Cambridge => "Cambridge",
            City::Quincy => "Quincy",
            City::Boston => "Boston",
            City::Worcester => "Worcester",
            City::Concord => "Concord",
            City::Newton => "Newton",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle bucket of a posting. No other value ever reaches the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Open,
    Upcoming,
    Closed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "Open",
            Status::Upcoming => "Upcoming",
            Status::Closed => "Closed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One posting as an adapter extracted it, before normalization. Absent
/// fields stay `None`; the pipeline fills defaults. Mapping a source's
/// columns onto this shape at construction time is the field-normalization
/// step, so no renaming pass exists downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub title: String,
    pub department: Option<String>,
    pub industry: Option<String>,
    pub estimated_value: Option<String>,
    /// Raw source text for the release date, verbatim.
    pub release_date: Option<String>,
    /// Raw source text for the due date, verbatim.
    pub due_date: Option<String>,
    pub instructions: Option<String>,
    pub bid_deposit: Option<String>,
    pub addendum: Option<String>,
    pub comments: Option<String>,
    pub standard_forms: Option<String>,
    pub bid_forms: Option<String>,
    pub source_url: Option<String>,
    pub bid_number: Option<String>,
    /// Status text as the source published it, when the source has one.
    pub source_status: Option<String>,
    /// Per-row override of the adapter's default source type.
    pub source_type: Option<String>,
}

/// One posting in canonical form, ready for the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidRecord {
    pub title: String,
    pub department: Option<String>,
    pub industry: String,
    pub estimated_value: Option<String>,
    pub release_date_raw: Option<String>,
    pub release_date_display: Option<String>,
    pub due_date_raw: Option<String>,
    pub due_date_display: Option<String>,
    pub instructions: Option<String>,
    pub bid_deposit: Option<String>,
    pub addendum: Option<String>,
    pub comments: Option<String>,
    pub standard_forms: Option<String>,
    pub bid_forms: Option<String>,
    pub city: City,
    pub source_type: String,
    pub source_url: Option<String>,
    pub bid_number: Option<String>,
    pub status: Status,
}

impl BidRecord {
    /// Values aligned with [`CANONICAL_COLUMNS`], for sinks that write the
    /// table positionally (the CSV mirror).
    pub fn column_values(&self) -> Vec<Option<String>> {
        vec![
            Some(self.title.clone()),
            self.department.clone(),
            Some(self.industry.clone()),
            self.estimated_value.clone(),
            self.release_date_raw.clone(),
            self.release_date_display.clone(),
            self.due_date_raw.clone(),
            self.due_date_display.clone(),
            self.instructions.clone(),
            self.bid_deposit.clone(),
            self.addendum.clone(),
            self.comments.clone(),
            self.standard_forms.clone(),
            self.bid_forms.clone(),
            Some(self.city.to_string()),
            Some(self.source_type.clone()),
            self.source_url.clone(),
            self.bid_number.clone(),
            Some(self.status.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_values_line_up_with_canonical_columns() {
        let record = BidRecord {
            title: "Water Treatment Chemicals".into(),
            department: None,
            industry: "Other".into(),
            estimated_value: None,
            release_date_raw: None,
            release_date_display: None,
            due_date_raw: None,
            due_date_display: None,
            instructions: None,
            bid_deposit: None,
            addendum: None,
            comments: None,
            standard_forms: None,
            bid_forms: None,
            city: City::Quincy,
            source_type: "Current Bids".into(),
            source_url: None,
            bid_number: None,
            status: Status::Open,
        };
        let values = record.column_values();
        assert_eq!(values.len(), CANONICAL_COLUMNS.len());
        assert_eq!(values[0].as_deref(), Some("Water Treatment Chemicals"));
        assert_eq!(values[14].as_deref(), Some("Quincy"));
        assert_eq!(values[18].as_deref(), Some("Open"));
    }

    #[test]
    fn status_and_city_render_their_canonical_names() {
        assert_eq!(Status::Upcoming.to_string(), "Upcoming");
        assert_eq!(City::Somerville.to_string(), "Somerville");
    }
}
