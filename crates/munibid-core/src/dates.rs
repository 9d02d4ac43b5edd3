//! Date standardization: heterogeneous source text in, one of three
//! canonical display forms out, with the raw text always preserved by the
//! caller. Both the format ladder and the extraction regexes are ordered
//! tables; order is part of the contract.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

/// What the standardizer recognized in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// Input was empty or whitespace.
    Absent,
    /// Full date plus time of day.
    DateTime,
    /// Calendar date, no time.
    DateOnly,
    /// Planning-phase "<Month> <Year>" granularity, passed through.
    MonthYear,
    /// "TBD" / "<Year> TBD" marker, passed through.
    Tbd,
    /// Nothing matched; original text passed through for manual review.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandardizedDate {
    pub display: Option<String>,
    pub style: DateStyle,
}

impl StandardizedDate {
    pub fn needs_review(&self) -> bool {
        self.style == DateStyle::Unrecognized
    }
}

/// Exact datetime formats, tried in order before anything else.
const DATETIME_FORMATS: [&str; 10] = [
    "%a, %m/%d/%Y - %I:%M%p",
    "%A, %m/%d/%Y - %I:%M%p",
    "%m/%d/%Y - %I:%M%p",
    "%m/%d/%Y - %I:%M %p",
    "%m/%d/%Y %I:%M %p",
    "%B %d, %Y %I:%M %p",
    "%B %d, %Y at %I:%M%p",
    "%B %d, %Y at %I:%M %p",
    "%Y-%m-%d %I:%M %p",
    "%Y-%m-%dT%H:%M:%S",
];

/// Exact date-only formats, tried after the datetime ladder.
const DATE_FORMATS: [&str; 5] = ["%m/%d/%Y", "%m-%d-%Y", "%B %d, %Y", "%b %d, %Y", "%Y-%m-%d"];

static TBD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:\d{4}\s+)?(?:tbd|to be determined)$").unwrap());

static MONTH_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{4}$").unwrap()
});

// Extraction patterns for dates embedded in messier text, tried in order
// after the exact formats fail. The time-bearing slash pattern runs before
// the bare one so a trailing time is never dropped.
static WEEKDAY_SLASH_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?,?\s+(\d{1,2})/(\d{1,2})/(\d{4})\s*-\s*(\d{1,2}):(\d{2})\s*([ap])\.?m\.?").unwrap()
});

static SLASH_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})\s*(?:-|at)?\s*(\d{1,2}):(\d{2})\s*(?i)([ap])\.?m\.?")
        .unwrap()
});

static SLASH_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})").unwrap());

static MONTH_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(january|february|march|april|may|june|july|august|september|october|november|december)\s+(\d{1,2}),\s*(\d{4})(?:\s+(?:at\s+)?(\d{1,2}):(\d{2})\s*([ap])\.?m\.?)?").unwrap()
});

/// Standardize arbitrary date text. Never fails: unrecognized input comes
/// back unchanged with [`DateStyle::Unrecognized`] so the caller can flag
/// it for review instead of dropping the record.
pub fn standardize(raw: &str) -> StandardizedDate {
    let text = collapse_whitespace(raw);
    if text.is_empty() {
        return StandardizedDate {
            display: None,
            style: DateStyle::Absent,
        };
    }
    if TBD_RE.is_match(&text) {
        return StandardizedDate {
            display: Some(text),
            style: DateStyle::Tbd,
        };
    }
    if MONTH_YEAR_RE.is_match(&text) {
        return StandardizedDate {
            display: Some(text),
            style: DateStyle::MonthYear,
        };
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&text) {
        return datetime_display(dt.naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&text, format) {
            return datetime_display(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&text, format) {
            return date_display(date);
        }
    }

    if let Some(found) = extract_embedded(&text) {
        return found;
    }

    StandardizedDate {
        display: Some(text),
        style: DateStyle::Unrecognized,
    }
}

/// Re-parse a standardized or raw due string into a comparison moment for
/// the status engine. Date-only values compare at midnight. Month-year,
/// TBD and unrecognized text have no moment.
pub fn due_moment(text: &str) -> Option<NaiveDateTime> {
    let text = collapse_whitespace(text);
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %I:%M %p") {
        return Some(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN));
    }
    let standardized = standardize(&text);
    match standardized.style {
        DateStyle::DateTime => {
            NaiveDateTime::parse_from_str(standardized.display.as_deref()?, "%Y-%m-%d %I:%M %p").ok()
        }
        DateStyle::DateOnly => NaiveDate::parse_from_str(standardized.display.as_deref()?, "%Y-%m-%d")
            .ok()
            .map(|d| d.and_time(NaiveTime::MIN)),
        _ => None,
    }
}

fn extract_embedded(text: &str) -> Option<StandardizedDate> {
    if let Some(dt) = WEEKDAY_SLASH_TIME_RE.captures(text).and_then(|c| slash_datetime(&c)) {
        return Some(datetime_display(dt));
    }
    if let Some(dt) = SLASH_TIME_RE.captures(text).and_then(|c| slash_datetime(&c)) {
        return Some(datetime_display(dt));
    }
    if let Some(date) = SLASH_DATE_RE
        .captures(text)
        .and_then(|c| ymd(&c[3], &c[1], &c[2]))
    {
        return Some(date_display(date));
    }
    if let Some(caps) = MONTH_NAME_RE.captures(text) {
        let date = month_number(&caps[1]).and_then(|month| {
            NaiveDate::from_ymd_opt(caps[3].parse().ok()?, month, caps[2].parse().ok()?)
        });
        if let Some(date) = date {
            if caps.get(4).is_some() {
                if let Some(time) = clock_time(&caps[4], &caps[5], &caps[6]) {
                    return Some(datetime_display(date.and_time(time)));
                }
            }
            return Some(date_display(date));
        }
    }
    None
}

fn slash_datetime(caps: &regex::Captures<'_>) -> Option<NaiveDateTime> {
    let date = ymd(&caps[3], &caps[1], &caps[2])?;
    let time = clock_time(&caps[4], &caps[5], &caps[6])?;
    Some(date.and_time(time))
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn clock_time(hour: &str, minute: &str, meridiem: &str) -> Option<NaiveTime> {
    let hour: u32 = hour.parse().ok()?;
    if hour == 0 || hour > 12 {
        return None;
    }
    let pm = meridiem.eq_ignore_ascii_case("p");
    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };
    NaiveTime::from_hms_opt(hour, minute.parse().ok()?, 0)
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];
    let lower = name.to_ascii_lowercase();
    MONTHS.iter().position(|m| *m == lower).map(|i| i as u32 + 1)
}

/// English month name for a 1-based month number. Used when a source
/// splits planning rows into numeric month/year columns.
pub fn month_name(month: u32) -> Option<&'static str> {
    const MONTHS: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    MONTHS.get(month.checked_sub(1)? as usize).copied()
}

fn datetime_display(dt: NaiveDateTime) -> StandardizedDate {
    StandardizedDate {
        display: Some(dt.format("%Y-%m-%d %I:%M %p").to_string()),
        style: DateStyle::DateTime,
    }
}

fn date_display(date: NaiveDate) -> StandardizedDate {
    StandardizedDate {
        display: Some(date.format("%Y-%m-%d").to_string()),
        style: DateStyle::DateOnly,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display_of(raw: &str) -> Option<String> {
        standardize(raw).display
    }

    #[test]
    fn weekday_prefixed_slash_datetime() {
        let result = standardize("Wed, 07/09/2025 - 12:00pm");
        assert_eq!(result.display.as_deref(), Some("2025-07-09 12:00 PM"));
        assert_eq!(result.style, DateStyle::DateTime);
    }

    #[test]
    fn slash_datetime_with_padded_meridiem() {
        assert_eq!(
            display_of("07/15/2025 - 04:00 PM").as_deref(),
            Some("2025-07-15 04:00 PM")
        );
    }

    #[test]
    fn month_name_with_time() {
        assert_eq!(
            display_of("August 07, 2025 11:00 AM").as_deref(),
            Some("2025-08-07 11:00 AM")
        );
    }

    #[test]
    fn month_name_date_only() {
        let result = standardize("July 23, 2025");
        assert_eq!(result.display.as_deref(), Some("2025-07-23"));
        assert_eq!(result.style, DateStyle::DateOnly);
    }

    #[test]
    fn bare_slash_date() {
        assert_eq!(display_of("12/15/2024").as_deref(), Some("2024-12-15"));
    }

    #[test]
    fn embedded_date_in_prose() {
        let result = standardize("Due on or about July 7, 2025 per addendum");
        assert_eq!(result.display.as_deref(), Some("2025-07-07"));
    }

    #[test]
    fn month_year_passes_through_unchanged() {
        let result = standardize("August 2025");
        assert_eq!(result.display.as_deref(), Some("August 2025"));
        assert_eq!(result.style, DateStyle::MonthYear);
    }

    #[test]
    fn tbd_markers_pass_through() {
        assert_eq!(standardize("TBD").style, DateStyle::Tbd);
        let with_year = standardize("2026 TBD");
        assert_eq!(with_year.style, DateStyle::Tbd);
        assert_eq!(with_year.display.as_deref(), Some("2026 TBD"));
    }

    #[test]
    fn unrecognized_text_returned_verbatim_and_flagged() {
        let result = standardize("see purchasing office");
        assert_eq!(result.display.as_deref(), Some("see purchasing office"));
        assert!(result.needs_review());
    }

    #[test]
    fn empty_input_is_absent_not_reviewed() {
        let result = standardize("   ");
        assert_eq!(result.display, None);
        assert_eq!(result.style, DateStyle::Absent);
        assert!(!result.needs_review());
    }

    #[test]
    fn canonical_forms_are_stable_under_restandardization() {
        let once = standardize("Wed, 07/09/2025 - 12:00pm");
        let twice = standardize(once.display.as_deref().unwrap());
        assert_eq!(once.display, twice.display);
    }

    #[test]
    fn rfc3339_api_timestamps_are_recognized() {
        let result = standardize("2025-07-09T14:00:00-04:00");
        assert_eq!(result.display.as_deref(), Some("2025-07-09 02:00 PM"));
    }

    #[test]
    fn due_moment_honors_time_component() {
        let moment = due_moment("2025-07-09 12:00 PM").unwrap();
        assert_eq!(moment.format("%H:%M").to_string(), "12:00");
        let midnight = due_moment("2025-07-09").unwrap();
        assert_eq!(midnight.format("%H:%M").to_string(), "00:00");
    }

    #[test]
    fn due_moment_parses_raw_source_text() {
        assert!(due_moment("July 23, 2025").is_some());
        assert!(due_moment("TBD").is_none());
        assert!(due_moment("").is_none());
    }

    #[test]
    fn twelve_am_is_midnight() {
        assert_eq!(
            display_of("07/09/2025 - 12:30am").as_deref(),
            Some("2025-07-09 12:30 AM")
        );
        let moment = due_moment("2025-07-09 12:30 AM").unwrap();
        assert_eq!(moment.format("%H:%M").to_string(), "00:30");
    }

    #[test]
    fn month_name_lookup_round_trips() {
        assert_eq!(month_name(8), Some("August"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }
}
