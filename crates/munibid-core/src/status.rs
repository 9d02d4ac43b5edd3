//! Status engine: buckets every record into exactly one of
//! {Open, Upcoming, Closed}.

use chrono::NaiveDateTime;

use crate::dates;
use crate::Status;

/// Map a source-published status string onto the canonical enum. Returns
/// `None` when the text is absent or unrecognized, in which case the due
/// date decides.
pub fn bucket_source_status(text: &str) -> Option<Status> {
    let lower = text.trim().to_ascii_lowercase();
    if lower.is_empty() {
        return None;
    }
    if lower.contains("pending") || lower.contains("upcoming") || lower.contains("planning") {
        return Some(Status::Upcoming);
    }
    if lower.contains("closed") || lower.contains("awarded") || lower.contains("expired") {
        return Some(Status::Closed);
    }
    if lower.contains("open") || lower.contains("active") {
        return Some(Status::Open);
    }
    None
}

/// Resolve the status of one record.
///
/// An explicit source status wins outright; a pending/planning marker maps
/// to Upcoming no matter what the due date parses to. Without one, a
/// parseable due date in the past means Closed and anything else means
/// Open, except that a missing due date falls back to the adapter's
/// `missing_due` policy (Somerville treats those rows as Upcoming, every
/// other source as still-collectible Open).
pub fn resolve(
    source_status: Option<&str>,
    due_text: Option<&str>,
    missing_due: Status,
    now: NaiveDateTime,
) -> Status {
    if let Some(bucketed) = source_status.and_then(bucket_source_status) {
        return bucketed;
    }
    let due_text = match due_text {
        Some(text) if !text.trim().is_empty() => text,
        _ => return missing_due,
    };
    match dates::due_moment(due_text) {
        Some(due) if due < now => Status::Closed,
        Some(_) => Status::Open,
        None => Status::Open,
    }
}
