use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::model::config::DateFormat;

/// Remote timestamp layout: RFC 3339, UTC, millisecond precision
const REMOTE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Convert a remote timestamp to the document's date format. Midnight UTC
/// renders as a bare date.
pub fn remote_to_display(remote: &str, format: DateFormat) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(remote.trim()).ok()?;
    let utc = parsed.with_timezone(&Utc);
    let pattern = if utc.time() == NaiveTime::MIN {
        format.date_pattern()
    } else {
        format.datetime_pattern()
    };
    Some(utc.format(pattern).to_string())
}

/// Convert a date written in the document (date, or date and `HH:MM`) to a
/// remote timestamp
pub fn display_to_remote(display: &str, format: DateFormat) -> Option<String> {
    let display = display.trim();
    let naive = NaiveDateTime::parse_from_str(display, format.datetime_pattern())
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(display, format.date_pattern())
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })?;
    Some(naive.and_utc().format(REMOTE_FORMAT).to_string())
}
