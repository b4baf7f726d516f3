//! Timestamp normalisation and calendar bucketing.
//!
//! Every timestamp in the pipeline is timezone-naive: offsets found in the
//! source are dropped and the wall-clock time is kept.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};

/// Date-time layouts tried in order after RFC 3339.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Date-only layouts; the reading is placed at midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Layout used whenever a timestamp is written back out.
pub const OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a source timestamp cell into a naive date-time.
///
/// Returns `None` for empty or unrecognised input.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Render a timestamp the way every exported artifact shows it.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(OUTPUT_FORMAT).to_string()
}

/// The Sunday that closes the Monday–Sunday week containing `date`.
///
/// A Sunday is its own week end. Returns `None` when that Sunday lies past
/// the last representable date.
pub fn week_ending(date: NaiveDate) -> Option<NaiveDate> {
    let days_left = 6 - i64::from(date.weekday().num_days_from_monday());
    date.checked_add_signed(Duration::days(days_left))
}
