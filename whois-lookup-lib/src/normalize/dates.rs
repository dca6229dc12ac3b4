//! Lenient date parsing for upstream date strings.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Date-time layouts without an offset; interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y.%m.%d %H:%M:%S",
];

/// Date-time layouts carrying an offset or zone name.
const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%z"];

/// Plain date layouts.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d", "%d-%b-%Y", "%d.%m.%Y"];

/// Parse an upstream date into a UTC calendar date.
///
/// Returns `None` for blank or unrecognised input rather than failing.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    // Some registries append a zone name after the offset, e.g. "+0000 (UTC)"
    let without_zone_name = raw.split(" (").next().unwrap_or(raw);
    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(without_zone_name, fmt) {
            return Some(dt.with_timezone(&Utc).date_naive());
        }
    }

    let without_suffix = raw.trim_end_matches(" UTC").trim_end_matches('Z');
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(without_suffix, fmt) {
            return Some(dt.date());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}
