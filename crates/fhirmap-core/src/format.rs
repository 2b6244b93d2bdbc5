//! Cell formatting shared by the row projectors.

use chrono::{DateTime, FixedOffset, NaiveDate};

const DATE_FORMAT: &str = "%m/%d/%Y";
const DATE_TIME_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// `MM/DD/YYYY`, or an empty cell.
pub fn date(value: Option<NaiveDate>) -> String {
    value
        .map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// `MM/DD/YYYY hh:mm:ss AM`, in the value's own offset, or an empty cell.
pub fn date_time(value: Option<DateTime<FixedOffset>>) -> String {
    value
        .map(|value| value.format(DATE_TIME_FORMAT).to_string())
        .unwrap_or_default()
}

/// The trimmed value, or `default` when it is absent or blank.
pub fn or_default<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => default,
    }
}

/// The trimmed value, or an empty cell.
pub fn or_blank(value: Option<&str>) -> &str {
    or_default(value, "")
}
