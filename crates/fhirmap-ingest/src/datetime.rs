//! FHIR `date` and `dateTime` parsing.
//!
//! Values keep the offset they were written with; nothing is converted to
//! the host time zone.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

/// Parses a FHIR `date`: `YYYY-MM-DD`, or the partial forms `YYYY-MM` and
/// `YYYY`, which resolve to the first day of the month or year.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    let (year, month) = match trimmed.split_once('-') {
        Some((year, month)) => (year, Some(month)),
        None => (trimmed, None),
    };
    let year = digits(year, 4)?;
    let month = match month {
        Some(month) => digits(month, 2)?,
        None => 1,
    };
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, 1)
}

fn digits(text: &str, width: usize) -> Option<u32> {
    if text.len() != width || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Parses a FHIR `dateTime`.
///
/// Accepts RFC 3339 timestamps, local timestamps without an offset, and
/// full or partial dates (midnight). Values without an offset are taken as
/// UTC.
pub fn parse_date_time(raw: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(value);
    }
    let utc = FixedOffset::east_opt(0)?;
    let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| parse_date(trimmed).map(|date| date.and_time(NaiveTime::MIN)))?;
    utc.from_local_datetime(&naive).single()
}
