use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::types::RawTime;

const ISO_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Normalize a raw time value to a calendar date.
///
/// Returns `None` when the value cannot be interpreted; callers drop such records.
pub fn normalize_date(raw: &RawTime) -> Option<NaiveDate> {
    match raw {
        RawTime::Date(date) => Some(*date),
        RawTime::DateTime(dt) => Some(dt.date()),
        RawTime::Text(text) => parse_date_text(text),
    }
}

/// Parse a date string: strict ISO forms first, then `MM/DD/YYYY` style.
///
/// # Example
/// ```
/// use arps_dca::dates::parse_date_text;
/// use chrono::NaiveDate;
/// let expected = NaiveDate::from_ymd_opt(2022, 3, 7);
/// assert_eq!(parse_date_text("2022-03-07"), expected);
/// assert_eq!(parse_date_text("03/07/2022"), expected);
/// assert_eq!(parse_date_text("3-7-22"), expected);
/// assert_eq!(parse_date_text("not a date"), None);
/// ```
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    parse_iso(text).or_else(|| parse_month_first(text))
}

fn parse_iso(text: &str) -> Option<NaiveDate> {
    // Require a four-digit year up front so "01-02-03" is not read as year 1.
    let bytes = text.as_bytes();
    if bytes.len() < 5 || !bytes[..4].iter().all(u8::is_ascii_digit) {
        return None;
    }
    match bytes[4] {
        b'-' => {}
        b'/' => return NaiveDate::parse_from_str(text, "%Y/%m/%d").ok(),
        _ => return None,
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    ISO_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
}

fn parse_month_first(text: &str) -> Option<NaiveDate> {
    let mut parts = text.split(['/', '-']);
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let year_part = parts.next()?.trim();
    if parts.next().is_some() {
        return None;
    }
    let mut year: i32 = year_part.parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}
