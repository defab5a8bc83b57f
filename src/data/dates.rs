//! Lenient date parsing for donation records
//!
//! Training files written by spreadsheet tools and API clients disagree on
//! date formats, so every entry point funnels through [`parse_date`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a calendar date from a date, datetime or RFC 3339 string.
/// Time of day and offset are discarded.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local().date());
    }

    let naive = value.trim_end_matches('Z');
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
        .map(|dt| dt.date())
}

/// Parse a boolean flag as written by pandas, spreadsheets or HTML forms
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Some(true),
        "false" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_plain_date() {
        assert_eq!(parse_date("2023-01-01"), Some(ymd(2023, 1, 1)));
        assert_eq!(parse_date("  2024-02-29 "), Some(ymd(2024, 2, 29)));
    }

    #[test]
    fn test_iso_datetime_with_z() {
        assert_eq!(parse_date("2025-04-06T08:55:13.000000Z"), Some(ymd(2025, 4, 6)));
        assert_eq!(parse_date("2025-04-06T23:10:00+03:00"), Some(ymd(2025, 4, 6)));
    }

    #[test]
    fn test_pandas_datetime() {
        assert_eq!(parse_date("2024-11-03 14:22:05.123456"), Some(ymd(2024, 11, 3)));
        assert_eq!(parse_date("2024-11-03 14:22:05"), Some(ymd(2024, 11, 3)));
    }

    #[test]
    fn test_invalid_dates() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2023-13-01"), None);
    }

    #[test]
    fn test_flags() {
        assert_eq!(parse_flag("True"), Some(true));
        assert_eq!(parse_flag("FALSE"), Some(false));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("maybe"), None);
    }
}
