//! Primitive value parsing shared by the validator and the converters.

use core::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;

const DATE_TIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

pub fn parse_integer(text: &str) -> Result<i32, String> {
    text.trim()
        .parse::<i32>()
        .map_err(|e| format!("`{text}` is not an integer ({e})"))
}

pub fn parse_decimal(text: &str) -> Result<Decimal, String> {
    Decimal::from_str(text.trim()).map_err(|e| format!("`{text}` is not a decimal ({e})"))
}

/// Accepts RFC 3339, zone-less date-times (taken as UTC) and plain dates
/// (midnight UTC).
pub fn parse_date(text: &str) -> Result<DateTime<Utc>, String> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("`{text}` is not a date"))
}
