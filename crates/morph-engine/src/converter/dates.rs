//! Date and calendar conversions under a chrono format string.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

use morph_core::constants::DEFAULT_DATE_FORMAT;
use morph_core::errors::{MappingError, MappingResult};
use morph_core::model::{TypeRef, Value};

/// An invalid format string falls back to the default.
fn checked(format: &str) -> &str {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        DEFAULT_DATE_FORMAT
    } else {
        format
    }
}

pub fn format_date(date: &NaiveDateTime, format: &str) -> String {
    date.format(checked(format)).to_string()
}

pub fn format_calendar(cal: &DateTime<FixedOffset>, format: &str) -> String {
    cal.format(checked(format)).to_string()
}

/// Parse a date-time, accepting a bare date at midnight.
pub fn parse_date(text: &str, format: &str) -> Option<NaiveDateTime> {
    let format = checked(format);
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse an offset date-time; text without an offset is taken as UTC.
pub fn parse_calendar(text: &str, format: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(text.trim(), checked(format))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text.trim()).ok())
        .or_else(|| parse_date(text, format).map(|d| d.and_utc().fixed_offset()))
}

fn from_millis(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_i64()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

pub(super) fn to_date(value: &Value, format: &str) -> MappingResult<Value> {
    let date = match value {
        Value::Date(d) => Some(*d),
        Value::Calendar(c) => Some(c.naive_local()),
        Value::Str(s) => parse_date(s, format),
        other => from_millis(other).map(|dt| dt.naive_utc()),
    };
    date.map(Value::Date).ok_or_else(|| {
        MappingError::conversion(
            value.display_string(),
            TypeRef::Date.to_string(),
            format!("does not match '{format}'"),
        )
    })
}

pub(super) fn to_calendar(value: &Value, format: &str) -> MappingResult<Value> {
    let cal = match value {
        Value::Calendar(c) => Some(*c),
        Value::Date(d) => Some(d.and_utc().fixed_offset()),
        Value::Str(s) => parse_calendar(s, format),
        other => from_millis(other).map(|dt| dt.fixed_offset()),
    };
    cal.map(Value::Calendar).ok_or_else(|| {
        MappingError::conversion(
            value.display_string(),
            TypeRef::Calendar.to_string(),
            format!("does not match '{format}'"),
        )
    })
}
