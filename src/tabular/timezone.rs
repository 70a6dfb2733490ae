//! UTC offset derivation for ISO-8601 timestamps

use crate::types::{JsonValue, Record};
use chrono::DateTime;

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Offset from UTC in minutes, or `None` when the value has no usable offset
pub fn utc_offset_minutes(value: &str) -> Option<i32> {
    let value = value.trim();
    let parsed = DateTime::parse_from_rfc3339(value).ok().or_else(|| {
        OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
    })?;
    Some(parsed.offset().local_minus_utc() / 60)
}

/// Add `target` holding the UTC offset of `source` to every row
///
/// Rows whose `source` is missing or carries no offset get `""`.
pub fn append_utc_offset_column(rows: &mut [Record], source: &str, target: &str) {
    for row in rows {
        let offset = row
            .get(source)
            .and_then(JsonValue::as_str)
            .and_then(utc_offset_minutes)
            .map_or_else(|| JsonValue::String(String::new()), JsonValue::from);
        row.insert(target.to_string(), offset);
    }
}
