use chrono::{Local, NaiveDate, TimeZone};
use serde_json::Value;

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Converts a Unix epoch value into an ISO-8601 local-time string.
///
/// Returns `None` for absent, zero or non-integer values and for epochs chrono cannot
/// represent.
pub fn parse_timestamp(value: Option<&Value>) -> Option<String> {
    let secs = match value? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))?,
        _ => return None,
    };
    format_epoch(secs)
}

pub fn format_epoch(secs: i64) -> Option<String> {
    if secs == 0 {
        return None;
    }
    Local
        .timestamp_opt(secs, 0)
        .single()
        .map(|dt| dt.format(ISO_FORMAT).to_string())
}

/// `{year, month, day}` → `YYYY-MM-DD`. Partial or impossible dates are unknown, not guessed.
pub fn parse_birthday(value: Option<&Value>) -> Option<String> {
    let obj = value?.as_object()?;
    let year = obj.get("year")?.as_i64()?;
    let month = obj.get("month")?.as_u64()?;
    let day = obj.get("day")?.as_u64()?;

    // only four-digit years are real birth years; placeholders like 0 or 95 are unknown
    let year = i32::try_from(year).ok().filter(|y| (1000..=9999).contains(y))?;
    let date = NaiveDate::from_ymd_opt(
        year,
        u32::try_from(month).ok()?,
        u32::try_from(day).ok()?,
    )?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Locations, employers and schools show up either as `{"name": ...}` objects or as bare
/// strings.
pub fn name_or_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(fix_mojibake(s)),
        Value::Object(obj) => obj
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(fix_mojibake),
        _ => None,
    }
}

/// Repairs strings whose UTF-8 bytes were written out one Latin-1 code point per byte,
/// e.g. `"CafÃ©"` → `"Café"`. Strings that don't decode cleanly are returned unchanged.
pub fn fix_mojibake(s: &str) -> String {
    let suspicious = s.chars().any(|c| ('\u{80}'..='\u{ff}').contains(&c));
    if !suspicious || s.chars().any(|c| c as u32 > 0xff) {
        return s.to_string();
    }

    let bytes: Vec<u8> = s.chars().map(|c| c as u32 as u8).collect();
    String::from_utf8(bytes).unwrap_or_else(|_| s.to_string())
}

pub fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(fix_mojibake)
        .unwrap_or_default()
}

pub fn opt_str_field(value: &Value, key: &str) -> Option<String> {
    Some(str_field(value, key)).filter(|s| !s.is_empty())
}

pub fn list_field(value: &Value, key: &str) -> Vec<Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Timestamps in the generic layout may already be strings; epochs are converted.
pub fn timestamp_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        other => parse_timestamp(other),
    }
}
