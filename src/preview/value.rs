//! Conversion of decoded cell values into JSON-safe form

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::Value;

/// Sequences longer than this are cut and end with a placeholder
pub const MAX_SEQUENCE_ITEMS: usize = 100;

/// UTF-8 text, or a placeholder carrying the byte length
pub fn bytes_to_json(bytes: &[u8]) -> Value {
    match std::str::from_utf8(bytes) {
        Ok(text) => Value::String(text.to_string()),
        Err(_) => Value::String(format!("<binary: {} bytes>", bytes.len())),
    }
}

/// Keep the first [`MAX_SEQUENCE_ITEMS`] values and note how many were dropped.
pub fn truncate_sequence<I>(values: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    let mut kept = Vec::new();
    let mut omitted = 0usize;
    for value in values {
        if kept.len() < MAX_SEQUENCE_ITEMS {
            kept.push(value);
        } else {
            omitted += 1;
        }
    }
    if omitted > 0 {
        kept.push(Value::String(format!("... ({} more)", omitted)));
    }
    Value::Array(kept)
}

/// Days since the Unix epoch as `YYYY-MM-DD`
pub fn date_to_json(days: i32) -> Value {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1);
    match epoch.and_then(|e| e.checked_add_signed(chrono::Duration::days(days as i64))) {
        Some(date) => Value::String(date.format("%Y-%m-%d").to_string()),
        None => Value::String(days.to_string()),
    }
}

pub fn timestamp_millis_to_json(millis: i64) -> Value {
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(ts) => Value::String(ts.to_rfc3339_opts(SecondsFormat::Micros, false)),
        None => Value::String(millis.to_string()),
    }
}

pub fn timestamp_micros_to_json(micros: i64) -> Value {
    match DateTime::<Utc>::from_timestamp_micros(micros) {
        Some(ts) => Value::String(ts.to_rfc3339_opts(SecondsFormat::Micros, false)),
        None => Value::String(micros.to_string()),
    }
}

/// Non-finite floats have no JSON form and fall back to their text
pub fn float_to_json(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(value.to_string()))
}
