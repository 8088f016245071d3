//! Lenient readers for loosely-typed records.
//!
//! Product, promo and settings rows come from a schemaless store: the same
//! concept may live under several field names, and numbers may arrive as
//! strings. Everything here is total: bad input degrades to `None`, zero or
//! an empty string.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::money::Money;

/// Return the first non-null value found under any of `aliases`, in order.
pub fn pick<'a>(record: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .find_map(|key| record.get(*key).filter(|v| !v.is_null()))
}

/// Read a finite number.
///
/// Numbers pass through, numeric strings are parsed after trimming, and
/// booleans count as 1 or 0. Anything else is `None`.
pub fn to_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Read a non-negative whole quantity (`max(0, floor(n))`); invalid input is 0.
pub fn to_quantity(value: Option<&Value>) -> u32 {
    match to_number(value) {
        Some(n) if n > 0.0 => n.floor().min(f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}

/// Read a monetary amount; invalid input is zero.
pub fn to_money(value: Option<&Value>) -> Money {
    to_number(value).map(Money::from_decimal).unwrap_or_default()
}

/// Read display text, trimmed. Numbers are rendered; falsy values are empty.
pub fn to_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => String::new(),
    }
}

/// Read optional text; empty after trimming means absent.
pub fn to_optional_text(value: Option<&Value>) -> Option<String> {
    Some(to_text(value)).filter(|s| !s.is_empty())
}

/// Parse a timestamp in any of the shapes a table row may hold.
///
/// Accepts RFC 3339, Postgres `timestamptz` text, naive date-times (taken
/// as UTC), plain dates (midnight UTC) and numbers (Unix milliseconds).
pub fn to_timestamp(value: Option<&Value>) -> Option<DateTime<Utc>> {
    match value? {
        Value::Number(n) => {
            let millis = n.as_f64()?;
            if !millis.is_finite() || millis == 0.0 {
                return None;
            }
            Utc.timestamp_millis_opt(millis as i64).single()
        }
        Value::String(s) => parse_timestamp_text(s.trim()),
        _ => None,
    }
}

fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
