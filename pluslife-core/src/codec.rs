//! Field-level decoding rules shared by every payload shape.

use crate::error::PluslifeError;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use pluslife_schemas::enums::WireEnum;
use serde_json::Value;

/// Decodes an enumeration from its integer wire code.
pub fn decode_wire_int<E: WireEnum>(code: i64) -> Result<E, PluslifeError> {
    E::from_code(code).ok_or_else(|| PluslifeError::UnknownEnumValue(E::ENUM_NAME, code.to_string()))
}

/// Decodes an enumeration from its symbolic wire name.
pub fn decode_wire_name<E: WireEnum>(name: &str) -> Result<E, PluslifeError> {
    E::from_name(name).ok_or_else(|| PluslifeError::UnknownEnumValue(E::ENUM_NAME, name.to_string()))
}

pub(crate) fn required<T>(
    value: Option<T>,
    type_name: &'static str,
    field: &'static str,
) -> Result<T, PluslifeError> {
    value.ok_or(PluslifeError::MissingRequiredField(type_name, field))
}

/// Formats a timestamp the way the device does: milliseconds and a `Z` suffix.
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an ISO-8601 timestamp. Offsets are normalised to UTC and a string
/// without an offset is taken to be UTC already.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, PluslifeError> {
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Ok(time.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| PluslifeError::MalformedTimestamp(raw.to_string()))
}

/// Parses a timestamp field that must hold a JSON string.
pub fn parse_timestamp_value(raw: &Value) -> Result<DateTime<Utc>, PluslifeError> {
    match raw {
        Value::String(s) => parse_timestamp(s),
        other => Err(PluslifeError::MalformedTimestamp(other.to_string())),
    }
}

/// JSON pointer of the first place where `actual` departs from `expected`.
///
/// Numbers compare by value, so `38` and `38.0` are the same reading.
pub fn first_difference(expected: &Value, actual: &Value) -> Option<String> {
    difference_at(expected, actual, String::new())
        .map(|at| if at.is_empty() { "/".to_string() } else { at })
}

/// Whether two documents carry the same data, regardless of number spelling.
pub fn semantically_equal(expected: &Value, actual: &Value) -> bool {
    first_difference(expected, actual).is_none()
}

fn numbers_equal(left: &serde_json::Number, right: &serde_json::Number) -> bool {
    left == right || matches!((left.as_f64(), right.as_f64()), (Some(l), Some(r)) if l == r)
}

fn difference_at(expected: &Value, actual: &Value, at: String) -> Option<String> {
    match (expected, actual) {
        (Value::Object(left), Value::Object(right)) => {
            let mut keys: Vec<&String> = left.keys().chain(right.keys()).collect();
            keys.sort();
            keys.dedup();
            keys.into_iter().find_map(|key| {
                let child = format!("{}/{}", at, key);
                match (left.get(key), right.get(key)) {
                    (Some(l), Some(r)) => difference_at(l, r, child),
                    _ => Some(child),
                }
            })
        }
        (Value::Array(left), Value::Array(right)) => left
            .iter()
            .zip(right)
            .enumerate()
            .find_map(|(i, (l, r))| difference_at(l, r, format!("{}/{}", at, i)))
            .or_else(|| (left.len() != right.len()).then(|| at.clone())),
        (Value::Number(left), Value::Number(right)) => (!numbers_equal(left, right)).then_some(at),
        _ => (expected != actual).then_some(at),
    }
}
