//! Float fields the analyzer writes as plain integers.
//!
//! Temperatures arrive as `6300` or `36.5`. Whole values are written back as
//! integers so that a decoded document re-encodes to the same JSON numbers.

use serde::Serializer;

/// Largest magnitude an `f64` holds without losing integer precision.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

pub fn serialize_compact<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

pub fn serialize_compact_option<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => serialize_compact(v, serializer),
        None => serializer.serialize_none(),
    }
}
