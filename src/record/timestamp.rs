//! Timestamp normalization for source datetime fields.
//!
//! The source API reports datetimes as naive `YYYY-MM-DD HH:MM:SS` strings
//! (with an optional fractional part) and uses `false` for unset values.

use chrono::NaiveDateTime;
use serde_json::Value;

const SOURCE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Normalize a datetime field value to the canonical form
/// `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
///
/// Absent, null, and boolean values map to null. Date-only strings and
/// strings in no recognized format pass through unchanged, so the
/// function is idempotent on its own output.
pub fn normalize(value: Option<&Value>) -> Value {
    let Some(value) = value else {
        return Value::Null;
    };

    match value {
        Value::Null | Value::Bool(_) => Value::Null,
        Value::String(s) => Value::String(normalize_str(s)),
        other => Value::String(other.to_string()),
    }
}

fn normalize_str(s: &str) -> String {
    match NaiveDateTime::parse_from_str(s, SOURCE_FORMAT) {
        Ok(dt) => dt.format(CANONICAL_FORMAT).to_string(),
        Err(_) => s.to_string(),
    }
}
