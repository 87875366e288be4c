use serde_json::Value;

use super::date::strip_quotes;

/// Parses a non-negative count, accepting thousands separators and integral
/// floats such as `"12.0"`.
pub fn parse_count(raw: &str) -> Option<u64> {
    let s = strip_quotes(raw).replace(',', "");
    if let Ok(n) = s.parse::<u64>() {
        return Some(n);
    }
    integral(s.parse::<f64>().ok()?)
}

fn integral(f: f64) -> Option<u64> {
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

/// Reads a count from a JSON value that may be a number or a numeric string.
pub fn count_from_json(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => parse_count(s),
        _ => None,
    }
}
