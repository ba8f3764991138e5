//! Dot-path access into nested benchmark records
//!
//! Records are kept as dynamic JSON values so that partial or heterogeneous
//! payloads from the API never fail to load. A path such as
//! `"speed_metrics.units_per_second"` is resolved one segment at a time; any
//! step that hits a non-object or an absent key resolves to `None`.

use serde_json::Value;

/// A benchmark record as received from the API
pub type Record = Value;

/// Resolve `path` against `record`.
///
/// An empty path, a missing key or a non-object intermediate all yield `None`.
/// A JSON `null` leaf resolves to `Some(Value::Null)`; use [`get_present`] when
/// null should count as missing.
pub fn get<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    path.split('.')
        .try_fold(record, |current, segment| current.as_object()?.get(segment))
}

/// Like [`get`], but folds JSON `null` into `None`
pub fn get_present<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    get(record, path).filter(|value| !value.is_null())
}

/// Lenient numeric coercion.
///
/// Numbers convert directly; strings contribute their longest leading float
/// literal (`"12.5ms"` is `12.5`); everything else is `None`.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_leading_float(s),
        _ => None,
    }
}

/// Resolve `path` and coerce the result to a number
pub fn number_at(record: &Value, path: &str) -> Option<f64> {
    get_present(record, path).and_then(as_number)
}

/// Render a present value as plain text for table cells and labels
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                format_float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

fn parse_leading_float(s: &str) -> Option<f64> {
    let trimmed = s.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    if trimmed[end..].starts_with("Infinity") {
        let sign = if trimmed.starts_with('-') { -1.0 } else { 1.0 };
        return Some(sign * f64::INFINITY);
    }

    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - digits_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let fraction_start = end + 1;
        let mut cursor = fraction_start;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        mantissa_digits += cursor - fraction_start;
        end = cursor;
    }
    if mantissa_digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut cursor = end + 1;
        if cursor < bytes.len() && (bytes[cursor] == b'+' || bytes[cursor] == b'-') {
            cursor += 1;
        }
        let exponent_start = cursor;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        if cursor > exponent_start {
            end = cursor;
        }
    }

    trimmed[..end].parse::<f64>().ok()
}
