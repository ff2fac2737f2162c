/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Value rendering and casting helpers shared by all strategies.
//!
//! Two string conversions exist on purpose:
//!
//! - [`render_value`] is the *output* conversion used for final field
//!   values: ISO dates become `MM/dd/yyyy`, arrays join with `", "`.
//! - [`cast_string`] is the *intermediate* conversion used when an
//!   expression consumes a value (concatenation, transform arguments):
//!   strings pass through verbatim so date arithmetic still sees the
//!   original ISO form.

use chrono::NaiveDate;
use serde_json::Value;

/// Separator used when a multi-valued result renders into one field.
pub const LIST_SEPARATOR: &str = ", ";

/// Fixed output format for date-like values on rendered forms.
pub const DATE_OUTPUT_FORMAT: &str = "%m/%d/%Y";

/// Render a value for a field on the output document.
///
/// - strings: verbatim, except full ISO dates (`YYYY-MM-DD`) which render
///   as `MM/dd/yyyy`
/// - numbers: integral values without a trailing `.0`
/// - booleans: `true` / `false`
/// - arrays: elements rendered and joined with `", "`
/// - objects and null: empty string
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(_) => render_number(value),
        Value::String(s) => match parse_iso_date(s) {
            Some(date) => date.format(DATE_OUTPUT_FORMAT).to_string(),
            None => s.clone(),
        },
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
        Value::Object(_) => String::new(),
    }
}

/// Cast a value to a string for expression-internal consumption.
///
/// Unlike [`render_value`], strings pass through verbatim (no date
/// reformatting) and arrays of one element unwrap before casting.
pub fn cast_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(_) => render_number(value),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.len() == 1 => cast_string(&items[0]),
        Value::Array(items) => items
            .iter()
            .map(cast_string)
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
        Value::Object(_) => String::new(),
    }
}

/// Cast a value to a number, if it is one or parses as one.
pub fn cast_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Array(items) if items.len() == 1 => cast_number(&items[0]),
        _ => None,
    }
}

/// Format a number as a f64 without a spurious trailing `.0`.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn render_number(value: &Value) -> String {
    let Value::Number(n) = value else {
        return String::new();
    };
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    n.as_f64().map(format_number).unwrap_or_default()
}

/// Parse a strict ISO `YYYY-MM-DD` date. Partial or slashed forms are not
/// treated as date-like.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let bytes = s.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Truthiness for condition evaluation.
///
/// - raw booleans are used directly
/// - null is false
/// - strings are true unless empty or `"false"` case-insensitively
/// - numbers and containers are always true (their display form is never
///   the empty string)
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::String(s) => !s.is_empty() && !s.eq_ignore_ascii_case("false"),
        Value::Number(_) | Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_render_scalars() {
        assert_eq!(render_value(&json!("hello")), "hello");
        assert_eq!(render_value(&json!(42)), "42");
        assert_eq!(render_value(&json!(42.5)), "42.5");
        assert_eq!(render_value(&json!(42.0)), "42");
        assert_eq!(render_value(&json!(true)), "true");
        assert_eq!(render_value(&json!(null)), "");
    }

    #[test]
    fn test_render_iso_date() {
        assert_eq!(render_value(&json!("1990-05-15")), "05/15/1990");
        // Not strict ISO: passes through untouched.
        assert_eq!(render_value(&json!("1990-5-15")), "1990-5-15");
        assert_eq!(render_value(&json!("1990-13-40")), "1990-13-40");
        assert_eq!(render_value(&json!("05/15/1990")), "05/15/1990");
    }

    #[test]
    fn test_render_array_joins() {
        assert_eq!(render_value(&json!(["a", "b", "c"])), "a, b, c");
        assert_eq!(render_value(&json!([1, 2])), "1, 2");
        assert_eq!(render_value(&json!([])), "");
    }

    #[test]
    fn test_render_object_is_opaque() {
        assert_eq!(render_value(&json!({"a": 1})), "");
    }

    #[test]
    fn test_cast_string_keeps_dates_raw() {
        assert_eq!(cast_string(&json!("1990-05-15")), "1990-05-15");
        assert_eq!(cast_string(&json!(["1990-05-15"])), "1990-05-15");
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(null)));
        assert!(is_truthy(&json!("yes")));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!("false")));
        assert!(!is_truthy(&json!("FALSE")));
        assert!(is_truthy(&json!(0)));
        assert!(is_truthy(&json!({"k": 1})));
        assert!(is_truthy(&json!([1])));
    }
}
