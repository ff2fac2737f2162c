/*
 * direct.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Direct dot-path navigation.
//!
//! The simplest strategy: an expression like `applicants.0.firstName` walks
//! nested objects key by key, with numeric segments indexing into arrays.
//! An unresolvable path is `None`, which the dispatcher renders as `""`.

use serde_json::Value;

/// Evaluate a dot-delimited path against a data tree.
pub fn evaluate(expression: &str, data: &Value) -> Option<Value> {
    let expression = expression.trim();
    if expression.is_empty() {
        return None;
    }
    let mut current = data;
    for segment in expression.split('.') {
        current = step(current, segment)?;
    }
    Some(current.clone())
}

/// Navigate one path segment. Numeric segments index arrays; bracketed
/// suffixes (`applicants[0]`) are accepted as an equivalent spelling.
fn step<'a>(current: &'a Value, segment: &str) -> Option<&'a Value> {
    // `name[2]` splits into a key step and an index step.
    if let Some(open) = segment.find('[') {
        if segment.ends_with(']') {
            let key = &segment[..open];
            let index = &segment[open + 1..segment.len() - 1];
            let inner = if key.is_empty() {
                current
            } else {
                step_plain(current, key)?
            };
            return step_plain(inner, index);
        }
    }
    step_plain(current, segment)
}

fn step_plain<'a>(current: &'a Value, segment: &str) -> Option<&'a Value> {
    match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => {
            let index: usize = segment.parse().ok()?;
            items.get(index)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn data() -> Value {
        json!({
            "applicants": [
                {"firstName": "Ada", "lastName": "Lovelace"},
                {"firstName": "Alan"}
            ],
            "plan": {"name": "Gold", "tier": 2}
        })
    }

    #[test]
    fn test_nested_object_path() {
        assert_eq!(evaluate("plan.name", &data()), Some(json!("Gold")));
    }

    #[test]
    fn test_numeric_segment_indexes_array() {
        assert_eq!(
            evaluate("applicants.1.firstName", &data()),
            Some(json!("Alan"))
        );
    }

    #[test]
    fn test_bracket_index_spelling() {
        assert_eq!(
            evaluate("applicants[0].lastName", &data()),
            Some(json!("Lovelace"))
        );
    }

    #[test]
    fn test_missing_path_is_none() {
        assert_eq!(evaluate("applicants.0.middleName", &data()), None);
        assert_eq!(evaluate("nothing.here", &data()), None);
    }

    #[test]
    fn test_terminal_collection() {
        let value = evaluate("applicants", &data()).unwrap();
        assert!(value.is_array());
    }

    #[test]
    fn test_empty_expression_is_none() {
        assert_eq!(evaluate("", &data()), None);
        assert_eq!(evaluate("   ", &data()), None);
    }
}
