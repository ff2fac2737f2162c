/*
 * placeholder.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! `${dotted.path}` placeholder substitution in template ids.
//!
//! Ids like `enrollment-${plan.state}` pick their concrete template from
//! request variables. A placeholder that cannot be resolved is a hard
//! failure: substituting an empty string would load the wrong template
//! (or a missing one) without anyone noticing.

use serde_json::Value;

use crate::error::{ResolveError, ResolveResult};

/// Resolve every `${dotted.path}` placeholder in a template id.
pub fn resolve_placeholders(template_id: &str, variables: &Value) -> ResolveResult<String> {
    let mut out = String::with_capacity(template_id.len());
    let mut rest = template_id;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // An unterminated placeholder cannot be resolved either.
            return Err(ResolveError::UnresolvedPlaceholder {
                placeholder: after.to_string(),
                template_id: template_id.to_string(),
            });
        };
        let path = &after[..end];
        let value = lookup(path, variables).ok_or_else(|| ResolveError::UnresolvedPlaceholder {
            placeholder: path.to_string(),
            template_id: template_id.to_string(),
        })?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Look up a dotted path in the variable map, accepting only scalar
/// results.
fn lookup(path: &str, variables: &Value) -> Option<String> {
    let mut current = variables;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    match current {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
