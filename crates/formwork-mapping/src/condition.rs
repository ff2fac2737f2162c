/*
 * condition.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Section render/skip decisions.
//!
//! A section's `condition` is evaluated with the section's own mapping
//! strategy. Conditions written as comparison expressions
//! (`$.flag == true`) still work when the section's strategy is a pure
//! path language: an expression the strategy cannot resolve is retried
//! against the expression engine before the section is skipped.

use serde_json::Value;
use tracing::debug;

use formwork_model::MappingType;

use crate::jsonata;
use crate::strategy::Strategies;
use crate::value::is_truthy;

/// Decide whether a section renders for this request.
///
/// - no condition: render
/// - boolean result: used directly
/// - non-null, non-boolean result: true unless its string form is empty
///   or `"false"` (case-insensitive)
/// - null / unresolved: skip
pub fn should_render(
    strategies: &Strategies,
    condition: Option<&str>,
    mapping_type: MappingType,
    data: &Value,
) -> bool {
    let Some(expression) = condition else {
        return true;
    };
    let expression = expression.trim();
    if expression.is_empty() {
        return true;
    }

    let result = strategies
        .evaluate(mapping_type, expression, data)
        .or_else(|| jsonata::evaluate(expression, data));

    match result {
        Some(value) => is_truthy(&value),
        None => {
            debug!(expression, "condition did not resolve; skipping section");
            false
        }
    }
}
