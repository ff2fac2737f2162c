/*
 * strategy.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Strategy dispatch.
//!
//! The four strategies are a closed set, dispatched by a match over
//! [`MappingType`]. [`Strategies`] owns the custom-transform registry and
//! is the single entry point the resolver, engine, and expanders use.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

use formwork_model::MappingType;

use crate::custom::TransformRegistry;
use crate::diagnostics::Diagnostics;
use crate::value::render_value;
use crate::{custom, direct, jsonata, jsonpath};

/// The strategy dispatcher.
///
/// Cheap to construct; one per engine. All evaluation methods are total:
/// failures surface as `None` (single expressions) or empty strings plus a
/// diagnostic (batch mapping), never as errors.
#[derive(Debug, Default)]
pub struct Strategies {
    registry: TransformRegistry,
}

impl Strategies {
    /// Create a dispatcher with the built-in transform registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dispatcher with a caller-configured transform registry.
    pub fn with_registry(registry: TransformRegistry) -> Self {
        Strategies { registry }
    }

    /// Evaluate one expression to a value.
    ///
    /// Definite lookups yield the addressed value; multi-match queries
    /// yield an array of matches. Unresolved or malformed expressions are
    /// `None`.
    pub fn evaluate(
        &self,
        mapping_type: MappingType,
        expression: &str,
        data: &Value,
    ) -> Option<Value> {
        match mapping_type {
            MappingType::Direct => direct::evaluate(expression, data),
            MappingType::JsonPath => jsonpath::evaluate(expression, data),
            MappingType::Jsonata => jsonata::evaluate(expression, data),
            MappingType::Custom => {
                custom::evaluate(expression, data, &self.registry).map(Value::String)
            }
        }
    }

    /// Evaluate one expression and render the result for output.
    pub fn evaluate_text(
        &self,
        mapping_type: MappingType,
        expression: &str,
        data: &Value,
    ) -> Option<String> {
        match mapping_type {
            // Custom transforms already produce final strings.
            MappingType::Custom => custom::evaluate(expression, data, &self.registry),
            other => self.evaluate(other, expression, data).map(|v| render_value(&v)),
        }
    }

    /// Map a batch of field expressions to rendered values.
    ///
    /// Total: a field whose expression fails maps to `""`, logs a warning,
    /// and records a diagnostic; the rest of the batch proceeds.
    pub fn map_fields(
        &self,
        mapping_type: MappingType,
        fields: &IndexMap<String, String>,
        data: &Value,
        diagnostics: &mut Diagnostics,
    ) -> IndexMap<String, String> {
        let mut out = IndexMap::with_capacity(fields.len());
        for (field, expression) in fields {
            let value = match self.evaluate_text(mapping_type, expression, data) {
                Some(value) => value,
                None => {
                    warn!(%field, %expression, "mapping expression did not resolve");
                    diagnostics.warn_field(
                        field.as_str(),
                        format!("expression {expression:?} did not resolve"),
                    );
                    String::new()
                }
            };
            out.insert(field.clone(), value);
        }
        out
    }
}
