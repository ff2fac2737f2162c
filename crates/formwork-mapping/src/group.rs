/*
 * group.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Mapping-group dispatch: base-path narrowing and repeating-group
//! expansion.
//!
//! A group's `basePath` is evaluated exactly once, no matter how many
//! fields reference it. For a filter like `applicants[type='PRIMARY']`
//! with a dozen mapped fields this is the difference between one filter
//! pass and twelve.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

use formwork_model::{IndexPosition, MappingGroup, RepeatingGroupSpec};

use crate::diagnostics::Diagnostics;
use crate::strategy::Strategies;
use crate::value::render_value;

/// The narrowed context a `basePath` produced.
#[derive(Debug, Clone, PartialEq)]
pub enum BaseContext {
    /// Base path missing or unresolved; fields evaluate against the root.
    Root,
    /// A narrowed context value. Single-element collections have already
    /// been unwrapped; multi-element collections stay indexable.
    Narrowed(Value),
    /// A base path was configured but did not resolve.
    Unresolved,
}

/// Evaluate a group's base path once.
pub fn evaluate_base_path(
    strategies: &Strategies,
    group: &MappingGroup,
    data: &Value,
) -> BaseContext {
    let Some(base_path) = group.base_path.as_deref() else {
        return BaseContext::Root;
    };
    match strategies.evaluate(group.mapping_type, base_path, data) {
        Some(Value::Array(mut items)) if items.len() == 1 => {
            BaseContext::Narrowed(items.remove(0))
        }
        Some(value) => BaseContext::Narrowed(value),
        None => BaseContext::Unresolved,
    }
}

/// Map one group to rendered field values.
///
/// Groups with a `repeatingGroup` expand over their collection; plain
/// groups evaluate each field against the (possibly narrowed) context.
pub fn map_group(
    strategies: &Strategies,
    group: &MappingGroup,
    data: &Value,
    diagnostics: &mut Diagnostics,
) -> IndexMap<String, String> {
    if let Some(repeating) = &group.repeating_group {
        return expand_repeating_group(strategies, group, repeating, data, diagnostics);
    }

    match evaluate_base_path(strategies, group, data) {
        BaseContext::Root => strategies.map_fields(group.mapping_type, &group.fields, data, diagnostics),
        BaseContext::Narrowed(context) => {
            strategies.map_fields(group.mapping_type, &group.fields, &context, diagnostics)
        }
        BaseContext::Unresolved => {
            warn!(
                base_path = group.base_path.as_deref(),
                "group base path did not resolve; emitting empty values"
            );
            diagnostics.warn(format!(
                "base path {:?} did not resolve",
                group.base_path.as_deref().unwrap_or_default()
            ));
            group
                .fields
                .keys()
                .map(|field| (field.clone(), String::new()))
                .collect()
        }
    }
}

/// Expand a repeating group into indexed field names.
///
/// The group's base path must resolve to a collection; anything else
/// yields no synthesized fields (sparse input, not an error). Items past
/// `maxItems` are not emitted here — an overflow configuration on the
/// section picks them up, if one exists.
pub fn expand_repeating_group(
    strategies: &Strategies,
    group: &MappingGroup,
    repeating: &RepeatingGroupSpec,
    data: &Value,
    diagnostics: &mut Diagnostics,
) -> IndexMap<String, String> {
    let Some(base_path) = group.base_path.as_deref() else {
        warn!("repeating group without a base path; nothing to expand");
        diagnostics.warn("repeating group has no base path");
        return IndexMap::new();
    };
    let items = match strategies.evaluate(group.mapping_type, base_path, data) {
        Some(Value::Array(items)) => items,
        Some(_) => {
            warn!(base_path, "repeating group base path is not a collection");
            diagnostics.warn(format!(
                "repeating group base path {base_path:?} is not a collection"
            ));
            return IndexMap::new();
        }
        None => {
            warn!(base_path, "repeating group base path did not resolve");
            diagnostics.warn(format!(
                "repeating group base path {base_path:?} did not resolve"
            ));
            return IndexMap::new();
        }
    };

    let bound = repeating.max_items.unwrap_or(items.len()).min(items.len());
    let separator = repeating.index_separator.as_deref().unwrap_or("");

    let mut out = IndexMap::new();
    for (offset, item) in items.iter().take(bound).enumerate() {
        let display_index = repeating.start_index + offset as i32;
        for (field, expression) in &repeating.fields {
            let name = synthesize_name(repeating, separator, field, display_index);
            let value = strategies
                .evaluate(group.mapping_type, expression, item)
                .map(|v| render_value(&v))
                .unwrap_or_else(|| {
                    diagnostics.warn_field(
                        name.as_str(),
                        format!("expression {expression:?} did not resolve for item {display_index}"),
                    );
                    String::new()
                });
            out.insert(name, value);
        }
    }
    out
}

fn synthesize_name(
    repeating: &RepeatingGroupSpec,
    separator: &str,
    field: &str,
    display_index: i32,
) -> String {
    match repeating.index_position {
        IndexPosition::BeforeField => format!(
            "{}{}{}{}{}",
            repeating.prefix, display_index, separator, field, repeating.suffix
        ),
        IndexPosition::AfterField => format!(
            "{}{}{}{}{}",
            repeating.prefix, field, separator, display_index, repeating.suffix
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_model::MappingType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn data() -> Value {
        json!({
            "applicants": [
                {"type": "PRIMARY", "firstName": "Ada", "ssn": "111-22-3333"},
                {"type": "SPOUSE", "firstName": "Alan"}
            ],
            "children": [
                {"firstName": "Grace"},
                {"firstName": "Edsger"}
            ]
        })
    }

    fn group(base_path: &str) -> MappingGroup {
        MappingGroup {
            mapping_type: MappingType::JsonPath,
            base_path: Some(base_path.to_string()),
            ..MappingGroup::default()
        }
    }

    #[test]
    fn test_base_path_single_element_unwraps() {
        let strategies = Strategies::new();
        let ctx = evaluate_base_path(
            &strategies,
            &group("$.applicants[?(@.type=='PRIMARY')]"),
            &data(),
        );
        let BaseContext::Narrowed(value) = ctx else {
            panic!("expected a narrowed context");
        };
        // Unwrapped to the element itself: relative paths resolve directly.
        assert_eq!(value["firstName"], json!("Ada"));
    }

    #[test]
    fn test_base_path_multi_element_stays_indexable() {
        let strategies = Strategies::new();
        let ctx = evaluate_base_path(&strategies, &group("$.applicants[*]"), &data());
        let BaseContext::Narrowed(value) = ctx else {
            panic!("expected a narrowed context");
        };
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(value[1]["firstName"], json!("Alan"));
    }

    #[test]
    fn test_group_fields_relative_to_base() {
        let strategies = Strategies::new();
        let mut g = group("$.applicants[?(@.type=='PRIMARY')]");
        g.fields.insert("First".to_string(), "firstName".to_string());
        g.fields.insert("Ssn".to_string(), "ssn".to_string());

        let mut diagnostics = Diagnostics::new();
        let values = map_group(&strategies, &g, &data(), &mut diagnostics);
        assert_eq!(values.get("First").map(String::as_str), Some("Ada"));
        assert_eq!(values.get("Ssn").map(String::as_str), Some("111-22-3333"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unresolved_base_path_empties_all_fields() {
        let strategies = Strategies::new();
        let mut g = group("$.nobody[?(@.x=='y')]");
        g.fields.insert("A".to_string(), "firstName".to_string());
        g.fields.insert("B".to_string(), "lastName".to_string());

        let mut diagnostics = Diagnostics::new();
        let values = map_group(&strategies, &g, &data(), &mut diagnostics);
        assert_eq!(values.get("A").map(String::as_str), Some(""));
        assert_eq!(values.get("B").map(String::as_str), Some(""));
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn test_repeating_group_after_field() {
        let strategies = Strategies::new();
        let mut g = MappingGroup {
            mapping_type: MappingType::Direct,
            base_path: Some("children".to_string()),
            ..MappingGroup::default()
        };
        let mut fields = indexmap::IndexMap::new();
        fields.insert("FirstName".to_string(), "firstName".to_string());
        g.repeating_group = Some(RepeatingGroupSpec {
            prefix: "child".to_string(),
            index_separator: Some(".".to_string()),
            index_position: IndexPosition::AfterField,
            fields,
            ..RepeatingGroupSpec::default()
        });

        let mut diagnostics = Diagnostics::new();
        let values = map_group(&strategies, &g, &data(), &mut diagnostics);
        let keys: Vec<&str> = values.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["childFirstName.1", "childFirstName.2"]);
        assert_eq!(values["childFirstName.1"], "Grace");
        assert_eq!(values["childFirstName.2"], "Edsger");
    }

    #[test]
    fn test_repeating_group_before_field_with_bound() {
        let strategies = Strategies::new();
        let mut fields = indexmap::IndexMap::new();
        fields.insert("Name".to_string(), "firstName".to_string());
        let g = MappingGroup {
            mapping_type: MappingType::Direct,
            base_path: Some("children".to_string()),
            repeating_group: Some(RepeatingGroupSpec {
                prefix: "row".to_string(),
                max_items: Some(1),
                fields,
                ..RepeatingGroupSpec::default()
            }),
            ..MappingGroup::default()
        };

        let mut diagnostics = Diagnostics::new();
        let values = map_group(&strategies, &g, &data(), &mut diagnostics);
        let keys: Vec<&str> = values.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["row1Name"]);
        assert_eq!(values["row1Name"], "Grace");
    }

    #[test]
    fn test_repeating_group_non_list_base_is_empty() {
        let strategies = Strategies::new();
        let mut fields = indexmap::IndexMap::new();
        fields.insert("Name".to_string(), "firstName".to_string());
        let g = MappingGroup {
            mapping_type: MappingType::Direct,
            base_path: Some("applicants.0".to_string()),
            repeating_group: Some(RepeatingGroupSpec {
                fields,
                ..RepeatingGroupSpec::default()
            }),
            ..MappingGroup::default()
        };

        let mut diagnostics = Diagnostics::new();
        let values = map_group(&strategies, &g, &data(), &mut diagnostics);
        assert!(values.is_empty());
        assert!(!diagnostics.is_empty());
    }
}
