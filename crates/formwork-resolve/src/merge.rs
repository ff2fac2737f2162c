/*
 * merge.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Inheritance merge of template sections.
//!
//! The merge starts from the (already resolved) base template's sections
//! and layers the child on top:
//!
//! - ids listed in the child's `excludedSections` drop
//! - a child section sharing a base section's id merges field-by-field
//!   (child wins where it says something)
//! - legacy `sectionOverrides` swap a base section's `templatePath` when
//!   no child section with that id exists
//! - fragment sections append, then the child's remaining own sections
//! - the result sorts by `order`, stable, so ties keep the
//!   base / fragments / own insertion sequence

use std::collections::HashSet;

use formwork_model::{SectionSpec, TemplateDefinition};

/// Merge one base section with the child section of the same id.
///
/// The child's value wins whenever it is set: non-empty strings, a
/// nonzero `order`, present options, non-empty mapping tables.
pub fn merge_section(base: &SectionSpec, child: &SectionSpec) -> SectionSpec {
    SectionSpec {
        section_id: base.section_id.clone(),
        section_type: pick_string(&base.section_type, &child.section_type),
        template_path: pick_string(&base.template_path, &child.template_path),
        order: if child.order != 0 { child.order } else { base.order },
        condition: child.condition.clone().or_else(|| base.condition.clone()),
        mapping_type: child.mapping_type.or(base.mapping_type),
        field_mappings: if child.field_mappings.is_empty() {
            base.field_mappings.clone()
        } else {
            child.field_mappings.clone()
        },
        field_mapping_groups: if child.field_mapping_groups.is_empty() {
            base.field_mapping_groups.clone()
        } else {
            child.field_mapping_groups.clone()
        },
        overflow_configs: if child.overflow_configs.is_empty() {
            base.overflow_configs.clone()
        } else {
            child.overflow_configs.clone()
        },
        view_model_type: child
            .view_model_type
            .clone()
            .or_else(|| base.view_model_type.clone()),
    }
}

fn pick_string(base: &str, child: &str) -> String {
    if child.is_empty() { base } else { child }.to_string()
}

/// Assemble the section list for a child definition.
///
/// `base_sections` are the resolved base template's sections (empty when
/// the child has no base); `fragment_sections` are the concatenated
/// sections of every included fragment, already resolved, in inclusion
/// order.
pub fn merge_template(
    base_sections: Vec<SectionSpec>,
    child: &TemplateDefinition,
    fragment_sections: Vec<SectionSpec>,
) -> Vec<SectionSpec> {
    let mut merged: Vec<SectionSpec> = Vec::new();
    let mut consumed: HashSet<&str> = HashSet::new();

    for base_section in &base_sections {
        let id = base_section.section_id.as_str();
        if child.excluded_sections.contains(id) {
            continue;
        }
        if let Some(child_section) = child.sections.iter().find(|s| s.section_id == id) {
            merged.push(merge_section(base_section, child_section));
            consumed.insert(id);
        } else if let Some(template_path) = child.section_overrides.get(id) {
            let mut overridden = base_section.clone();
            overridden.template_path = template_path.clone();
            merged.push(overridden);
        } else {
            merged.push(base_section.clone());
        }
    }

    merged.extend(fragment_sections);

    for child_section in &child.sections {
        if !consumed.contains(child_section.section_id.as_str()) {
            merged.push(child_section.clone());
        }
    }

    // Stable: ties keep the insertion sequence built above.
    merged.sort_by_key(|s| s.order);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_model::MappingType;
    use pretty_assertions::assert_eq;

    fn section(id: &str, order: i32) -> SectionSpec {
        SectionSpec {
            section_id: id.to_string(),
            section_type: "acroform".to_string(),
            template_path: format!("forms/{id}.pdf"),
            order,
            ..SectionSpec::default()
        }
    }

    #[test]
    fn test_child_wins_when_set() {
        let base = SectionSpec {
            condition: Some("$.flag".to_string()),
            mapping_type: Some(MappingType::JsonPath),
            ..section("a", 1)
        };
        let mut child = SectionSpec {
            section_id: "a".to_string(),
            template_path: "forms/a-v2.pdf".to_string(),
            ..SectionSpec::default()
        };
        child
            .field_mappings
            .insert("x".to_string(), "y".to_string());

        let merged = merge_section(&base, &child);
        assert_eq!(merged.template_path, "forms/a-v2.pdf");
        // Unset on the child: inherited from the base.
        assert_eq!(merged.section_type, "acroform");
        assert_eq!(merged.order, 1);
        assert_eq!(merged.condition.as_deref(), Some("$.flag"));
        assert_eq!(merged.mapping_type, Some(MappingType::JsonPath));
        assert_eq!(merged.field_mappings.get("x").map(String::as_str), Some("y"));
    }

    #[test]
    fn test_excluded_sections_drop() {
        let child = TemplateDefinition {
            template_id: "child".to_string(),
            excluded_sections: ["a".to_string()].into(),
            ..TemplateDefinition::default()
        };
        let sections = merge_template(vec![section("a", 1), section("b", 2)], &child, Vec::new());
        let ids: Vec<&str> = sections.iter().map(|s| s.section_id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn test_section_override_swaps_template_path() {
        let mut child = TemplateDefinition {
            template_id: "child".to_string(),
            ..TemplateDefinition::default()
        };
        child
            .section_overrides
            .insert("a".to_string(), "forms/a-ca.pdf".to_string());

        let sections = merge_template(vec![section("a", 1)], &child, Vec::new());
        assert_eq!(sections[0].template_path, "forms/a-ca.pdf");
    }

    #[test]
    fn test_section_override_ignored_when_child_section_exists() {
        let mut child = TemplateDefinition {
            template_id: "child".to_string(),
            sections: vec![SectionSpec {
                section_id: "a".to_string(),
                template_path: "forms/a-child.pdf".to_string(),
                ..SectionSpec::default()
            }],
            ..TemplateDefinition::default()
        };
        child
            .section_overrides
            .insert("a".to_string(), "forms/a-legacy.pdf".to_string());

        let sections = merge_template(vec![section("a", 1)], &child, Vec::new());
        // The real child section wins over the legacy override.
        assert_eq!(sections[0].template_path, "forms/a-child.pdf");
    }

    #[test]
    fn test_sort_is_stable_across_origins() {
        let child = TemplateDefinition {
            template_id: "child".to_string(),
            sections: vec![section("own", 2)],
            ..TemplateDefinition::default()
        };
        let sections = merge_template(
            vec![section("base", 2)],
            &child,
            vec![section("frag", 2)],
        );
        let ids: Vec<&str> = sections.iter().map(|s| s.section_id.as_str()).collect();
        // Equal orders keep insertion sequence: base, fragments, own.
        assert_eq!(ids, vec!["base", "frag", "own"]);
    }

    #[test]
    fn test_orders_interleave() {
        let child = TemplateDefinition {
            template_id: "child".to_string(),
            sections: vec![section("own", 1)],
            ..TemplateDefinition::default()
        };
        let sections = merge_template(
            vec![section("base", 2)],
            &child,
            vec![section("frag", 0)],
        );
        let ids: Vec<&str> = sections.iter().map(|s| s.section_id.as_str()).collect();
        assert_eq!(ids, vec!["frag", "own", "base"]);
    }
}
