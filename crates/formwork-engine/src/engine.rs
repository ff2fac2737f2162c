/*
 * engine.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The generation engine.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use formwork_mapping::{should_render, Diagnostics, Strategies};
use formwork_model::SectionSpec;
use formwork_resolve::{ResolveResult, TemplateResolver, TemplateSource};

use crate::output::{GenerationOutput, SectionOutput};
use crate::overflow;

/// Resolves templates and maps request data into renderable payloads.
///
/// One engine serves many concurrent requests: the resolver's caches are
/// the only shared state, and everything per-request is ephemeral.
pub struct Engine {
    resolver: TemplateResolver,
    strategies: Strategies,
}

impl Engine {
    /// Create an engine over a template source with default caches and
    /// the built-in transform registry.
    pub fn new(source: Arc<dyn TemplateSource>) -> Self {
        Engine {
            resolver: TemplateResolver::new(source),
            strategies: Strategies::new(),
        }
    }

    /// Create an engine from pre-built parts (custom caches, custom
    /// transform registry).
    pub fn with_parts(resolver: TemplateResolver, strategies: Strategies) -> Self {
        Engine {
            resolver,
            strategies,
        }
    }

    /// The underlying resolver (for administrative cache invalidation).
    pub fn resolver(&self) -> &TemplateResolver {
        &self.resolver
    }

    /// Generate the section payloads for one request.
    ///
    /// Fatal failures (unknown id, unresolved placeholder, corrupt
    /// source) error out; data-level mapping failures degrade per field
    /// and surface as diagnostics on the output.
    pub fn generate(
        &self,
        template_id: &str,
        data: &Value,
        variables: &Value,
    ) -> ResolveResult<GenerationOutput> {
        let resolved = self.resolver.resolve(template_id, variables)?;
        let mut diagnostics = Diagnostics::new();
        let mut sections = Vec::with_capacity(resolved.sections.len());

        for section in &resolved.sections {
            let mapping_type = section.effective_mapping_type();
            if !should_render(
                &self.strategies,
                section.condition.as_deref(),
                mapping_type,
                data,
            ) {
                debug!(
                    section_id = section.section_id.as_str(),
                    "condition is false; skipping section"
                );
                continue;
            }

            let values = self.map_section(section, data, &mut diagnostics);

            let mut addenda = Vec::new();
            for spec in &section.overflow_configs {
                addenda.extend(overflow::paginate(
                    &self.strategies,
                    spec,
                    data,
                    &mut diagnostics,
                ));
            }

            sections.push(SectionOutput {
                section: section.clone(),
                values,
                view_model: section.view_model_type.as_ref().map(|_| data.clone()),
                addenda,
            });
        }

        Ok(GenerationOutput {
            template_id: resolved.template_id.clone(),
            sections,
            diagnostics: diagnostics.into_items(),
        })
    }

    fn map_section(
        &self,
        section: &SectionSpec,
        data: &Value,
        diagnostics: &mut Diagnostics,
    ) -> IndexMap<String, String> {
        let mut values = self.strategies.map_fields(
            section.effective_mapping_type(),
            &section.field_mappings,
            data,
            diagnostics,
        );
        for group in &section.field_mapping_groups {
            values.extend(formwork_mapping::map_group(
                &self.strategies,
                group,
                data,
                diagnostics,
            ));
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_resolve::MemorySource;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn engine(templates: &[(&str, &str)]) -> Engine {
        let source = MemorySource::with_templates(templates.iter().map(|(id, doc)| (*id, *doc)));
        Engine::new(Arc::new(source))
    }

    #[test]
    fn test_generate_flat_mappings() {
        let engine = engine(&[(
            "simple",
            "\
templateId: simple
sections:
  - sectionId: cover
    type: acroform
    templatePath: forms/cover.pdf
    order: 1
    fieldMappings:
      PlanName: plan.name
      Missing: plan.tier
",
        )]);
        let output = engine
            .generate("simple", &json!({"plan": {"name": "Gold"}}), &json!({}))
            .unwrap();

        assert_eq!(output.sections.len(), 1);
        let cover = &output.sections[0];
        assert_eq!(cover.values.get("PlanName").map(String::as_str), Some("Gold"));
        assert_eq!(cover.values.get("Missing").map(String::as_str), Some(""));
        assert_eq!(output.diagnostics.len(), 1);
    }

    #[test]
    fn test_condition_gates_section() {
        let template = "\
templateId: gated
sections:
  - sectionId: spouse
    order: 1
    condition: $.hasSpouse == true
    fieldMappings:
      Name: spouse.name
";
        let engine = engine(&[("gated", template)]);

        let included = engine
            .generate(
                "gated",
                &json!({"hasSpouse": true, "spouse": {"name": "Alan"}}),
                &json!({}),
            )
            .unwrap();
        assert_eq!(included.sections.len(), 1);

        let skipped = engine
            .generate("gated", &json!({"hasSpouse": false}), &json!({}))
            .unwrap();
        assert!(skipped.sections.is_empty());
    }

    #[test]
    fn test_view_model_sections_carry_data() {
        let engine = engine(&[(
            "vm",
            "\
templateId: vm
sections:
  - sectionId: summary
    type: html
    order: 1
    viewModelType: EnrollmentSummary
",
        )]);
        let data = json!({"plan": {"name": "Gold"}});
        let output = engine.generate("vm", &data, &json!({})).unwrap();
        assert_eq!(output.sections[0].view_model, Some(data));
    }
}
