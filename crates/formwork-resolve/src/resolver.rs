/*
 * resolver.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The template resolver.
//!
//! Owns the two shared caches (raw definitions, resolved templates) and
//! the recursive resolution algorithm. See the crate docs for the
//! end-to-end shape.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use formwork_model::{ResolvedTemplate, SectionSpec, TemplateDefinition};

use crate::cache::{CacheStore, MemoryCache};
use crate::error::{ResolveError, ResolveResult};
use crate::merge;
use crate::placeholder::resolve_placeholders;
use crate::source::{SourceError, TemplateSource};

/// Resolves template ids into immutable, cached [`ResolvedTemplate`]s.
pub struct TemplateResolver {
    source: Arc<dyn TemplateSource>,
    definitions: Arc<dyn CacheStore<TemplateDefinition>>,
    resolved: Arc<dyn CacheStore<ResolvedTemplate>>,
}

impl TemplateResolver {
    /// Create a resolver with in-memory single-flight caches.
    pub fn new(source: Arc<dyn TemplateSource>) -> Self {
        Self::with_caches(
            source,
            Arc::new(MemoryCache::new()),
            Arc::new(MemoryCache::new()),
        )
    }

    /// Create a resolver with caller-provided cache stores.
    pub fn with_caches(
        source: Arc<dyn TemplateSource>,
        definitions: Arc<dyn CacheStore<TemplateDefinition>>,
        resolved: Arc<dyn CacheStore<ResolvedTemplate>>,
    ) -> Self {
        TemplateResolver {
            source,
            definitions,
            resolved,
        }
    }

    /// Resolve a template id (placeholders included) to a merged template.
    pub fn resolve(
        &self,
        template_id: &str,
        variables: &Value,
    ) -> ResolveResult<Arc<ResolvedTemplate>> {
        let mut chain = Vec::new();
        self.resolve_inner(template_id, variables, &mut chain)
    }

    /// Administrative cache flush.
    ///
    /// Clears both the resolved-template and raw-definition caches so the
    /// next request re-fetches from the source.
    pub fn invalidate(&self) {
        debug!("invalidating template caches");
        self.resolved.invalidate();
        self.definitions.invalidate();
    }

    fn resolve_inner(
        &self,
        requested: &str,
        variables: &Value,
        chain: &mut Vec<String>,
    ) -> ResolveResult<Arc<ResolvedTemplate>> {
        let template_id = resolve_placeholders(requested, variables)?;

        // The ancestor chain catches cycles before the cache would
        // deadlock on a self-referential key.
        if chain.iter().any(|ancestor| *ancestor == template_id) {
            let mut cycle = chain.clone();
            cycle.push(template_id);
            return Err(ResolveError::CyclicInheritance { chain: cycle });
        }

        chain.push(template_id.clone());
        let result = self.resolved.get_or_try_init(&template_id, &mut || {
            debug!(template_id = template_id.as_str(), "resolving template");
            self.build(&template_id, variables, chain)
        });
        chain.pop();
        result
    }

    /// Build a resolved template from its definition (cache miss path).
    fn build(
        &self,
        template_id: &str,
        variables: &Value,
        chain: &mut Vec<String>,
    ) -> ResolveResult<ResolvedTemplate> {
        let definition = self.load_definition(template_id)?;

        let (base_sections, base_header_footer) = match &definition.base_template_id {
            Some(base_id) => {
                let base = self.resolve_inner(base_id, variables, chain)?;
                (base.sections.clone(), base.header_footer_config.clone())
            }
            None => (Vec::new(), None),
        };

        let mut fragment_sections: Vec<SectionSpec> = Vec::new();
        for fragment_id in &definition.included_fragments {
            let fragment = self.resolve_inner(fragment_id, variables, chain)?;
            fragment_sections.extend(fragment.sections.iter().cloned());
        }

        let sections = merge::merge_template(base_sections, &definition, fragment_sections);

        Ok(ResolvedTemplate {
            template_id: template_id.to_string(),
            sections,
            header_footer_config: definition
                .header_footer_config
                .clone()
                .or(base_header_footer),
            metadata: definition.metadata.clone(),
        })
    }

    fn load_definition(&self, template_id: &str) -> ResolveResult<Arc<TemplateDefinition>> {
        self.definitions.get_or_try_init(template_id, &mut || {
            debug!(template_id, "fetching template definition");
            let bytes = self.source.load(template_id).map_err(|e| match e {
                SourceError::NotFound => ResolveError::TemplateNotFound {
                    template_id: template_id.to_string(),
                },
                SourceError::Io(source) => ResolveError::Io {
                    template_id: template_id.to_string(),
                    source,
                },
            })?;
            Ok(TemplateDefinition::parse(&bytes)?)
        })
    }
}
