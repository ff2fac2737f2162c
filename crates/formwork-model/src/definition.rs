//! Template definition and resolved-template types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::error::{ParseError, ParseResult};
use crate::section::SectionSpec;

/// A raw, possibly-inheriting template as loaded from a YAML or JSON source.
///
/// Definitions are immutable once parsed. Inheritance (`base_template_id`),
/// fragment inclusion, and section exclusion/override are resolved by the
/// resolver crate, which produces a self-contained [`ResolvedTemplate`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateDefinition {
    /// Identifier this definition is loaded and cached under.
    pub template_id: String,

    /// Optional parent template to inherit sections from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_template_id: Option<String>,

    /// This template's own sections, in authored order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<SectionSpec>,

    /// Base-template section ids dropped during resolution.
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub excluded_sections: BTreeSet<String>,

    /// Legacy section-id -> template-path overrides. Applied to a base
    /// section only when no child section with the same id exists.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub section_overrides: IndexMap<String, String>,

    /// Fragment template ids whose sections are appended during resolution.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub included_fragments: Vec<String>,

    /// Opaque header/footer configuration, inherited from the base template
    /// when the child defines none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_footer_config: Option<Value>,

    /// Opaque metadata carried through resolution untouched.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, Value>,
}

impl TemplateDefinition {
    /// Parse a definition from raw bytes, sniffing the format.
    ///
    /// A leading `{` means JSON; anything else is read as YAML. A failed
    /// parse in either format is an unsupported-format error, which the
    /// resolver surfaces as a fatal request failure.
    pub fn parse(bytes: &[u8]) -> ParseResult<TemplateDefinition> {
        let text = std::str::from_utf8(bytes).map_err(|e| ParseError::UnsupportedFormat {
            detail: format!("template source is not valid UTF-8: {e}"),
        })?;
        match text.trim_start().as_bytes().first() {
            Some(b'{') => Self::from_json(text),
            _ => Self::from_yaml(text),
        }
    }

    /// Parse a definition from a JSON document.
    pub fn from_json(text: &str) -> ParseResult<TemplateDefinition> {
        serde_json::from_str(text).map_err(|e| ParseError::UnsupportedFormat {
            detail: format!("invalid JSON template: {e}"),
        })
    }

    /// Parse a definition from a YAML document.
    pub fn from_yaml(text: &str) -> ParseResult<TemplateDefinition> {
        serde_yaml::from_str(text).map_err(|e| ParseError::UnsupportedFormat {
            detail: format!("invalid YAML template: {e}"),
        })
    }

    /// True if this definition stands alone (no inheritance or fragments).
    pub fn is_self_contained(&self) -> bool {
        self.base_template_id.is_none() && self.included_fragments.is_empty()
    }
}

/// A fully merged, self-contained template.
///
/// Produced by the resolver: sections are deduplicated by id, sorted by
/// `order` (stable, insertion-order ties), and carry no remaining base or
/// fragment references. Cached by `template_id` and shared across requests,
/// so it is never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTemplate {
    /// The (placeholder-resolved) id this template is cached under.
    pub template_id: String,

    /// Ordered, deduplicated sections.
    pub sections: Vec<SectionSpec>,

    /// Header/footer configuration after base inheritance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_footer_config: Option<Value>,

    /// Metadata of the requested template (not merged from bases).
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub metadata: IndexMap<String, Value>,
}

impl ResolvedTemplate {
    /// Look up a section by id.
    pub fn section(&self, section_id: &str) -> Option<&SectionSpec> {
        self.sections.iter().find(|s| s.section_id == section_id)
    }
}
