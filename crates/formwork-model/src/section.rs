//! Section and mapping configuration types.
//!
//! A [`SectionSpec`] describes one renderable unit of a template: which
//! backing template file it uses, where it sorts, whether it renders at all
//! (its `condition`), and how its fields are populated from request data.
//!
//! Field population is configured either as a flat `fieldMappings` table or
//! as a list of [`MappingGroup`]s. Groups add a shared `basePath` (evaluated
//! once and reused for every field in the group) and optional repeating-group
//! expansion over a collection.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The strategy used to evaluate a mapping expression against request data.
///
/// The wire literals (`DIRECT`, `JSONPATH`, `JSONATA`, `CUSTOM`) are part of
/// the template compatibility surface and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MappingType {
    /// Dot-delimited navigation over nested maps and arrays.
    #[default]
    #[serde(rename = "DIRECT")]
    Direct,

    /// JSONPath-style queries with filters, wildcards, slices, deep scan.
    #[serde(rename = "JSONPATH")]
    JsonPath,

    /// JSONata-style expressions with aggregates and conditionals.
    #[serde(rename = "JSONATA")]
    Jsonata,

    /// Registered named transforms composed over the other strategies.
    #[serde(rename = "CUSTOM")]
    Custom,
}

/// Where the item index lands in a synthesized repeating-group field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IndexPosition {
    /// `prefix + index + separator + fieldName + suffix`
    #[default]
    #[serde(rename = "BEFORE_FIELD")]
    BeforeField,

    /// `prefix + fieldName + separator + index + suffix`
    #[serde(rename = "AFTER_FIELD")]
    AfterField,
}

/// One renderable section of a template.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SectionSpec {
    /// Unique id within a resolved template. A child section with the same
    /// id as a base section replaces/merges it during resolution.
    pub section_id: String,

    /// Opaque rendering discriminator (e.g. `acroform`, `html`, `overlay`).
    /// The engine carries it through untouched.
    #[serde(rename = "type")]
    pub section_type: String,

    /// Path of the backing template artifact for the rendering layer.
    pub template_path: String,

    /// Sort key within the resolved template. Ties keep merge-insertion
    /// order (base sections, fragment sections, then the template's own).
    pub order: i32,

    /// Optional render/skip expression, evaluated with this section's
    /// mapping strategy. A false result skips the section entirely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Strategy for `field_mappings` and the section condition. `None`
    /// means "unset": resolution inherits the base template's choice, and
    /// evaluation falls back to [`MappingType::Direct`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping_type: Option<MappingType>,

    /// Flat field-name -> expression table.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub field_mappings: IndexMap<String, String>,

    /// Grouped mappings with shared base paths and repeating groups.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub field_mapping_groups: Vec<MappingGroup>,

    /// Overflow pagination rules for collections that exceed this
    /// section's capacity.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub overflow_configs: Vec<OverflowSpec>,

    /// Opaque view-model discriminator for renderers that consume raw data
    /// payloads instead of flat field maps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_model_type: Option<String>,
}

impl SectionSpec {
    /// True if this section declares any field mappings at all.
    pub fn has_mappings(&self) -> bool {
        !self.field_mappings.is_empty() || !self.field_mapping_groups.is_empty()
    }

    /// The strategy to evaluate this section with (`DIRECT` when unset).
    pub fn effective_mapping_type(&self) -> MappingType {
        self.mapping_type.unwrap_or_default()
    }
}

/// A batch of field expressions sharing one strategy and optional base path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MappingGroup {
    /// Strategy for the base path and every field in this group.
    pub mapping_type: MappingType,

    /// Expression evaluated once to narrow the context for the whole
    /// group. Field expressions are then relative to the narrowed context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,

    /// Field-name -> expression table, relative to `base_path` when set.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, String>,

    /// When set, `base_path` must resolve to a collection and each field
    /// expands into N indexed field names, one per item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeating_group: Option<RepeatingGroupSpec>,
}

/// Rule for expanding one mapping into N indexed field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepeatingGroupSpec {
    /// Prepended to every synthesized field name.
    pub prefix: String,

    /// Appended to every synthesized field name.
    pub suffix: String,

    /// Display index of the first item (template forms are usually 1-based).
    pub start_index: i32,

    /// Separator between the index and the logical field name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_separator: Option<String>,

    /// Whether the index precedes or follows the logical field name.
    pub index_position: IndexPosition,

    /// Upper bound on expanded items. Items beyond the bound are left to
    /// the section's overflow configuration, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,

    /// Logical-field-name -> expression, relative to a single item.
    pub fields: IndexMap<String, String>,
}

impl Default for RepeatingGroupSpec {
    fn default() -> Self {
        RepeatingGroupSpec {
            prefix: String::new(),
            suffix: String::new(),
            start_index: 1,
            index_separator: None,
            index_position: IndexPosition::default(),
            max_items: None,
            fields: IndexMap::new(),
        }
    }
}

/// Rule for paginating a collection that exceeds a section's capacity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OverflowSpec {
    /// Expression locating the collection in the request data.
    pub array_path: String,

    /// Strategy used to evaluate `array_path`.
    pub mapping_type: MappingType,

    /// Capacity of the primary section. Overflow exists iff the collection
    /// is strictly longer than this.
    pub max_items_in_main: usize,

    /// Chunk size for addendum pages. Zero or negative means a single
    /// unbounded addendum page.
    pub items_per_overflow_page: i64,

    /// Template path for rendering each addendum page.
    pub addendum_template_path: String,
}
