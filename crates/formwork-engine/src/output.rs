/*
 * output.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Output payloads handed to the rendering layer.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use formwork_mapping::Diagnostic;
use formwork_model::SectionSpec;

/// One overflow page: a derived data context paired with the template
/// that renders it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddendumPage {
    /// Template path from the section's overflow configuration.
    pub template_path: String,

    /// Shallow copy of the request data plus the overflow chunk and the
    /// addendum bookkeeping keys.
    pub context: Value,
}

/// One rendered-section payload: the section spec plus its flat field
/// values (and, for view-model sections, the raw data payload).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionOutput {
    /// The section as resolved (the renderer needs `type`,
    /// `templatePath`, and friends).
    pub section: SectionSpec,

    /// Mapped field values, in mapping order.
    pub values: IndexMap<String, String>,

    /// Raw data payload for sections with a `viewModelType`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_model: Option<Value>,

    /// Addendum pages produced by this section's overflow configuration.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub addenda: Vec<AddendumPage>,
}

/// The full result of one generation request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutput {
    /// The placeholder-resolved template id that was generated.
    pub template_id: String,

    /// Condition-filtered sections, in resolved order.
    pub sections: Vec<SectionOutput>,

    /// Recoverable degradations observed during mapping and pagination.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}
