/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Resolution errors.
//!
//! These are the *fatal* failures of the two-tier error policy: they mean
//! the caller asked for the wrong document (bad id, bad placeholder, bad
//! source) and the whole request fails. Data-level mapping failures never
//! appear here — they degrade locally inside the mapping crate.

use formwork_model::ParseError;
use thiserror::Error;

/// Errors raised while resolving a template id.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No template exists under the (placeholder-resolved) id.
    #[error("Template not found: {template_id}")]
    TemplateNotFound { template_id: String },

    /// A `${...}` placeholder in the id had no value in the variable map.
    #[error("Unresolved placeholder '${{{placeholder}}}' in template id '{template_id}'")]
    UnresolvedPlaceholder {
        placeholder: String,
        template_id: String,
    },

    /// The template source bytes failed to parse.
    #[error(transparent)]
    UnsupportedFormat(#[from] ParseError),

    /// A template names itself as an ancestor.
    #[error("Cyclic template inheritance: {}", chain.join(" -> "))]
    CyclicInheritance { chain: Vec<String> },

    /// The template source failed to read.
    #[error("Failed to read template '{template_id}': {source}")]
    Io {
        template_id: String,
        #[source]
        source: std::io::Error,
    },
}

impl ResolveError {
    /// Machine-readable error code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            ResolveError::TemplateNotFound { .. } => "TEMPLATE_NOT_FOUND",
            ResolveError::UnresolvedPlaceholder { .. } => "UNRESOLVED_PLACEHOLDER",
            ResolveError::UnsupportedFormat(parse) => parse.code(),
            ResolveError::CyclicInheritance { .. } => "CYCLIC_TEMPLATE_INHERITANCE",
            ResolveError::Io { .. } => "TEMPLATE_SOURCE_IO",
        }
    }
}

/// Result type for template resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;
