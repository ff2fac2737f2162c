//! Document-generation pipeline for Formwork.
//!
//! The [`Engine`] ties the other crates together: it resolves a template
//! id (inheritance merge included), walks the resolved sections in order,
//! gates each on its condition, maps field values with the configured
//! strategies, and paginates overflowing collections into addendum
//! payloads.
//!
//! The output — an ordered list of [`SectionOutput`]s plus per-section
//! [`AddendumPage`]s — is what a rendering backend consumes to burn values
//! into a concrete document (a filled form field, an HTML variable, a
//! spreadsheet cell). Rendering itself is out of scope here.
//!
//! # Error shape
//!
//! Identifier-level mistakes (unknown template, unresolved placeholder,
//! corrupt source) fail the whole request with a
//! [`ResolveError`](formwork_resolve::ResolveError). Data-level mistakes
//! degrade to empty values and surface as
//! [`Diagnostic`](formwork_mapping::Diagnostic)s on the output.

pub mod engine;
pub mod output;
pub mod overflow;

pub use engine::Engine;
pub use output::{AddendumPage, GenerationOutput, SectionOutput};
pub use overflow::paginate;

// The engine's fatal error type is the resolver's.
pub use formwork_resolve::{ResolveError, ResolveResult};
