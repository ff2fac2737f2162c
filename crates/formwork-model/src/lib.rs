//! Template and mapping data model for Formwork.
//!
//! This crate defines the types that template documents deserialize into and
//! that the resolver, mapping, and engine crates operate on:
//!
//! - [`TemplateDefinition`]: a raw, possibly-inheriting template as loaded
//!   from a YAML or JSON source
//! - [`SectionSpec`]: one renderable section with its mapping configuration
//! - [`MappingGroup`] / [`RepeatingGroupSpec`] / [`OverflowSpec`]: the
//!   field-mapping, repeating-group, and overflow configuration blocks
//! - [`ResolvedTemplate`]: the fully merged, self-contained template
//!
//! The wire format is part of the compatibility surface: enum literals such
//! as `JSONPATH` and `BEFORE_FIELD` round-trip byte-for-byte, and field
//! order in mapping tables is preserved (via `IndexMap`).
//!
//! Types here are independent of any rendering backend. Conversion of
//! resolved field values into filled forms, HTML variables, or spreadsheet
//! cells happens downstream.

pub mod definition;
pub mod error;
pub mod section;

pub use definition::{ResolvedTemplate, TemplateDefinition};
pub use error::{ParseError, ParseResult};
pub use section::{
    IndexPosition, MappingGroup, MappingType, OverflowSpec, RepeatingGroupSpec, SectionSpec,
};
