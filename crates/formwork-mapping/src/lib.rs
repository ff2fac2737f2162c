/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Field-mapping strategies for Formwork.
//!
//! This crate turns mapping expressions into field values. It provides:
//!
//! - Four interchangeable strategies behind one dispatcher ([`Strategies`]):
//!   direct dot-path navigation, JSONPath-style queries, JSONata-style
//!   expressions, and named custom transforms composed over the other three
//! - Base-path narrowing: a [`MappingGroup`](formwork_model::MappingGroup)'s
//!   `basePath` is evaluated once and every field in the group resolves
//!   relative to the narrowed context
//! - Repeating-group expansion: one mapping rule becomes N indexed field
//!   names over a collection
//! - Condition evaluation for render/skip decisions
//!
//! # Failure policy
//!
//! Mapping is **total**: a bad expression, an unknown transform, or sparse
//! input degrades to an empty string for that field, a `tracing` warning,
//! and a [`Diagnostic`] — it never aborts the surrounding section. Bulk
//! document generation routinely runs over sparse data, so data-level
//! failures are expected and must stay local.

pub mod condition;
pub mod custom;
pub mod diagnostics;
pub mod direct;
pub mod group;
pub mod jsonata;
pub mod jsonpath;
pub mod strategy;
pub mod value;

pub use condition::should_render;
pub use custom::{TransformContext, TransformRegistry};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use group::{expand_repeating_group, map_group, BaseContext};
pub use strategy::Strategies;
