/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template resolution for Formwork.
//!
//! This crate turns a template id into an immutable, fully merged
//! [`ResolvedTemplate`](formwork_model::ResolvedTemplate):
//!
//! 1. `${dotted.path}` placeholders in the id resolve against the caller's
//!    variable map (an unresolved placeholder is a hard failure — loading
//!    the wrong template silently is worse than failing the request)
//! 2. the raw [`TemplateDefinition`](formwork_model::TemplateDefinition)
//!    loads from a [`TemplateSource`] behind a compute-once cache
//! 3. base templates resolve recursively and deep-merge with the child's
//!    sections; fragments append their sections; the result sorts stably
//!    by section order
//! 4. the resolved template caches by its placeholder-resolved id
//!
//! Both caches are injected [`CacheStore`] implementations with a per-key
//! single-flight contract: N concurrent requests for a cold id trigger one
//! fetch, and a failed fetch never populates the cache.

pub mod cache;
pub mod error;
pub mod merge;
pub mod placeholder;
pub mod resolver;
pub mod source;

pub use cache::{CacheStore, MemoryCache, NoopCache};
pub use error::{ResolveError, ResolveResult};
pub use placeholder::resolve_placeholders;
pub use resolver::TemplateResolver;
pub use source::{FileSystemSource, MemorySource, SourceError, TemplateSource};
