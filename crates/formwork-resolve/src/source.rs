/*
 * source.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template byte sources.
//!
//! A [`TemplateSource`] maps a template id to raw document bytes. The
//! resolver parses and caches what comes back, so implementations stay
//! dumb: a directory of files, an in-memory map for tests and bundled
//! templates, or (out of tree) a remote store.

use std::collections::HashMap;
use std::path::PathBuf;

/// Errors a source can produce.
#[derive(Debug)]
pub enum SourceError {
    /// No template bytes exist for the id.
    NotFound,
    /// The bytes exist but could not be read.
    Io(std::io::Error),
}

/// Trait for loading raw template bytes by id.
pub trait TemplateSource: Send + Sync {
    /// Load the raw bytes for a template id.
    fn load(&self, template_id: &str) -> Result<Vec<u8>, SourceError>;
}

/// Source that loads templates from a directory tree.
///
/// An id maps to `<root>/<id>` with the extensions `.yml`, `.yaml`, and
/// `.json` probed in that order; an id that already carries an extension
/// is used as-is.
#[derive(Debug, Clone)]
pub struct FileSystemSource {
    root: PathBuf,
}

impl FileSystemSource {
    /// Create a source rooted at a template directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileSystemSource { root: root.into() }
    }

    fn candidates(&self, template_id: &str) -> Vec<PathBuf> {
        let base = self.root.join(template_id);
        if base.extension().is_some() {
            return vec![base];
        }
        ["yml", "yaml", "json"]
            .iter()
            .map(|ext| base.with_extension(ext))
            .collect()
    }
}

impl TemplateSource for FileSystemSource {
    fn load(&self, template_id: &str) -> Result<Vec<u8>, SourceError> {
        for candidate in self.candidates(template_id) {
            match std::fs::read(&candidate) {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(SourceError::Io(e)),
            }
        }
        Err(SourceError::NotFound)
    }
}

/// Source backed by an in-memory map (tests, bundled templates).
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    templates: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template document under an id.
    pub fn add(&mut self, template_id: impl Into<String>, bytes: impl Into<Vec<u8>>) -> &mut Self {
        self.templates.insert(template_id.into(), bytes.into());
        self
    }

    /// Create a source from `(id, document)` pairs.
    pub fn with_templates(
        templates: impl IntoIterator<Item = (impl Into<String>, impl Into<Vec<u8>>)>,
    ) -> Self {
        let mut source = Self::new();
        for (id, bytes) in templates {
            source.add(id, bytes);
        }
        source
    }
}

impl TemplateSource for MemorySource {
    fn load(&self, template_id: &str) -> Result<Vec<u8>, SourceError> {
        self.templates
            .get(template_id)
            .cloned()
            .ok_or(SourceError::NotFound)
    }
}
