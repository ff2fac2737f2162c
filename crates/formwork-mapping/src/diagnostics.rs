/*
 * diagnostics.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Diagnostics for recoverable mapping failures.
//!
//! Mapping is total: failures degrade to empty output rather than errors.
//! The collector records what was degraded so callers can surface it next
//! to the generated document instead of losing it in logs.

use serde::Serialize;

/// Severity of a collected diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// One recoverable degradation observed while mapping a section.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,

    /// Field name the degradation applies to, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    pub message: String,
}

/// Collector for diagnostics during mapping and pagination.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning not tied to a specific field.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.items.push(Diagnostic {
            severity: Severity::Warning,
            field: None,
            message: message.into(),
        });
    }

    /// Record a warning about a specific output field.
    pub fn warn_field(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.items.push(Diagnostic {
            severity: Severity::Warning,
            field: Some(field.into()),
            message: message.into(),
        });
    }

    /// Record an error-severity diagnostic.
    pub fn error(&mut self, message: impl Into<String>) {
        self.items.push(Diagnostic {
            severity: Severity::Error,
            field: None,
            message: message.into(),
        });
    }

    /// Move all diagnostics from another collector into this one.
    pub fn merge(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Whether anything was collected.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Collected diagnostics, in insertion order.
    pub fn items(&self) -> &[Diagnostic] {
        &self.items
    }

    /// Consume the collector and return the diagnostics.
    pub fn into_items(self) -> Vec<Diagnostic> {
        self.items
    }
}
