//! Parse errors for template sources.

use thiserror::Error;

/// Errors raised while parsing a template document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The source bytes were not a parseable YAML or JSON template.
    #[error("Unsupported template format: {detail}")]
    UnsupportedFormat { detail: String },
}

impl ParseError {
    /// Machine-readable error code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
        }
    }
}

/// Result type for template parsing.
pub type ParseResult<T> = Result<T, ParseError>;
