//! Error types for babelone
//!
//! Defines every failure a translation can hit, from parsing a setup script to
//! writing the destination file, plus the non-fatal warnings raised when a
//! target format cannot express part of the metadata.

use crate::formats::Format;
use crate::position::Span;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all babelone operations
#[derive(Debug, Error)]
pub enum BabelError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] ParseError),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Unknown format: cannot infer the build specification format of {0:?}")]
    UnknownFormat(PathBuf),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Refusing to overwrite existing file {0:?}")]
    DestinationExists(PathBuf),

    #[error("No package metadata found in {0:?}")]
    EmptyMetadata(PathBuf),

    #[error("Failed to serialize manifest: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("I/O error on {path:?}: {message}")]
    Io { path: PathBuf, message: String },
}

impl BabelError {
    /// Build an I/O error tagged with the file it happened on
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: error.to_string(),
        }
    }
}

/// Syntax errors in a setup script or manifest document
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ParseError {
    pub span: Span,
    pub kind: ParseErrorKind,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.span, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseErrorKind {
    #[error("Invalid syntax: {message}")]
    InvalidSyntax { message: String },

    #[error("Invalid document: {message}")]
    InvalidDocument { message: String },
}

/// Failures resolving the configuration call of a setup script
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ExtractError {
    pub span: Option<Span>,
    pub kind: ExtractErrorKind,
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "{}: {}", span, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractErrorKind {
    #[error("Unsupported construct in argument `{argument}`: {construct}")]
    UnsupportedConstruct { argument: String, construct: String },

    #[error("Unresolved reference in argument `{argument}`: '{name}' is not assigned before use")]
    UnresolvedReference { argument: String, name: String },

    #[error("No setup() configuration call found")]
    NoConfigurationCallFound,

    #[error("Ambiguous configuration: found {count} setup() calls, expected exactly one")]
    AmbiguousConfigurationCall { count: usize },

    #[error("Field `{field}` is given more than once (via `{argument}`)")]
    DuplicateField { field: String, argument: String },
}

/// Non-fatal findings reported alongside a successful translation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Warning {
    #[error("field `{field}` cannot be represented in {format}; dropped")]
    FieldNotRepresentable { field: String, format: Format },

    #[error("keyword argument `{argument}` ignored: {reason}")]
    ArgumentDropped { argument: String, reason: String },
}

impl Warning {
    pub fn not_representable(field: impl Into<String>, format: Format) -> Self {
        Self::FieldNotRepresentable {
            field: field.into(),
            format,
        }
    }
}

/// Result type alias for babelone operations
pub type BabelResult<T> = Result<T, BabelError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    #[test]
    fn test_parse_error_display_has_location() {
        let error = ParseError {
            span: Span::single(Position::new(4, 2, 30)),
            kind: ParseErrorKind::InvalidSyntax {
                message: "unexpected EOF while parsing".to_string(),
            },
        };
        assert_eq!(
            error.to_string(),
            "4:2-2: Invalid syntax: unexpected EOF while parsing"
        );
    }

    #[test]
    fn test_extract_error_display_without_span() {
        let error = ExtractError {
            span: None,
            kind: ExtractErrorKind::AmbiguousConfigurationCall { count: 2 },
        };
        assert_eq!(
            error.to_string(),
            "Ambiguous configuration: found 2 setup() calls, expected exactly one"
        );
    }

    #[test]
    fn test_warning_names_field_and_format() {
        let warning = Warning::not_representable("extras", Format::Requirements);
        assert_eq!(
            warning.to_string(),
            "field `extras` cannot be represented in requirements list; dropped"
        );
    }
}
