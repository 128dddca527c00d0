//! Symbol table for name resolution
//!
//! Records the top-level bindings of a setup script in source order. A
//! binding either holds a resolved literal, remembers why it could not be
//! resolved, or marks an import of the configuration function or module.

use crate::error::{ExtractError, ExtractErrorKind};
use crate::metadata::FieldValue;
use crate::position::Span;
use indexmap::IndexMap;

/// Reason a value could not be resolved, independent of which argument
/// ends up referencing it
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    Unsupported { construct: String },
    Unresolved { name: String },
}

impl Failure {
    pub fn unsupported(construct: impl Into<String>) -> Self {
        Self::Unsupported {
            construct: construct.into(),
        }
    }

    /// Attach the failure to the keyword argument that needed the value
    pub fn into_error(self, argument: &str, span: Span) -> ExtractError {
        let kind = match self {
            Failure::Unsupported { construct } => ExtractErrorKind::UnsupportedConstruct {
                argument: argument.to_string(),
                construct,
            },
            Failure::Unresolved { name } => ExtractErrorKind::UnresolvedReference {
                argument: argument.to_string(),
                name,
            },
        };
        ExtractError {
            span: Some(span),
            kind,
        }
    }
}

/// What a top-level name is bound to
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Value(FieldValue),
    Failed(Failure),
    /// `from setuptools import setup as <name>`
    SetupFunction,
    /// `import setuptools as <name>`
    SetupModule,
}

/// Flat table of top-level bindings
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    bindings: IndexMap<String, Binding>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a name, replacing any earlier binding
    pub fn bind(&mut self, name: impl Into<String>, binding: Binding) {
        self.bindings.insert(name.into(), binding);
    }

    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }
}
