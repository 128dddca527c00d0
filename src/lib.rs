//! babelone
//!
//! Translates Python package build specifications between `setup.py`,
//! `requirements.txt` and `pyproject.toml`. Setup scripts are read without
//! running them: the module is parsed with `rustpython-parser` and statically
//! evaluated until the single `setup()` call yields its keyword arguments.

pub mod error;
pub mod position;
pub mod metadata;
pub mod extract;
pub mod formats;
pub mod dispatch;
pub mod cli;

// Re-export core types for convenience
pub use error::*;
pub use position::{Position, Span};
pub use metadata::{FieldValue, PackageMetadata};
pub use formats::Format;
pub use extract::{extract, Extraction};
pub use dispatch::{create, translate, DispatchOptions, Dispatcher};
