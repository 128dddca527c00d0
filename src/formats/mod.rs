//! Build specification formats
//!
//! The closed set of file formats babelone reads and writes. Each format
//! parses into [`PackageMetadata`] and renders from it; anything a format
//! cannot express is dropped with a [`Warning`].

use crate::error::{BabelResult, Warning};
use crate::extract;
use crate::metadata::PackageMetadata;
use clap::ValueEnum;
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

pub mod manifest;
pub mod requirements;
pub mod script;

/// A Python package build specification format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Format {
    /// Imperative `setup.py` script
    #[value(name = "setup")]
    Script,
    /// Plain `requirements.txt` list
    Requirements,
    /// Declarative `pyproject.toml` manifest
    #[value(name = "pyproject")]
    Manifest,
}

/// Metadata read from a source file
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub metadata: PackageMetadata,
    pub warnings: Vec<Warning>,
}

/// Output text for a destination file
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub text: String,
    pub warnings: Vec<Warning>,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Script, Format::Requirements, Format::Manifest];

    /// Infer the format from a file name, then from its extension
    pub fn from_path(path: &Path) -> Option<Format> {
        let file_name = path.file_name()?.to_str()?.to_ascii_lowercase();

        if file_name == "setup.py" {
            return Some(Format::Script);
        }
        if file_name == "pyproject.toml" {
            return Some(Format::Manifest);
        }
        if file_name.starts_with("requirements") && file_name.ends_with(".txt") {
            return Some(Format::Requirements);
        }

        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "py" => Some(Format::Script),
            "txt" | "in" => Some(Format::Requirements),
            "toml" => Some(Format::Manifest),
            _ => None,
        }
    }

    /// Guess the format of a file from its contents
    pub fn sniff(contents: &str) -> Option<Format> {
        static MANIFEST_TABLE: OnceLock<Option<Regex>> = OnceLock::new();
        static SCRIPT_IMPORT: OnceLock<Option<Regex>> = OnceLock::new();
        static SETUP_CALL: OnceLock<Option<Regex>> = OnceLock::new();
        static REQUIREMENT_LINE: OnceLock<Option<Regex>> = OnceLock::new();

        if is_match(
            &MANIFEST_TABLE,
            r"(?m)^\s*\[\s*(project|build-system)\s*\]\s*(#.*)?$",
            contents,
        ) {
            return Some(Format::Manifest);
        }

        if is_match(&SCRIPT_IMPORT, r"(?m)^\s*(import|from)\s+[A-Za-z_]", contents)
            && is_match(&SETUP_CALL, r"\bsetup\s*\(", contents)
        {
            return Some(Format::Script);
        }

        let mut clauses = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .peekable();
        if clauses.peek().is_some()
            && clauses.all(|line| {
                is_match(
                    &REQUIREMENT_LINE,
                    r"^([A-Za-z0-9][A-Za-z0-9._-]*\s*(\[[^\]]*\])?\s*([<>=!~;@].*)?|-{1,2}[A-Za-z].*)$",
                    line,
                )
            })
        {
            return Some(Format::Requirements);
        }

        None
    }

    /// Parse source text into metadata
    pub fn parse(self, text: &str) -> BabelResult<Parsed> {
        match self {
            Format::Script => {
                let extraction = extract::extract(text)?;
                Ok(Parsed {
                    metadata: extraction.metadata,
                    warnings: extraction.warnings,
                })
            }
            Format::Requirements => Ok(Parsed {
                metadata: requirements::parse(text),
                warnings: Vec::new(),
            }),
            Format::Manifest => Ok(Parsed {
                metadata: manifest::parse(text)?,
                warnings: Vec::new(),
            }),
        }
    }

    /// Render metadata as the text of a file in this format
    pub fn render(self, metadata: &PackageMetadata) -> BabelResult<Rendered> {
        match self {
            Format::Script => Ok(script::render(metadata)),
            Format::Requirements => Ok(requirements::render(metadata)),
            Format::Manifest => manifest::render(metadata),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Script => "setup script",
            Format::Requirements => "requirements list",
            Format::Manifest => "pyproject manifest",
        };
        write!(f, "{}", name)
    }
}

/// Match against a lazily compiled pattern
fn is_match(cell: &OnceLock<Option<Regex>>, pattern: &str, text: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()
        .is_some_and(|regex| regex.is_match(text))
}

/// Record a field the target format cannot hold
pub(crate) fn drop_field(warnings: &mut Vec<Warning>, field: &str, format: Format) {
    let warning = Warning::not_representable(field, format);
    debug!("{}", warning);
    warnings.push(warning);
}
