//! `requirements.txt` codec
//!
//! One opaque requirement clause per line. Only `install_requires` survives
//! a trip through this format.

use super::{drop_field, Format, Rendered};
use crate::metadata::PackageMetadata;

/// Read one requirement per non-blank, non-comment line
pub fn parse(text: &str) -> PackageMetadata {
    let requires = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    PackageMetadata {
        install_requires: Some(requires),
        ..PackageMetadata::default()
    }
}

/// Write `install_requires`, one line each; everything else is dropped
pub fn render(metadata: &PackageMetadata) -> Rendered {
    let mut text = String::new();
    for requirement in metadata.install_requires.iter().flatten() {
        text.push_str(requirement);
        text.push('\n');
    }

    let mut warnings = Vec::new();
    for field in metadata.populated_fields() {
        if field != "install_requires" {
            drop_field(&mut warnings, field, Format::Requirements);
        }
    }
    for key in metadata.unknown_fields.keys() {
        drop_field(&mut warnings, key, Format::Requirements);
    }

    Rendered { text, warnings }
}
