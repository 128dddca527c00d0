//! `setup.py` emitter
//!
//! Renders metadata as a normalized setup script: a docstring, the setuptools
//! import and one guarded `setup()` call with a keyword argument per line.
//! Reading scripts back is the extractor's job.

use super::{drop_field, Format, Rendered};
use crate::extract::Field;
use crate::metadata::{FieldValue, GroupedRequirements, PackageMetadata};

/// Render metadata as a setup script
pub fn render(metadata: &PackageMetadata) -> Rendered {
    let mut warnings = Vec::new();
    let mut arguments: Vec<(&str, String)> = Vec::new();

    if let Some(name) = &metadata.name {
        arguments.push(("package_name", quote(name)));
    }
    if let Some(version) = &metadata.version {
        arguments.push(("version", quote(version)));
    }
    if let Some(author) = &metadata.author {
        arguments.push(("author", quote(author)));
    }
    if let Some(requires) = &metadata.install_requires {
        arguments.push(("install_requires", string_list(requires)));
    }
    if let Some(requires) = &metadata.setup_requires {
        arguments.push(("setup_requires", string_list(requires)));
    }
    if let Some(extras) = &metadata.extras {
        arguments.push(("extra_requires", grouped(extras)));
    }
    if let Some(entry_points) = &metadata.entry_points {
        arguments.push(("entry_points", grouped(entry_points)));
    }

    for (key, value) in &metadata.unknown_fields {
        if is_identifier(key) && Field::from_keyword(key).is_none() {
            arguments.push((key.as_str(), literal(value)));
        } else {
            drop_field(&mut warnings, key, Format::Script);
        }
    }

    let subject = match metadata.name.as_deref() {
        Some(name) if !name.is_empty() => format!(" for {}", escape(name)),
        _ => String::new(),
    };

    let mut text = format!(
        "\"\"\"Installation configuration and package metadata{}.\"\"\"\n",
        subject
    );
    text.push_str("from setuptools import setup\n\n\n");
    text.push_str("if __name__ == \"__main__\":\n");
    text.push_str("    setup(\n");
    for (keyword, value) in &arguments {
        text.push_str(&format!("        {}={},\n", keyword, value));
    }
    text.push_str("    )\n");

    Rendered { text, warnings }
}

/// Escape text for use inside a double-quoted Python string
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if c.is_control() => escaped.push_str(&format!("\\x{:02x}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}

fn quote(value: &str) -> String {
    format!("\"{}\"", escape(value))
}

fn string_list(items: &[String]) -> String {
    let items: Vec<String> = items.iter().map(|item| quote(item)).collect();
    format!("[{}]", items.join(", "))
}

fn grouped(groups: &GroupedRequirements) -> String {
    let entries: Vec<String> = groups
        .iter()
        .map(|(key, items)| format!("{}: {}", quote(key), string_list(items)))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

/// Flattened Python literal for a passthrough value
fn literal(value: &FieldValue) -> String {
    match value {
        FieldValue::Str(s) => quote(s),
        FieldValue::Bool(true) => "True".to_string(),
        FieldValue::Bool(false) => "False".to_string(),
        FieldValue::List(items) => {
            let items: Vec<String> = items.iter().map(literal).collect();
            format!("[{}]", items.join(", "))
        }
        FieldValue::Dict(entries) => {
            let entries: Vec<String> = entries
                .iter()
                .map(|(key, value)| format!("{}: {}", quote(key), literal(value)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Reserved words that cannot name a keyword argument
const PYTHON_KEYWORDS: [&str; 35] = [
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// A non-keyword Python identifier, usable as a keyword argument name
fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    let starts_well = matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_alphanumeric() || c == '_')
        && !PYTHON_KEYWORDS.contains(&key)
}
