//! `pyproject.toml` codec
//!
//! Maps the `[project]` and `[build-system]` tables onto package metadata
//! through serde. Keys babelone does not model are ignored on read.

use super::{drop_field, Format, Rendered};
use crate::error::{BabelResult, ParseError, ParseErrorKind};
use crate::metadata::{FieldValue, GroupedRequirements, PackageMetadata};
use crate::position::{Position, Span};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Passthrough key holding `[build-system] build-backend`
pub const BUILD_BACKEND: &str = "build-backend";

const CONSOLE_SCRIPTS: &str = "console_scripts";
const GUI_SCRIPTS: &str = "gui_scripts";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct PyProject {
    #[serde(skip_serializing_if = "Option::is_none")]
    build_system: Option<BuildSystem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<Project>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct BuildSystem {
    #[serde(skip_serializing_if = "Option::is_none")]
    requires: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    build_backend: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Project {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authors: Option<Vec<Author>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dependencies: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    optional_dependencies: Option<IndexMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scripts: Option<IndexMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gui_scripts: Option<IndexMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entry_points: Option<IndexMap<String, IndexMap<String, String>>>,
}

impl Project {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.version.is_none()
            && self.authors.is_none()
            && self.dependencies.is_none()
            && self.optional_dependencies.is_none()
            && self.scripts.is_none()
            && self.gui_scripts.is_none()
            && self.entry_points.is_none()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Author {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

/// Parse a pyproject manifest
pub fn parse(text: &str) -> Result<PackageMetadata, ParseError> {
    let document: PyProject = toml::from_str(text).map_err(|error| document_error(text, &error))?;
    let mut metadata = PackageMetadata::default();

    if let Some(project) = document.project {
        metadata.name = project.name;
        metadata.version = project.version;
        metadata.author = project.authors.and_then(|authors| join_authors(&authors));
        metadata.install_requires = project.dependencies;
        metadata.extras = project.optional_dependencies;

        let mut entry_points = GroupedRequirements::new();
        for (group, table) in [(CONSOLE_SCRIPTS, project.scripts), (GUI_SCRIPTS, project.gui_scripts)] {
            if let Some(table) = table {
                entry_points
                    .entry(group.to_string())
                    .or_default()
                    .extend(join_entries(table));
            }
        }
        for (group, table) in project.entry_points.into_iter().flatten() {
            entry_points.entry(group).or_default().extend(join_entries(table));
        }
        if !entry_points.is_empty() {
            metadata.entry_points = Some(entry_points);
        }
    }

    if let Some(build_system) = document.build_system {
        metadata.setup_requires = build_system.requires;
        if let Some(backend) = build_system.build_backend {
            metadata
                .unknown_fields
                .insert(BUILD_BACKEND.to_string(), FieldValue::Str(backend));
        }
    }

    Ok(metadata)
}

/// Render metadata as a pyproject manifest
pub fn render(metadata: &PackageMetadata) -> BabelResult<Rendered> {
    let mut warnings = Vec::new();

    let mut project = Project {
        name: metadata.name.clone(),
        version: metadata.version.clone(),
        authors: metadata.author.as_ref().map(|author| {
            vec![Author {
                name: Some(author.clone()),
                email: None,
            }]
        }),
        dependencies: metadata.install_requires.clone(),
        optional_dependencies: metadata.extras.clone().filter(|extras| !extras.is_empty()),
        ..Project::default()
    };

    for (group, entries) in metadata.entry_points.iter().flatten() {
        let mut table = IndexMap::new();
        for entry in entries {
            match split_entry(entry) {
                Some((key, value)) if !table.contains_key(&key) => {
                    table.insert(key, value);
                }
                _ => drop_field(
                    &mut warnings,
                    &format!("entry_points.{}[{:?}]", group, entry),
                    Format::Manifest,
                ),
            }
        }
        if table.is_empty() {
            if entries.is_empty() {
                drop_field(&mut warnings, &format!("entry_points.{}", group), Format::Manifest);
            }
            continue;
        }
        match group.as_str() {
            CONSOLE_SCRIPTS => project.scripts = Some(table),
            GUI_SCRIPTS => project.gui_scripts = Some(table),
            _ => {
                project
                    .entry_points
                    .get_or_insert_with(IndexMap::new)
                    .insert(group.clone(), table);
            }
        }
    }

    let mut build_system = BuildSystem {
        requires: metadata.setup_requires.clone(),
        build_backend: None,
    };
    for (key, value) in &metadata.unknown_fields {
        match (key.as_str(), value) {
            (BUILD_BACKEND, FieldValue::Str(backend)) => {
                build_system.build_backend = Some(backend.clone());
            }
            _ => drop_field(&mut warnings, key, Format::Manifest),
        }
    }

    let document = PyProject {
        build_system: (build_system.requires.is_some() || build_system.build_backend.is_some())
            .then_some(build_system),
        project: (!project.is_empty()).then_some(project),
    };

    let text = toml::to_string_pretty(&document)?;
    Ok(Rendered { text, warnings })
}

/// First author's name or email, with further authors joined by ", "
fn join_authors(authors: &[Author]) -> Option<String> {
    let names: Vec<&str> = authors
        .iter()
        .filter_map(|author| author.name.as_deref().or(author.email.as_deref()))
        .filter(|name| !name.is_empty())
        .collect();
    (!names.is_empty()).then(|| names.join(", "))
}

fn join_entries(table: IndexMap<String, String>) -> impl Iterator<Item = String> {
    table
        .into_iter()
        .map(|(key, value)| format!("{} = {}", key, value))
}

/// Split `name = module:object` at the first `=`
fn split_entry(entry: &str) -> Option<(String, String)> {
    let (key, value) = entry.split_once('=')?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

fn document_error(text: &str, error: &toml::de::Error) -> ParseError {
    let span = match error.span() {
        Some(range) => Span::new(
            Position::from_offset(text, range.start),
            Position::from_offset(text, range.end),
        ),
        None => Span::single(Position::start()),
    };
    ParseError {
        span,
        kind: ParseErrorKind::InvalidDocument {
            message: error.message().trim().to_string(),
        },
    }
}
