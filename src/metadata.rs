//! Canonical package metadata
//!
//! Every format converts through [`PackageMetadata`]: parsers build one,
//! serializers consume one. Fields are independently optional so that a
//! format which cannot express a field leaves it absent instead of empty.

use indexmap::IndexMap;
use std::fmt;

/// Denotes a Python package dependency, kept as one opaque clause.
///
/// # Examples
/// `"pydantic==2.6.2"`, `"django>2.1; os_name != 'nt'"`
pub type Requirement = String;

/// Extra-group name to requirements, or entry-point category to entries.
pub type GroupedRequirements = IndexMap<String, Vec<Requirement>>;

/// Canonical order of the named fields, used by serializers and diagnostics.
pub const FIELD_NAMES: [&str; 7] = [
    "name",
    "version",
    "author",
    "install_requires",
    "setup_requires",
    "extras",
    "entry_points",
];

/// Literal value of a passthrough field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Str(String),
    Bool(bool),
    List(Vec<FieldValue>),
    Dict(IndexMap<String, FieldValue>),
}

impl FieldValue {
    /// Short description of the value's shape, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Str(_) => "string",
            FieldValue::Bool(_) => "boolean",
            FieldValue::List(_) => "list",
            FieldValue::Dict(_) => "dict",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// View a list made only of strings
    pub fn as_string_list(&self) -> Option<Vec<String>> {
        match self {
            FieldValue::List(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => None,
        }
    }

    /// View a dict whose values are all string lists
    pub fn as_grouped(&self) -> Option<GroupedRequirements> {
        match self {
            FieldValue::Dict(entries) => entries
                .iter()
                .map(|(key, value)| value.as_string_list().map(|list| (key.clone(), list)))
                .collect(),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Str(s) => write!(f, "{:?}", s),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            FieldValue::Dict(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Build metadata of a Python package, independent of the file it came from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub install_requires: Option<Vec<Requirement>>,
    pub setup_requires: Option<Vec<Requirement>>,
    pub extras: Option<GroupedRequirements>,
    pub entry_points: Option<GroupedRequirements>,
    /// Unrecognized setup() keyword arguments, carried for formats that can
    /// pass them through.
    pub unknown_fields: IndexMap<String, FieldValue>,
}

impl PackageMetadata {
    /// Minimal metadata with only a name and a version
    pub fn named(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            version: Some(version.into()),
            ..Self::default()
        }
    }

    /// True if every field is absent or empty
    pub fn is_empty(&self) -> bool {
        self.populated_fields().is_empty() && self.unknown_fields.is_empty()
    }

    /// Names of the populated named fields, in canonical order.
    ///
    /// A field counts as populated when it is present and, for collections,
    /// non-empty.
    pub fn populated_fields(&self) -> Vec<&'static str> {
        let populated = [
            self.name.as_ref().is_some_and(|s| !s.is_empty()),
            self.version.as_ref().is_some_and(|s| !s.is_empty()),
            self.author.as_ref().is_some_and(|s| !s.is_empty()),
            self.install_requires.as_ref().is_some_and(|v| !v.is_empty()),
            self.setup_requires.as_ref().is_some_and(|v| !v.is_empty()),
            self.extras.as_ref().is_some_and(|m| !m.is_empty()),
            self.entry_points.as_ref().is_some_and(|m| !m.is_empty()),
        ];

        FIELD_NAMES
            .iter()
            .zip(populated)
            .filter(|(_, is_populated)| *is_populated)
            .map(|(name, _)| *name)
            .collect()
    }
}
