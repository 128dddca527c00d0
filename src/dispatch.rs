//! Translation between build specification files
//!
//! Resolves the format of each side, runs source text through
//! parse -> [`PackageMetadata`] -> render, and writes the destination
//! atomically so it is never left truncated.

use crate::error::{BabelError, BabelResult, Warning};
use crate::formats::Format;
use crate::metadata::PackageMetadata;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Version written by `create`
pub const DEFAULT_VERSION: &str = "0.1.0";

/// Package name used by `create` when the directory gives none
pub const DEFAULT_NAME: &str = "package";

/// Explicit format overrides, taking precedence over inference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    pub source_format: Option<Format>,
    pub destination_format: Option<Format>,
}

/// Outcome of a successful translation
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationReport {
    pub source_format: Format,
    pub destination_format: Format,
    pub warnings: Vec<Warning>,
}

/// Outcome of a successful `create`
#[derive(Debug, Clone, PartialEq)]
pub struct CreationReport {
    pub format: Format,
    pub metadata: PackageMetadata,
    pub warnings: Vec<Warning>,
}

/// Runs translations with a fixed set of options
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    options: DispatchOptions,
}

impl Dispatcher {
    pub fn new(options: DispatchOptions) -> Self {
        Self { options }
    }

    /// Translate `source` into `destination`, overwriting it if present
    pub fn translate(&self, source: &Path, destination: &Path) -> BabelResult<TranslationReport> {
        let source_format = infer_format(source, self.options.source_format)?;
        let destination_format = infer_format(destination, self.options.destination_format)?;

        if source_format == destination_format {
            return Err(BabelError::Usage(format!(
                "{} and {} are both a {}; nothing to translate",
                source.display(),
                destination.display(),
                source_format
            )));
        }

        let text = fs::read_to_string(source).map_err(|e| BabelError::io(source, e))?;
        let parsed = source_format.parse(&text)?;
        if parsed.metadata.is_empty() {
            return Err(BabelError::EmptyMetadata(source.to_path_buf()));
        }

        let rendered = destination_format.render(&parsed.metadata)?;
        write_atomically(destination, &rendered.text, true)?;

        let mut warnings = parsed.warnings;
        warnings.extend(rendered.warnings);

        info!(
            source = %source.display(),
            destination = %destination.display(),
            from = %source_format,
            to = %destination_format,
            warnings = warnings.len(),
            "translation written"
        );

        Ok(TranslationReport {
            source_format,
            destination_format,
            warnings,
        })
    }

    /// Write a minimal specification to `destination`, which must not exist
    pub fn create(&self, destination: &Path) -> BabelResult<CreationReport> {
        if destination.exists() {
            return Err(BabelError::DestinationExists(destination.to_path_buf()));
        }

        let format = infer_format(destination, self.options.destination_format)?;
        let metadata = PackageMetadata::named(default_package_name(destination), DEFAULT_VERSION);
        let rendered = format.render(&metadata)?;
        write_atomically(destination, &rendered.text, false)?;

        info!(
            destination = %destination.display(),
            format = %format,
            "specification created"
        );

        Ok(CreationReport {
            format,
            metadata,
            warnings: rendered.warnings,
        })
    }
}

/// Translate with the given options
pub fn translate(
    source: &Path,
    destination: &Path,
    options: DispatchOptions,
) -> BabelResult<TranslationReport> {
    Dispatcher::new(options).translate(source, destination)
}

/// Create a new specification with the given options
pub fn create(destination: &Path, options: DispatchOptions) -> BabelResult<CreationReport> {
    Dispatcher::new(options).create(destination)
}

/// Explicit override, then file name, then file contents
pub fn infer_format(path: &Path, explicit: Option<Format>) -> BabelResult<Format> {
    if let Some(format) = explicit {
        return Ok(format);
    }

    if let Some(format) = Format::from_path(path) {
        debug!(path = %path.display(), format = %format, "format inferred from file name");
        return Ok(format);
    }

    let sniffed = fs::read_to_string(path)
        .ok()
        .and_then(|contents| Format::sniff(&contents));
    match sniffed {
        Some(format) => {
            debug!(path = %path.display(), format = %format, "format inferred from contents");
            Ok(format)
        }
        None => Err(BabelError::UnknownFormat(path.to_path_buf())),
    }
}

/// Package name derived from the directory that will hold `destination`
pub fn default_package_name(destination: &Path) -> String {
    let directory = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let directory_name = fs::canonicalize(&directory)
        .ok()
        .and_then(|dir| dir.file_name().map(|name| name.to_string_lossy().into_owned()))
        .or_else(|| {
            directory
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        });

    directory_name
        .map(|name| normalize_package_name(&name))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_NAME.to_string())
}

/// Lowercase, with whitespace and underscores turned into dashes
fn normalize_package_name(name: &str) -> String {
    let normalized: String = name
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_whitespace() || ch == '_' {
                '-'
            } else {
                ch
            }
        })
        .collect::<String>()
        .to_lowercase();
    normalized.trim_matches('-').to_string()
}

/// Write through a temporary file in the destination directory, then rename
fn write_atomically(path: &Path, contents: &str, overwrite: bool) -> BabelResult<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(directory).map_err(|e| BabelError::io(directory, e))?;
    file.write_all(contents.as_bytes())
        .and_then(|_| file.as_file().sync_all())
        .map_err(|e| BabelError::io(path, e))?;

    if overwrite {
        file.persist(path).map_err(|e| BabelError::io(path, e.error))?;
    } else {
        file.persist_noclobber(path).map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                BabelError::DestinationExists(path.to_path_buf())
            } else {
                BabelError::io(path, e.error)
            }
        })?;
    }

    debug!(path = %path.display(), bytes = contents.len(), "file written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_package_name() {
        assert_eq!(normalize_package_name("My Project"), "my-project");
        assert_eq!(normalize_package_name("spam_eggs"), "spam-eggs");
        assert_eq!(normalize_package_name("  _hidden_  "), "hidden");
        assert_eq!(normalize_package_name("___"), "");
    }

    #[test]
    fn test_default_package_name_from_directory() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("Spam_Eggs App");
        fs::create_dir(&project).unwrap();
        assert_eq!(default_package_name(&project.join("setup.py")), "spam-eggs-app");
    }

    #[test]
    fn test_default_package_name_fallback() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("___");
        fs::create_dir(&project).unwrap();
        assert_eq!(default_package_name(&project.join("setup.py")), DEFAULT_NAME);
    }

    #[test]
    fn test_infer_format_precedence() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("deps.cfg");
        fs::write(&path, "httpx\nfastapi>=0.100\n").unwrap();

        assert_eq!(
            infer_format(&path, Some(Format::Manifest)).unwrap(),
            Format::Manifest
        );
        assert_eq!(infer_format(&path, None).unwrap(), Format::Requirements);
        assert_eq!(
            infer_format(Path::new("setup.py"), None).unwrap(),
            Format::Script
        );

        match infer_format(&temp.path().join("missing.cfg"), None) {
            Err(BabelError::UnknownFormat(path)) => assert!(path.ends_with("missing.cfg")),
            other => panic!("Expected UnknownFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_write_atomically_respects_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.txt");

        write_atomically(&path, "first\n", false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\n");

        match write_atomically(&path, "second\n", false) {
            Err(BabelError::DestinationExists(_)) => {}
            other => panic!("Expected DestinationExists, got {:?}", other),
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\n");

        write_atomically(&path, "third\n", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "third\n");
    }
}
