//! End-to-end tests for translate and create
//!
//! Each test works in its own temporary directory and checks both the
//! written file and the reported warnings.

use babelone::dispatch::{create, translate, DispatchOptions, DEFAULT_VERSION};
use babelone::error::{BabelError, Warning};
use babelone::formats::Format;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Copy a fixture into `dir`, returning its new path
fn copy_fixture(dir: &Path, name: &str, as_name: &str) -> PathBuf {
    let source = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    let target = dir.join(as_name);
    fs::copy(&source, &target).expect("Failed to copy fixture");
    target
}

fn dropped_fields(warnings: &[Warning]) -> Vec<&str> {
    warnings
        .iter()
        .filter_map(|warning| match warning {
            Warning::FieldNotRepresentable { field, .. } => Some(field.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_setup_script_to_manifest() {
    let temp = TempDir::new().unwrap();
    let source = copy_fixture(temp.path(), "setup.py", "setup.py");
    let destination = temp.path().join("pyproject.toml");

    let report = translate(&source, &destination, DispatchOptions::default()).unwrap();
    assert_eq!(report.source_format, Format::Script);
    assert_eq!(report.destination_format, Format::Manifest);
    assert!(report.warnings.is_empty());

    let parsed = Format::Manifest
        .parse(&fs::read_to_string(&destination).unwrap())
        .unwrap();
    let metadata = parsed.metadata;
    assert_eq!(metadata.name.as_deref(), Some("babelone-test"));
    assert_eq!(metadata.version.as_deref(), Some("2.0"));
    assert_eq!(metadata.author.as_deref(), Some("Rahul D. Ghosal"));
    assert_eq!(
        metadata.install_requires,
        Some(vec!["pydantic==2.6.2".to_string(), "fastapi".to_string()])
    );
    assert!(metadata.setup_requires.is_none());
}

#[test]
fn test_manifest_to_setup_script() {
    let temp = TempDir::new().unwrap();
    let source = copy_fixture(temp.path(), "pyproject.toml", "pyproject.toml");
    let destination = temp.path().join("setup.py");

    let report = translate(&source, &destination, DispatchOptions::default()).unwrap();
    assert_eq!(dropped_fields(&report.warnings), vec!["build-backend"]);

    let expected = r#""""Installation configuration and package metadata for spam-eggs."""
from setuptools import setup


if __name__ == "__main__":
    setup(
        package_name="spam-eggs",
        version="2020.0.0",
        install_requires=["httpx", "gidgethub[httpx]>4.0.0", "django>2.1; os_name != 'nt'", "django>2.0; os_name == 'nt'"],
        setup_requires=["hatchling"],
        extra_requires={"cli": ["rich", "click"], "gui": ["PyQt5"]},
        entry_points={"console_scripts": ["spam-cli = spam:main_cli"], "gui_scripts": ["spam-gui = spam:main_gui"]},
    )
"#;
    assert_eq!(fs::read_to_string(&destination).unwrap(), expected);
}

#[test]
fn test_manifest_to_requirements_is_lossy() {
    let temp = TempDir::new().unwrap();
    let source = copy_fixture(temp.path(), "pyproject.toml", "pyproject.toml");
    let destination = temp.path().join("requirements.txt");

    let report = translate(&source, &destination, DispatchOptions::default()).unwrap();
    assert_eq!(
        fs::read_to_string(&destination).unwrap(),
        "httpx\ngidgethub[httpx]>4.0.0\ndjango>2.1; os_name != 'nt'\ndjango>2.0; os_name == 'nt'\n"
    );
    assert_eq!(
        dropped_fields(&report.warnings),
        vec![
            "name",
            "version",
            "setup_requires",
            "extras",
            "entry_points",
            "build-backend"
        ]
    );
}

#[test]
fn test_requirements_to_manifest() {
    let temp = TempDir::new().unwrap();
    let source = copy_fixture(temp.path(), "requirements.txt", "requirements-dev.txt");
    let destination = temp.path().join("pyproject.toml");

    let report = translate(&source, &destination, DispatchOptions::default()).unwrap();
    assert_eq!(report.source_format, Format::Requirements);
    assert!(report.warnings.is_empty());

    let metadata = Format::Manifest
        .parse(&fs::read_to_string(&destination).unwrap())
        .unwrap()
        .metadata;
    assert_eq!(
        metadata.install_requires,
        Some(vec![
            "pydantic==2.6.2".to_string(),
            "fastapi".to_string(),
            "django>2.1; os_name != 'nt'".to_string(),
        ])
    );
    assert!(metadata.name.is_none());
}

#[test]
fn test_explicit_formats_override_file_names() {
    let temp = TempDir::new().unwrap();
    let source = copy_fixture(temp.path(), "requirements.txt", "deps.lock");
    let destination = temp.path().join("build.cfg");

    let options = DispatchOptions {
        source_format: Some(Format::Requirements),
        destination_format: Some(Format::Script),
    };
    let report = translate(&source, &destination, options).unwrap();
    assert_eq!(report.destination_format, Format::Script);

    let text = fs::read_to_string(&destination).unwrap();
    assert!(text.contains("install_requires=[\"pydantic==2.6.2\", \"fastapi\", \"django>2.1; os_name != 'nt'\"],"));
}

#[test]
fn test_same_format_is_a_usage_error() {
    let temp = TempDir::new().unwrap();
    let source = copy_fixture(temp.path(), "requirements.txt", "requirements.txt");
    let destination = temp.path().join("requirements-copy.txt");

    match translate(&source, &destination, DispatchOptions::default()) {
        Err(BabelError::Usage(_)) => {}
        other => panic!("Expected usage error, got {:?}", other),
    }
    assert!(!destination.exists());
}

#[test]
fn test_unknown_format() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("notes.cfg");
    fs::write(&source, "This file is not a build specification.\nIt has prose in it.\n").unwrap();

    match translate(&source, &temp.path().join("setup.py"), DispatchOptions::default()) {
        Err(BabelError::UnknownFormat(path)) => assert_eq!(path, source),
        other => panic!("Expected UnknownFormat, got {:?}", other),
    }
}

#[test]
fn test_empty_source_is_rejected() {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("requirements.txt");
    fs::write(&source, "# nothing pinned yet\n\n").unwrap();
    let destination = temp.path().join("pyproject.toml");

    match translate(&source, &destination, DispatchOptions::default()) {
        Err(BabelError::EmptyMetadata(path)) => assert_eq!(path, source),
        other => panic!("Expected EmptyMetadata, got {:?}", other),
    }
    assert!(!destination.exists());
}

#[test]
fn test_missing_source_is_an_io_error() {
    let temp = TempDir::new().unwrap();
    match translate(
        &temp.path().join("setup.py"),
        &temp.path().join("pyproject.toml"),
        DispatchOptions::default(),
    ) {
        Err(BabelError::Io { path, .. }) => assert!(path.ends_with("setup.py")),
        other => panic!("Expected I/O error, got {:?}", other),
    }
}

#[test]
fn test_failed_translation_leaves_destination_untouched() {
    let temp = TempDir::new().unwrap();
    let source = copy_fixture(temp.path(), "setup_dynamic.py", "setup.py");
    let destination = temp.path().join("pyproject.toml");
    fs::write(&destination, "[project]\nname = \"keep-me\"\n").unwrap();

    match translate(&source, &destination, DispatchOptions::default()) {
        Err(BabelError::Extract(error)) => assert!(error.to_string().contains("`name`")),
        other => panic!("Expected extraction error, got {:?}", other),
    }
    assert_eq!(
        fs::read_to_string(&destination).unwrap(),
        "[project]\nname = \"keep-me\"\n"
    );
}

#[test]
fn test_translate_overwrites_destination() {
    let temp = TempDir::new().unwrap();
    let source = copy_fixture(temp.path(), "setup.py", "setup.py");
    let destination = temp.path().join("requirements.txt");
    fs::write(&destination, "stale\n").unwrap();

    translate(&source, &destination, DispatchOptions::default()).unwrap();
    assert_eq!(
        fs::read_to_string(&destination).unwrap(),
        "pydantic==2.6.2\nfastapi\n"
    );
}

#[test]
fn test_create_uses_directory_name() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("My_Project");
    fs::create_dir(&project).unwrap();
    let destination = project.join("pyproject.toml");

    let report = create(&destination, DispatchOptions::default()).unwrap();
    assert_eq!(report.format, Format::Manifest);
    assert_eq!(report.metadata.name.as_deref(), Some("my-project"));
    assert!(report.warnings.is_empty());

    let metadata = Format::Manifest
        .parse(&fs::read_to_string(&destination).unwrap())
        .unwrap()
        .metadata;
    assert_eq!(metadata.name.as_deref(), Some("my-project"));
    assert_eq!(metadata.version.as_deref(), Some(DEFAULT_VERSION));
}

#[test]
fn test_create_setup_script_is_extractable() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("spam");
    fs::create_dir(&project).unwrap();
    let destination = project.join("setup.py");

    create(&destination, DispatchOptions::default()).unwrap();
    let parsed = Format::Script
        .parse(&fs::read_to_string(&destination).unwrap())
        .unwrap();
    assert_eq!(parsed.metadata.name.as_deref(), Some("spam"));
    assert_eq!(parsed.metadata.version.as_deref(), Some(DEFAULT_VERSION));
}

#[test]
fn test_create_requirements_drops_name_and_version() {
    let temp = TempDir::new().unwrap();
    let destination = temp.path().join("requirements.txt");

    let report = create(&destination, DispatchOptions::default()).unwrap();
    assert_eq!(fs::read_to_string(&destination).unwrap(), "");
    assert_eq!(dropped_fields(&report.warnings), vec!["name", "version"]);
}

#[test]
fn test_create_refuses_existing_file() {
    let temp = TempDir::new().unwrap();
    let destination = temp.path().join("setup.py");
    fs::write(&destination, "# hand written\n").unwrap();

    match create(&destination, DispatchOptions::default()) {
        Err(BabelError::DestinationExists(path)) => assert_eq!(path, destination),
        other => panic!("Expected DestinationExists, got {:?}", other),
    }
    assert_eq!(fs::read_to_string(&destination).unwrap(), "# hand written\n");
}

#[test]
fn test_create_with_unknown_name_needs_a_format() {
    let temp = TempDir::new().unwrap();
    let destination = temp.path().join("package.cfg");

    match create(&destination, DispatchOptions::default()) {
        Err(BabelError::UnknownFormat(_)) => {}
        other => panic!("Expected UnknownFormat, got {:?}", other),
    }

    let options = DispatchOptions {
        source_format: None,
        destination_format: Some(Format::Manifest),
    };
    let report = create(&destination, options).unwrap();
    assert_eq!(report.format, Format::Manifest);
    assert!(destination.exists());
}
