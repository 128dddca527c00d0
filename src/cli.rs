//! Command-line interface for babelone
//!
//! Argument parsing for the `translate` and `create` commands, plus the
//! console context used to report progress, warnings and errors.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::dispatch::{DispatchOptions, Dispatcher};
use crate::error::{BabelResult, Warning};
use crate::formats::Format;

/// Translate Python package build specifications
#[derive(Debug, Parser)]
#[command(name = "babelone")]
#[command(about = "Translate between setup.py, requirements.txt and pyproject.toml")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Set the working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log filter directive selected by the verbosity flags
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Translate one build specification into another format
    Translate {
        /// Format of the source file (default: inferred)
        #[arg(long = "from", value_enum)]
        from: Option<Format>,

        /// Format of the destination file (default: inferred)
        #[arg(long = "to", value_enum)]
        to: Option<Format>,

        /// File to read
        source: PathBuf,

        /// File to write; overwritten if it exists
        destination: PathBuf,
    },

    /// Create a minimal build specification
    Create {
        /// Format of the new file (default: inferred from its name)
        #[arg(short, long, value_enum)]
        format: Option<Format>,

        /// File to create; must not exist
        output: PathBuf,
    },
}

/// CLI context for managing output and state
#[derive(Debug, Clone)]
pub struct CliContext {
    pub verbose: bool,
    pub quiet: bool,
    pub start_time: Instant,
}

impl CliContext {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            start_time: Instant::now(),
        }
    }

    /// Print info message if not quiet
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{}", message);
        }
    }

    /// Print verbose message if verbose mode enabled
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("{} {}", "verbose:".dimmed(), message.dimmed());
        }
    }

    /// Print warning message
    pub fn warn(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", "warning:".yellow().bold(), message);
        }
    }

    /// Print error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "error:".red().bold(), message);
    }

    /// Print success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", "success:".green().bold(), message);
        }
    }

    /// Get elapsed time since CLI started
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    fn report_warnings(&self, warnings: &[Warning]) {
        for warning in warnings {
            self.warn(&warning.to_string());
        }
    }
}

/// Runs CLI commands and reports their outcome
pub struct TranslationDriver {
    context: CliContext,
}

impl TranslationDriver {
    pub fn new(context: CliContext) -> Self {
        Self { context }
    }

    /// Execute the translate command
    pub fn translate(
        &self,
        source: &Path,
        destination: &Path,
        from: Option<Format>,
        to: Option<Format>,
    ) -> BabelResult<()> {
        self.context.verbose(&format!(
            "Translating {} to {}",
            source.display(),
            destination.display()
        ));

        let dispatcher = Dispatcher::new(DispatchOptions {
            source_format: from,
            destination_format: to,
        });
        let report = dispatcher.translate(source, destination)?;

        self.context.verbose(&format!(
            "Read {} as a {}, wrote a {}",
            source.display(),
            report.source_format,
            report.destination_format
        ));
        self.context.report_warnings(&report.warnings);
        self.context.success(&format!(
            "Translated {} to {} in {:.2?}",
            source.display(),
            destination.display(),
            self.context.elapsed()
        ));
        Ok(())
    }

    /// Execute the create command
    pub fn create(&self, output: &Path, format: Option<Format>) -> BabelResult<()> {
        let dispatcher = Dispatcher::new(DispatchOptions {
            source_format: None,
            destination_format: format,
        });
        let report = dispatcher.create(output)?;

        self.context.verbose(&format!(
            "Package name {:?}, version {:?}",
            report.metadata.name.as_deref().unwrap_or_default(),
            report.metadata.version.as_deref().unwrap_or_default()
        ));
        self.context.report_warnings(&report.warnings);
        self.context.success(&format!(
            "Created {} {}",
            report.format,
            output.display()
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_translate() {
        let cli = Cli::try_parse_from([
            "babelone",
            "-v",
            "translate",
            "--from",
            "setup",
            "--to",
            "pyproject",
            "setup.py",
            "pyproject.toml",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.log_filter(), "debug");
        match cli.command {
            Commands::Translate {
                from,
                to,
                source,
                destination,
            } => {
                assert_eq!(from, Some(Format::Script));
                assert_eq!(to, Some(Format::Manifest));
                assert_eq!(source, PathBuf::from("setup.py"));
                assert_eq!(destination, PathBuf::from("pyproject.toml"));
            }
            other => panic!("Expected translate command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_create() {
        let cli = Cli::try_parse_from(["babelone", "create", "--format", "requirements", "deps", "-q"]).unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.log_filter(), "error");
        match cli.command {
            Commands::Create { format, output } => {
                assert_eq!(format, Some(Format::Requirements));
                assert_eq!(output, PathBuf::from("deps"));
            }
            other => panic!("Expected create command, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["babelone", "create", "--format", "pipfile", "Pipfile"]).is_err());
    }

    #[test]
    fn test_default_log_filter() {
        let cli = Cli::try_parse_from(["babelone", "create", "setup.py"]).unwrap();
        assert_eq!(cli.log_filter(), "warn");
    }
}
