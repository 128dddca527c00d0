//! babelone CLI
//!
//! Command-line entry point for translating Python build specifications

use anyhow::{Context, Result};
use clap::Parser;
use std::process;
use tracing_subscriber::EnvFilter;

use babelone::cli::{Cli, CliContext, Commands, TranslationDriver};

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new(cli.log_filter()))
        .init();

    let context = CliContext::new(cli.verbose, cli.quiet);

    if let Err(e) = run(&cli, &context) {
        context.error(&format!("{:#}", e));
        process::exit(1);
    }
}

fn run(cli: &Cli, context: &CliContext) -> Result<()> {
    // Change to specified directory if provided
    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir)
            .with_context(|| format!("Failed to change directory to {:?}", dir))?;
    }

    let driver = TranslationDriver::new(context.clone());

    match &cli.command {
        Commands::Translate {
            from,
            to,
            source,
            destination,
        } => driver
            .translate(source, destination, *from, *to)
            .with_context(|| format!("Could not translate {}", source.display())),

        Commands::Create { format, output } => driver
            .create(output, *format)
            .with_context(|| format!("Could not create {}", output.display())),
    }
}
