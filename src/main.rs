//! `header-checkr`: check source file headers for approved licenses.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Load config ([`header_checkr::config::load_config`]) and apply CLI overrides.
//! 3. Build the license registry; optionally list it and exit.
//! 4. Evaluate every file header in parallel.
//! 5. Render the requested report ([`report`]).
//! 6. Exit `0` (all approved) or `1` (at least one file unapproved or unknown).

mod cli;
mod report;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use cli::{Cli, ReportFormat};
use header_checkr::config::load_config;
use header_checkr::{AnalysisError, FileDocument, HeaderAnalyser};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log_level)?)
        .with_writer(std::io::stderr)
        .init();

    let cwd = std::env::current_dir()?;
    let mut config = load_config(&cwd, cli.config.as_deref())?;

    // CLI overrides
    if cli.no_default_licenses {
        config.licenses.defaults = false;
    }
    config
        .licenses
        .definitions
        .extend(cli.licenses.iter().map(|p| cwd.join(p)));
    if let Some(max_lines) = cli.max_lines {
        config.header.max_lines = max_lines;
    }

    let registry = Arc::new(config.build_registry()?);

    if let Some(filter) = cli.list_licenses {
        report::terminal::render_licenses(&registry, filter.into());
        return Ok(());
    }
    if let Some(filter) = cli.list_families {
        report::terminal::render_families(&registry, filter.into());
        return Ok(());
    }

    let documents: Vec<FileDocument> = cli
        .files
        .iter()
        .filter(|path| {
            if path.is_file() {
                true
            } else {
                warn!(path = %path.display(), "not a regular file, skipping");
                false
            }
        })
        .map(FileDocument::new)
        .collect();

    if documents.is_empty() {
        eprintln!("No files to check");
        std::process::exit(1);
    }

    let analyser = HeaderAnalyser::new(registry, config.header)?;

    let mut verdicts = Vec::with_capacity(documents.len());
    for result in analyser.evaluate_all(&documents) {
        match result {
            Ok(verdict) => verdicts.push(verdict),
            Err(AnalysisError::Io { document, source }) => {
                warn!(%document, error = %source, "unreadable file, skipping");
            }
            Err(err) => return Err(err.into()),
        }
    }

    match cli.report {
        ReportFormat::Terminal => {
            report::terminal::render(&verdicts, cli.verbose, cli.quiet)?;
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&verdicts)?);
        }
    }

    // Exit code: 1 if any file is not approved
    if verdicts.iter().any(|v| !v.is_approved()) {
        std::process::exit(1);
    }

    Ok(())
}
