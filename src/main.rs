//! CLI entry point for dsputils.

use std::io::{self, IsTerminal, Read};

use anyhow::{Context, Result};
use dsputils::{FileContent, ReadMode, download_files, natural_size, read_file};
use tracing::{debug, info};

mod app_config;
mod cli;
mod config_runtime;

use app_config::load_default_file_config;
use cli::Args;
use config_runtime::{apply_config_defaults, batch_options, parse_cli_with_sources};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let (args, cli_sources) = parse_cli_with_sources();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let loaded = load_default_file_config()?;
    if let Some(path) = loaded.config.as_ref().and(loaded.path.as_ref()) {
        debug!(path = %path.display(), "loaded config file");
    }
    let args = apply_config_defaults(args, &cli_sources, loaded.config.as_ref());
    debug!(?args, "effective arguments");

    let options = batch_options(&args)?;

    let jobs = collect_jobs(&args)?;
    if jobs.is_empty() {
        info!("No jobs provided. Pass job descriptors as arguments, with --input, or via stdin.");
        info!("Example: echo 'https://example.com/file.pdf, report.pdf' | dsputils");
        return Ok(());
    }

    let summary = download_files(&jobs, args.output_dir.as_deref(), &options).await?;

    info!(
        downloaded = summary.stats.downloaded_count,
        size = %natural_size(summary.stats.downloaded_bytes, None),
        warnings = summary.stats.warning_count,
        errors = summary.stats.error_count,
        root = %summary.root.display(),
        "Download complete"
    );

    Ok(())
}

/// Gathers job descriptors from arguments, `--input`, or piped stdin.
fn collect_jobs(args: &Args) -> Result<Vec<String>> {
    let lines = if !args.jobs.is_empty() {
        args.jobs.clone()
    } else if let Some(input) = &args.input {
        match read_file(input, ReadMode::Lines)
            .with_context(|| format!("Failed to read job file '{}'", input.display()))?
        {
            FileContent::Lines(lines) => lines,
            FileContent::Text(text) => text.lines().map(ToString::to_string).collect(),
        }
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read jobs from stdin")?;
        buffer.lines().map(ToString::to_string).collect()
    } else {
        Vec::new()
    };

    Ok(lines
        .into_iter()
        .map(|line| line.trim_end_matches('\r').to_string())
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .collect())
}
