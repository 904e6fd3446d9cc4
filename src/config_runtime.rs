//! Merges file config into CLI arguments and builds the batch options.

use std::time::Duration;

use anyhow::{Result, bail};
use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};
use dsputils::{BatchOptions, DownloadOptions};

use crate::app_config::FileConfig;
use crate::cli::Args;

/// Which arguments were given explicitly on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) output_dir: bool,
    pub(crate) concurrency: bool,
    pub(crate) timeout: bool,
    pub(crate) chunk_size: bool,
    pub(crate) overwrite: bool,
    pub(crate) rename: bool,
    pub(crate) missing_name: bool,
    pub(crate) no_logs: bool,
    pub(crate) log_path: bool,
}

pub(crate) fn parse_cli_with_sources() -> (Args, CliValueSources) {
    let matches = Args::command().get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    let sources = sources_from_matches(&matches);
    (args, sources)
}

fn sources_from_matches(matches: &ArgMatches) -> CliValueSources {
    CliValueSources {
        output_dir: is_commandline_value(matches, "output_dir"),
        concurrency: is_commandline_value(matches, "concurrency"),
        timeout: is_commandline_value(matches, "timeout"),
        chunk_size: is_commandline_value(matches, "chunk_size"),
        overwrite: is_commandline_value(matches, "overwrite"),
        rename: is_commandline_value(matches, "rename"),
        missing_name: is_commandline_value(matches, "missing_name"),
        no_logs: is_commandline_value(matches, "no_logs"),
        log_path: is_commandline_value(matches, "log_path"),
    }
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Fills every argument not given on the command line from the file config.
pub(crate) fn apply_config_defaults(
    mut args: Args,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Args {
    let Some(file_config) = file_config else {
        return args;
    };

    if !cli_sources.output_dir
        && let Some(output_dir) = &file_config.output_dir
    {
        args.output_dir = Some(output_dir.clone());
    }

    if !cli_sources.concurrency
        && let Some(concurrency) = file_config.concurrency
    {
        args.concurrency = concurrency;
    }

    if !cli_sources.timeout
        && let Some(timeout) = file_config.timeout_secs
    {
        args.timeout = timeout;
    }

    if !cli_sources.chunk_size
        && let Some(chunk_size) = file_config.chunk_size
    {
        args.chunk_size = chunk_size;
    }

    if !cli_sources.overwrite
        && let Some(overwrite) = file_config.overwrite
    {
        args.overwrite = overwrite;
    }

    if !cli_sources.rename
        && let Some(rename) = file_config.rename
    {
        args.rename = rename;
    }

    if !cli_sources.missing_name
        && let Some(missing_name) = &file_config.missing_name
    {
        args.missing_name = Some(missing_name.clone());
    }

    if !cli_sources.no_logs
        && let Some(write_logs) = file_config.write_logs
    {
        args.no_logs = !write_logs;
    }

    if !cli_sources.log_path
        && let Some(log_path) = &file_config.log_path
    {
        args.log_path = Some(log_path.clone());
    }

    args
}

/// Converts the effective arguments into library options.
pub(crate) fn batch_options(args: &Args) -> Result<BatchOptions> {
    if !(1..=100).contains(&args.concurrency) {
        bail!(
            "Invalid effective concurrency value: {}. Expected range: 1..=100",
            args.concurrency
        );
    }
    let Ok(chunk_size) = usize::try_from(args.chunk_size) else {
        bail!("Chunk size {} is too large for this platform", args.chunk_size);
    };

    let mut download = DownloadOptions {
        overwrite: args.overwrite,
        rename: args.rename,
        write_logs: !args.no_logs,
        log_path: args.log_path.clone(),
        timeout: Duration::from_secs(args.timeout),
        chunk_size,
        show_progress: !args.no_progress && !args.quiet,
        show_bar: !args.no_bar,
        mount_drive: args.mount_drive,
        ..DownloadOptions::default()
    };
    if let Some(missing_name) = &args.missing_name {
        download.missing_name.clone_from(missing_name);
    }

    Ok(BatchOptions {
        max_workers: usize::from(args.concurrency),
        download,
    })
}
