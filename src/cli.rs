//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use dsputils::download::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_TIMEOUT_SECS, DEFAULT_WORKERS};

/// Download a list of files concurrently.
///
/// Each job is `<url>[, <filename>][, <subfolder>]`. Jobs come from the
/// command line, from `--input`, or from stdin (one per line).
#[derive(Parser, Debug)]
#[command(name = "dsputils")]
#[command(author, version, about)]
pub struct Args {
    /// Job descriptors: "<url>[, <filename>][, <subfolder>]"
    #[arg(value_name = "JOBS")]
    pub jobs: Vec<String>,

    /// Read job descriptors from a file (one per line, '#' starts a comment)
    #[arg(short = 'i', long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Destination root (default: ./Downloads)
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Maximum concurrent downloads (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_WORKERS as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Replace files that already exist
    #[arg(long)]
    pub overwrite: bool,

    /// Save as <name>_<n>.<ext> when the file already exists (wins over --overwrite)
    #[arg(long)]
    pub rename: bool,

    /// Placeholder for URL names without an extension
    #[arg(long, value_name = "LABEL")]
    pub missing_name: Option<String>,

    /// Do not write the download log
    #[arg(long)]
    pub no_logs: bool,

    /// Write the download log here instead of <destination>/logs.txt
    #[arg(long, value_name = "FILE")]
    pub log_path: Option<PathBuf>,

    /// Connect/read timeout in seconds (1-3600)
    #[arg(short = 't', long, default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: u64,

    /// Bytes per write while saving
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE as u64, value_parser = clap::value_parser!(u64).range(1..))]
    pub chunk_size: u64,

    /// Use the mounted drive folder as the default root
    #[arg(long)]
    pub mount_drive: bool,

    /// Hide progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Show per-file counters without the graphical bar
    #[arg(long)]
    pub no_bar: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
