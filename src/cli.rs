//! Command-line interface definitions.
//!
//! # Example
//!
//! ```bash
//! # Deduplicate two files in place (backups written to *.bak)
//! itemdedup res/StringResource.xml res/de/StringResource.xml
//!
//! # Check a list of files without touching them, logging every removal
//! itemdedup --dry-run --log dedup.log --list files.txt
//!
//! # Paths piped from another command
//! find . -name StringResource.xml | itemdedup --list-pipe
//!
//! # A single document on stdin
//! itemdedup --verbose < StringResource.xml
//! ```

use clap::Parser;
use std::path::PathBuf;

/// Remove duplicate `Item` entries from XML string resource files.
///
/// Items sharing an `id` are reduced to one: the last entry with a `text`
/// attribute wins, falling back to the last entry. Files are rewritten in
/// place; the original is kept as `<file>.bak` (an existing `.bak` is moved
/// to `.bak~` first, unless `.bak~` already exists).
///
/// If stdin is redirected and `--list-pipe` is not given, stdin is treated
/// as one XML document; use `--verbose` or `--log` to see the result.
#[derive(Debug, Parser)]
#[command(name = "itemdedup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// XML files to process
    #[arg(value_name = "XMLFILES")]
    pub files: Vec<PathBuf>,

    /// Load file paths from a list file (lines starting with "#" are skipped)
    #[arg(long = "list", value_name = "FILE")]
    pub lists: Vec<PathBuf>,

    /// Load the path list from stdin
    #[arg(short = 'L', long)]
    pub list_pipe: bool,

    /// Write a log file (overwritten unless --append-log)
    #[arg(short = 'l', long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Append to the log file instead of overwriting it
    #[arg(long)]
    pub append_log: bool,

    /// Don't back up the original file
    #[arg(long)]
    pub no_backup: bool,

    /// Don't re-indent the output file
    #[arg(long)]
    pub no_format: bool,

    /// Analyse and report only, never write files
    ///
    /// Best combined with --log or --verbose.
    #[arg(long)]
    pub dry_run: bool,

    /// Print every removed and kept item (-vv for diagnostics)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Suppress all console output except diagnostics errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,

    /// Number of worker threads (default: available parallelism)
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Configuration file (default: platform config dir)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Program name and version, written as the first log-file line.
#[must_use]
pub fn version_banner() -> String {
    format!(
        "{} v{}\n{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_DESCRIPTION")
    )
}
