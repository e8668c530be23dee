//! itemdedup - duplicate `Item` remover for XML string resource files
//!
//! Finds `<Item id="...">` elements that share an `id` inside each XML file,
//! keeps one per id and rewrites the file in place, processing many files in
//! parallel with per-file backups and a timestamped log.

pub mod actions;
pub mod batch;
pub mod cli;
pub mod config;
pub mod document;
pub mod duplicates;
pub mod error;
pub mod inputs;
pub mod logging;
pub mod output;
pub mod signal;

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, IsTerminal, Read, Write};
use std::path::Path;

use anyhow::Context;

use crate::actions::InputHandle;
use crate::batch::Batch;
use crate::cli::{version_banner, Cli};
use crate::config::Settings;
use crate::error::ExitCode;
use crate::inputs::InputSources;
use crate::output::{Reporter, ReporterConfig};
use crate::signal::ShutdownHandler;

/// Separator written before each run when appending to a log file.
pub const LOG_SEPARATOR: &str = "----------------------------------------";

/// Standard streams for one run.
pub struct Streams {
    /// Piped document or path list.
    pub stdin: Box<dyn Read + Send>,
    /// Whether stdin is an interactive terminal (nothing piped).
    pub stdin_is_terminal: bool,
    /// Record output.
    pub stdout: Box<dyn Write + Send>,
    /// Failure output.
    pub stderr: Box<dyn Write + Send>,
    /// Whether the console supports color.
    pub color: bool,
}

impl Streams {
    /// The process's own stdin/stdout/stderr.
    #[must_use]
    pub fn process() -> Self {
        Self {
            stdin_is_terminal: io::stdin().is_terminal(),
            color: io::stdout().is_terminal(),
            stdin: Box::new(io::stdin()),
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
        }
    }
}

/// Run the application with parsed CLI arguments.
///
/// # Errors
///
/// Returns an error for unusable configuration, an unwritable log file, or
/// inputs that cannot be resolved. Per-file failures are not errors; they
/// are reported and reflected in the exit code.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    let shutdown = signal::install_handler();
    run_with(&cli, Streams::process(), &shutdown)
}

/// Run with explicit streams and shutdown handler.
///
/// Every call starts from fresh counters, so it can be invoked repeatedly in
/// one process.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_with(
    cli: &Cli,
    streams: Streams,
    shutdown: &ShutdownHandler,
) -> anyhow::Result<ExitCode> {
    let settings = Settings::load(cli.config.as_deref())?.with_cli(cli);
    log::debug!("Effective settings: {:?}", settings);

    let reporter_config = ReporterConfig {
        quiet: cli.quiet,
        verbose: cli.verbose > 0,
        color: streams.color && !cli.no_color,
    };
    let mut reporter = Reporter::with_writers(reporter_config, streams.stdout, streams.stderr);
    if let Some(path) = &settings.log_file {
        reporter = reporter.with_log(Box::new(open_log(path, settings.append_log)?));
    }

    let sources = InputSources {
        files: cli.files.clone(),
        lists: cli.lists.clone(),
        list_pipe: cli.list_pipe,
        stdin_is_terminal: streams.stdin_is_terminal,
        verbose: cli.verbose > 0,
    };
    let mut stdin = BufReader::new(streams.stdin);
    let inputs = inputs::resolve(&sources, &mut stdin, &reporter)
        .map_err(|err| log_fatal(&reporter, err.into()))?;
    let piped = inputs
        .has_piped_document
        .then(|| InputHandle::stream(stdin));

    let batch = Batch::new(settings.batch_options(cli.dry_run), &reporter)
        .with_shutdown_flag(shutdown.get_flag());
    let result = batch
        .run(&inputs.files, piped)
        .map_err(|err| log_fatal(&reporter, err.into()))?;
    reporter.summary(result.elapsed);

    let code = if result.skipped > 0 || shutdown.is_shutdown_requested() {
        ExitCode::Interrupted
    } else if !result.all_succeeded() {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    };
    log::info!("Finished with exit code {}", code.as_i32());
    Ok(code)
}

/// Mirror a fatal error into the log file before it ends the run.
fn log_fatal(reporter: &Reporter, err: anyhow::Error) -> anyhow::Error {
    let heading = ExitCode::for_error(&err).heading();
    reporter.log_only(&format!("{heading}\n{err:#}"));
    reporter.flush();
    err
}

/// Open the log file and write the run banner.
fn open_log(path: &Path, append: bool) -> anyhow::Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .with_context(|| format!("create log file error: {}", path.display()))?;

    let mut log = BufWriter::new(file);
    let banner = if append {
        format!("{LOG_SEPARATOR}\n{}\n", version_banner())
    } else {
        format!("{}\n", version_banner())
    };
    log.write_all(banner.as_bytes())
        .with_context(|| format!("write log file error: {}", path.display()))?;
    Ok(log)
}
