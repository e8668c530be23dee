//! Batch coordinator: runs the per-input pipeline over many files.
//!
//! # Overview
//!
//! Each input goes through `open -> header check -> dedupe -> write`. Any
//! failing step ends that input's pipeline with a `[FAIL]` record; the rest
//! of the batch carries on. Files are processed in parallel on a rayon pool
//! sized to the available parallelism; a piped document, if any, is
//! processed afterwards on the calling thread.
//!
//! Completion order across files is not deterministic. The counters and the
//! summary are.
//!
//! # Example
//!
//! ```no_run
//! use itemdedup::batch::{Batch, BatchOptions};
//! use itemdedup::output::{Reporter, ReporterConfig};
//! use std::path::PathBuf;
//!
//! let reporter = Reporter::new(ReporterConfig::default());
//! let batch = Batch::new(BatchOptions::default(), &reporter);
//! let result = batch
//!     .run(&[PathBuf::from("/res/a.xml"), PathBuf::from("/res/b.xml")], None)
//!     .unwrap();
//! reporter.summary(result.elapsed);
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use thiserror::Error;

use crate::actions::{write_document, InputHandle, WriteError, WriteOptions, WriteOutcome};
use crate::document::{load, LoadError, LoadOptions};
use crate::duplicates::{deduplicate, DedupReport};
use crate::output::Reporter;

/// Display name of the piped document.
pub const STDIN_PIPE_NAME: &str = "<Stdin Pipe>";

/// Inputs above this size trigger a warning before parsing.
pub const LARGE_INPUT_BYTES: u64 = 1 << 30;

/// Flags shared by every input of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Copy originals to `<file>.bak` before writing.
    pub backup: bool,
    /// Analyse and report only.
    pub dry_run: bool,
    /// Keep original whitespace instead of re-indenting.
    pub no_format: bool,
    /// Worker count; `None` uses the available parallelism.
    pub threads: Option<usize>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            backup: true,
            dry_run: false,
            no_format: false,
            threads: None,
        }
    }
}

impl BatchOptions {
    /// Options for loading each document.
    #[must_use]
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions::default().with_preserve_whitespace(self.no_format)
    }

    /// Options for the write step.
    #[must_use]
    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            backup: self.backup,
            dry_run: self.dry_run,
            indent: !self.no_format,
        }
    }
}

/// One unit of batch work.
#[derive(Debug)]
pub enum WorkItem {
    /// A file, opened read-only in dry-run mode and read-write otherwise.
    File(PathBuf),
    /// The document piped on stdin (or any other stream).
    Piped(InputHandle),
}

impl WorkItem {
    /// Name used in records.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Piped(_) => STDIN_PIPE_NAME.to_string(),
        }
    }
}

/// Why a single input failed.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The input could not be opened.
    #[error("{0}")]
    Open(#[source] io::Error),

    /// Format or parse failure.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Backup or save failure.
    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Configuration-time batch failures.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Nothing to process.
    #[error("no input file")]
    NoInput,

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Counters and timing for a finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchResult {
    /// Inputs processed successfully.
    pub success: usize,
    /// Inputs that failed.
    pub failure: usize,
    /// Inputs never started because shutdown was requested.
    pub skipped: usize,
    /// Wall time of the parallel file phase.
    pub elapsed: Duration,
}

impl BatchResult {
    /// Check if every processed input succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failure == 0
    }
}

/// Runs the pipeline for a set of inputs, reporting through a shared [`Reporter`].
pub struct Batch<'a> {
    options: BatchOptions,
    reporter: &'a Reporter,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl<'a> Batch<'a> {
    /// Create a batch reporting to `reporter`.
    #[must_use]
    pub fn new(options: BatchOptions, reporter: &'a Reporter) -> Self {
        Self {
            options,
            reporter,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag; inputs not yet started are skipped once it is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Process `files` in parallel, then `piped` on the calling thread.
    ///
    /// The elapsed time covers the parallel phase only.
    ///
    /// # Errors
    ///
    /// - `BatchError::NoInput` if there are no files and no piped document
    /// - `BatchError::Pool` if the worker pool cannot be created
    ///
    /// Individual input failures are reported and counted, never returned.
    pub fn run(
        &self,
        files: &[PathBuf],
        piped: Option<InputHandle>,
    ) -> Result<BatchResult, BatchError> {
        if files.is_empty() && piped.is_none() {
            return Err(BatchError::NoInput);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.threads.unwrap_or(0))
            .build()?;
        let skipped = AtomicUsize::new(0);

        log::info!(
            "Processing {} file(s) on {} thread(s)",
            files.len(),
            pool.current_num_threads()
        );

        let started = Instant::now();
        pool.install(|| {
            files.par_iter().for_each(|path| {
                if self.is_shutdown_requested() {
                    skipped.fetch_add(1, Ordering::Relaxed);
                    return;
                }
                self.run_item(WorkItem::File(path.clone()));
            });
        });
        let elapsed = started.elapsed();

        if let Some(handle) = piped {
            if self.is_shutdown_requested() {
                skipped.fetch_add(1, Ordering::Relaxed);
            } else {
                self.run_item(WorkItem::Piped(handle));
            }
        }

        let (success, failure) = self.reporter.counts();
        let skipped = skipped.into_inner();
        if skipped > 0 {
            log::warn!("Interrupted, {} input(s) were not processed", skipped);
        }

        Ok(BatchResult {
            success,
            failure,
            skipped,
            elapsed,
        })
    }

    /// Run one item's pipeline and emit its `[ OK ]` or `[FAIL]` record.
    ///
    /// Returns `true` on success.
    pub fn run_item(&self, item: WorkItem) -> bool {
        let name = item.name();
        match self.process_item(item, &name) {
            Ok(report) => {
                log::debug!(
                    "{}: {} group(s), {} item(s) removed",
                    name,
                    report.groups_processed(),
                    report.items_removed()
                );
                self.reporter.success(&name);
                true
            }
            Err(err) => {
                log::debug!("{}: {:?}", name, err);
                self.reporter.failure(&name, &err.to_string());
                false
            }
        }
    }

    /// Run the pipeline for one item without emitting the final record.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error.
    pub fn process_item(&self, item: WorkItem, name: &str) -> Result<DedupReport, ProcessError> {
        match item {
            WorkItem::File(path) => {
                let handle =
                    InputHandle::open(&path, self.options.dry_run).map_err(ProcessError::Open)?;
                log::trace!("{}: opened", name);
                self.process(handle, Some(&path), name)
            }
            WorkItem::Piped(handle) => self.process(handle, None, name),
        }
    }

    fn process(
        &self,
        mut handle: InputHandle,
        path: Option<&Path>,
        name: &str,
    ) -> Result<DedupReport, ProcessError> {
        let size = handle.size();
        if let Some(size) = size.filter(|&s| s > LARGE_INPUT_BYTES) {
            self.reporter.warn_size("content", name, size);
        }

        let load_options = self.options.load_options().with_size_hint(size);
        let mut doc = load(&mut handle, &load_options)?;
        log::trace!("{}: header checked and parsed", name);

        let report = deduplicate(&mut doc);
        for record in report.records() {
            self.reporter.record(&record.render(name));
        }
        log::trace!("{}: deduplicated", name);

        let outcome = write_document(&doc, path, handle, &self.options.write_options())?;
        if let WriteOutcome::Saved {
            backup: Some(backup),
            ..
        } = &outcome
        {
            log::debug!("{}: backup at {}", name, backup.backup.display());
        }
        log::trace!("{}: {:?}", name, outcome);

        Ok(report)
    }
}
