//! Work-item resolution.
//!
//! Input paths come from three places:
//! - positional arguments
//! - `--list <file>` list files (one path per line)
//! - stdin, when `--list-pipe` is given
//!
//! In list files and piped lists, blank lines and lines starting with `#`
//! are skipped. Every path is made absolute, the set is deduplicated and
//! sorted, and empty files are dropped silently. Missing paths are an error
//! reported all at once.
//!
//! When stdin is redirected and `--list-pipe` is absent, stdin itself is the
//! single piped document.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::batch::LARGE_INPUT_BYTES;
use crate::output::Reporter;

/// Missing paths listed before truncating with `...` (unless verbose).
pub const MISSING_PRINT_LIMIT: usize = 10;

/// Error type for input resolution.
#[derive(Debug, Error)]
pub enum InputError {
    /// No files and no piped document.
    #[error("no input file")]
    NoInput,

    /// A `--list` file does not exist.
    #[error("list file {0} not found")]
    ListNotFound(PathBuf),

    /// A list could not be read.
    #[error("load list file error: {path}: {source}")]
    ListRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Some input paths do not exist.
    #[error("{}", describe_missing(.missing, .verbose))]
    FilesNotExist { missing: Vec<PathBuf>, verbose: bool },
}

impl InputError {
    /// Whether this error is about input files not existing.
    #[must_use]
    pub fn is_missing_input(&self) -> bool {
        matches!(self, Self::NoInput | Self::FilesNotExist { .. })
    }
}

fn describe_missing(missing: &[PathBuf], verbose: &bool) -> String {
    let mut text = format!("{} files can't found", missing.len());
    for (idx, path) in missing.iter().enumerate() {
        if !*verbose && idx >= MISSING_PRINT_LIMIT {
            text.push_str("\n...");
            break;
        }
        text.push('\n');
        text.push_str(&path.display().to_string());
    }
    text
}

/// Where to look for inputs.
#[derive(Debug, Clone, Default)]
pub struct InputSources {
    /// Positional file arguments.
    pub files: Vec<PathBuf>,
    /// `--list` files.
    pub lists: Vec<PathBuf>,
    /// Read the path list from stdin.
    pub list_pipe: bool,
    /// Whether stdin is attached to a terminal.
    pub stdin_is_terminal: bool,
    /// List every missing path instead of the first few.
    pub verbose: bool,
}

/// The resolved work: sorted absolute paths plus the piped-document marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSet {
    /// Existing, non-empty files, sorted and deduplicated.
    pub files: Vec<PathBuf>,
    /// Stdin carries a document to process.
    pub has_piped_document: bool,
}

#[derive(Default)]
struct Collector {
    files: BTreeSet<PathBuf>,
    missing: BTreeSet<PathBuf>,
}

impl Collector {
    fn add(&mut self, raw: &Path) {
        let path = std::path::absolute(raw).unwrap_or_else(|_| raw.to_path_buf());
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {
                if meta.len() > 0 {
                    self.files.insert(path);
                } else {
                    log::debug!("Skipping empty file {}", path.display());
                }
            }
            _ => {
                self.missing.insert(path);
            }
        }
    }

    fn add_lines<R: BufRead>(&mut self, reader: R, origin: &Path) -> Result<(), InputError> {
        for line in reader.lines() {
            let line = line.map_err(|source| InputError::ListRead {
                path: origin.to_path_buf(),
                source,
            })?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            self.add(Path::new(line));
        }
        Ok(())
    }
}

/// Resolve the work items.
///
/// `stdin` is only read when `sources.list_pipe` is set. Oversized list
/// files are reported through `reporter`.
///
/// # Errors
///
/// - `ListNotFound` / `ListRead` for unusable list files
/// - `FilesNotExist` if any named path is missing
/// - `NoInput` if nothing is left to process
pub fn resolve<R: BufRead>(
    sources: &InputSources,
    stdin: R,
    reporter: &Reporter,
) -> Result<InputSet, InputError> {
    let mut collector = Collector::default();

    for file in &sources.files {
        collector.add(file);
    }

    for list in &sources.lists {
        let meta = fs::metadata(list).map_err(|_| InputError::ListNotFound(list.clone()))?;
        if meta.len() >= LARGE_INPUT_BYTES {
            reporter.warn_size("list file", &list.display().to_string(), meta.len());
        }
        let file = File::open(list).map_err(|source| InputError::ListRead {
            path: list.clone(),
            source,
        })?;
        collector.add_lines(BufReader::new(file), list)?;
    }

    let mut has_piped_document = false;
    if !sources.stdin_is_terminal {
        if sources.list_pipe {
            collector.add_lines(stdin, Path::new("<stdin>"))?;
        } else {
            has_piped_document = true;
        }
    }

    if !collector.missing.is_empty() {
        return Err(InputError::FilesNotExist {
            missing: collector.missing.into_iter().collect(),
            verbose: sources.verbose,
        });
    }

    let files: Vec<PathBuf> = collector.files.into_iter().collect();
    if files.is_empty() && !has_piped_document {
        return Err(InputError::NoInput);
    }

    log::debug!(
        "Resolved {} input file(s){}",
        files.len(),
        if has_piped_document { " and a piped document" } else { "" }
    );

    Ok(InputSet {
        files,
        has_piped_document,
    })
}
