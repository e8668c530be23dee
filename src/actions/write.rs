//! Writing a deduplicated document back to its source.
//!
//! # Overview
//!
//! The input handle decides how the result is saved:
//!
//! - **Overwrite**: the handle was opened read-write, so the serialized
//!   document is written over it from offset 0 and the file is truncated to
//!   the new length. No second open is needed.
//! - **Rewrite**: the handle cannot seek and write (read-only file, generic
//!   stream). It is closed and the target path is written afresh.
//!
//! Piped input and dry runs never write anything.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::document::Document;

use super::backup::{create_backup, BackupOutcome};
use super::WriteError;

/// An open input: a file (read-only or read-write) or an arbitrary stream.
pub enum InputHandle {
    /// A file opened by path.
    File {
        /// The open file.
        file: File,
        /// Whether it was opened for writing.
        writable: bool,
    },
    /// A stream with no file behind it (e.g. stdin).
    Stream(Box<dyn Read + Send>),
}

impl std::fmt::Debug for InputHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File { writable, .. } => f
                .debug_struct("File")
                .field("writable", writable)
                .finish_non_exhaustive(),
            Self::Stream(_) => f.write_str("Stream(<reader>)"),
        }
    }
}

impl InputHandle {
    /// Open `path`, read-write unless `read_only` is set.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the file cannot be opened.
    pub fn open(path: &Path, read_only: bool) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(!read_only)
            .open(path)?;
        Ok(Self::File {
            file,
            writable: !read_only,
        })
    }

    /// Wrap an arbitrary reader.
    pub fn stream<R: Read + Send + 'static>(reader: R) -> Self {
        Self::Stream(Box::new(reader))
    }

    /// Total length of the input, when it is a file.
    #[must_use]
    pub fn size(&self) -> Option<u64> {
        match self {
            Self::File { file, .. } => file.metadata().ok().map(|m| m.len()),
            Self::Stream(_) => None,
        }
    }

    /// Whether the result can be written back through this handle.
    #[must_use]
    pub fn can_seek_and_write(&self) -> bool {
        matches!(self, Self::File { writable: true, .. })
    }
}

impl Read for InputHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::File { file, .. } => file.read(buf),
            Self::Stream(reader) => reader.read(buf),
        }
    }
}

/// How the document is saved, chosen once per input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStrategy {
    /// Seek to 0, write over the open handle, truncate.
    Overwrite,
    /// Close the handle and write the path afresh.
    Rewrite,
}

impl WriteStrategy {
    /// Pick the strategy the handle supports.
    #[must_use]
    pub fn for_handle(handle: &InputHandle) -> Self {
        if handle.can_seek_and_write() {
            Self::Overwrite
        } else {
            Self::Rewrite
        }
    }
}

/// Flags controlling the write step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    /// Copy the original to `<file>.bak` first.
    pub backup: bool,
    /// Analyse only, never touch the file.
    pub dry_run: bool,
    /// Re-indent the output.
    pub indent: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            backup: true,
            dry_run: false,
            indent: true,
        }
    }
}

/// What the write step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Nothing written: dry run, or the input is not a file.
    Skipped,
    /// Written to the target.
    Saved {
        strategy: WriteStrategy,
        /// Bytes written.
        bytes: u64,
        /// The backup taken before writing, if any.
        backup: Option<BackupOutcome>,
    },
}

/// Save `doc` to `path` (or skip, for piped input and dry runs).
///
/// `handle` is consumed: it is either written through or closed before the
/// path is rewritten.
///
/// # Errors
///
/// Returns `WriteError` if backup rotation, the backup copy or the save fails.
pub fn write_document(
    doc: &Document,
    path: Option<&Path>,
    handle: InputHandle,
    options: &WriteOptions,
) -> Result<WriteOutcome, WriteError> {
    let Some(path) = path else {
        return Ok(WriteOutcome::Skipped);
    };
    if options.dry_run {
        log::debug!("Dry run, not writing {}", path.display());
        return Ok(WriteOutcome::Skipped);
    }

    let backup = if options.backup {
        Some(create_backup(path)?)
    } else {
        None
    };

    let xml = doc.to_xml(options.indent);
    let strategy = WriteStrategy::for_handle(&handle);
    let save_err = |source| WriteError::Save {
        path: path.to_path_buf(),
        source,
    };

    match (strategy, handle) {
        (WriteStrategy::Overwrite, InputHandle::File { mut file, .. }) => {
            overwrite(&mut file, xml.as_bytes()).map_err(save_err)?;
        }
        (_, handle) => {
            drop(handle);
            fs::write(path, xml.as_bytes()).map_err(save_err)?;
        }
    }

    log::debug!(
        "Saved {} ({:?}, {} bytes)",
        path.display(),
        strategy,
        xml.len()
    );

    Ok(WriteOutcome::Saved {
        strategy,
        bytes: xml.len() as u64,
        backup,
    })
}

fn overwrite(file: &mut File, bytes: &[u8]) -> io::Result<()> {
    file.seek(SeekFrom::Start(0))?;
    file.write_all(bytes)?;
    let end = file.stream_position()?;
    file.set_len(end)?;
    file.flush()
}
