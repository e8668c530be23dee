//! File actions module.
//!
//! This module provides functionality for:
//! - Backup rotation (`<file>.bak`, `<file>.bak~`) before a destructive write
//! - Saving a deduplicated document over its source
//!
//! # Saving
//!
//! ```no_run
//! use itemdedup::actions::{write_document, InputHandle, WriteOptions};
//! use itemdedup::document::{load, LoadOptions};
//! use std::path::Path;
//!
//! let path = Path::new("StringResource.xml");
//! let mut handle = InputHandle::open(path, false).unwrap();
//! let doc = load(&mut handle, &LoadOptions::default()).unwrap();
//! write_document(&doc, Some(path), handle, &WriteOptions::default()).unwrap();
//! ```

pub mod backup;
pub mod write;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use backup::{backup_path, create_backup, rotated_backup_path, BackupOutcome};
pub use write::{write_document, InputHandle, WriteOptions, WriteOutcome, WriteStrategy};

/// Error type for backup and save operations.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Renaming `.bak` to `.bak~` failed.
    #[error("cannot rotate backup {path}: {source}")]
    Rotate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Copying the original to `.bak` failed.
    #[error("cannot create backup {path}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing the result failed.
    #[error("cannot save {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WriteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Rotate { path, .. } | Self::Backup { path, .. } | Self::Save { path, .. } => {
                path
            }
        }
    }
}
