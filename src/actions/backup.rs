//! Backup rotation before a destructive write.
//!
//! # Overview
//!
//! Before a file is overwritten, its current content is copied to
//! `<file>.bak`. At most one older generation is retained:
//!
//! - if `<file>.bak` exists and `<file>.bak~` does not, `.bak` is renamed
//!   to `.bak~` first
//! - if both exist, `.bak~` is left alone and `.bak` is overwritten
//!
//! The rename happens before the copy, so the previous generation survives
//! even if the new copy fails halfway.
//!
//! # Example
//!
//! ```no_run
//! use itemdedup::actions::backup::create_backup;
//! use std::path::Path;
//!
//! let outcome = create_backup(Path::new("StringResource.xml")).unwrap();
//! println!("Backup written to {}", outcome.backup.display());
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use super::WriteError;

/// Result of a successful backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupOutcome {
    /// Path of the fresh backup (`<file>.bak`).
    pub backup: PathBuf,
    /// Path the previous backup was rotated to, if a rotation happened.
    pub rotated: Option<PathBuf>,
    /// Bytes copied.
    pub size: u64,
}

/// `<file>.bak`
#[must_use]
pub fn backup_path(path: &Path) -> PathBuf {
    with_suffix(path, ".bak")
}

/// `<file>.bak~`
#[must_use]
pub fn rotated_backup_path(path: &Path) -> PathBuf {
    with_suffix(path, ".bak~")
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Rotate an existing backup if allowed, then copy `path` to `<path>.bak`.
///
/// # Errors
///
/// - `WriteError::Rotate` if renaming `.bak` to `.bak~` fails
/// - `WriteError::Backup` if copying the original fails
pub fn create_backup(path: &Path) -> Result<BackupOutcome, WriteError> {
    let backup = backup_path(path);
    let mut rotated = None;

    if backup.exists() {
        let older = rotated_backup_path(path);
        if older.exists() {
            log::debug!(
                "Keeping existing {}, overwriting {}",
                older.display(),
                backup.display()
            );
        } else {
            fs::rename(&backup, &older).map_err(|source| WriteError::Rotate {
                path: backup.clone(),
                source,
            })?;
            log::debug!("Rotated {} -> {}", backup.display(), older.display());
            rotated = Some(older);
        }
    }

    let size = fs::copy(path, &backup).map_err(|source| WriteError::Backup {
        path: backup.clone(),
        source,
    })?;
    log::debug!("Backed up {} ({} bytes)", path.display(), size);

    Ok(BackupOutcome {
        backup,
        rotated,
        size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backup_paths() {
        let path = Path::new("/data/StringResource.xml");
        assert_eq!(
            backup_path(path),
            PathBuf::from("/data/StringResource.xml.bak")
        );
        assert_eq!(
            rotated_backup_path(path),
            PathBuf::from("/data/StringResource.xml.bak~")
        );
    }

    #[test]
    fn test_first_backup() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.xml");
        fs::write(&file, "v1").unwrap();

        let outcome = create_backup(&file).unwrap();
        assert_eq!(outcome.rotated, None);
        assert_eq!(outcome.size, 2);
        assert_eq!(fs::read_to_string(backup_path(&file)).unwrap(), "v1");
        assert!(!rotated_backup_path(&file).exists());
    }

    #[test]
    fn test_rotation_when_no_older_generation() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.xml");
        fs::write(&file, "v2").unwrap();
        fs::write(backup_path(&file), "v1").unwrap();

        let outcome = create_backup(&file).unwrap();
        assert_eq!(outcome.rotated, Some(rotated_backup_path(&file)));
        assert_eq!(fs::read_to_string(rotated_backup_path(&file)).unwrap(), "v1");
        assert_eq!(fs::read_to_string(backup_path(&file)).unwrap(), "v2");
    }

    #[test]
    fn test_existing_older_generation_is_never_overwritten() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.xml");
        fs::write(&file, "v3").unwrap();
        fs::write(backup_path(&file), "v2").unwrap();
        fs::write(rotated_backup_path(&file), "v1").unwrap();

        let outcome = create_backup(&file).unwrap();
        assert_eq!(outcome.rotated, None);
        assert_eq!(fs::read_to_string(rotated_backup_path(&file)).unwrap(), "v1");
        assert_eq!(fs::read_to_string(backup_path(&file)).unwrap(), "v3");
    }

    #[test]
    fn test_missing_source_fails_after_rotation() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("gone.xml");
        fs::write(backup_path(&file), "v1").unwrap();

        let err = create_backup(&file).unwrap_err();
        assert!(matches!(err, WriteError::Backup { .. }));
        // previous generation survives
        assert_eq!(fs::read_to_string(rotated_backup_path(&file)).unwrap(), "v1");
    }
}
