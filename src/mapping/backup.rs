// Backup and restore of mapping files around an overwrite

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use chrono::Local;

use crate::constants::{BACKUP_INFIX, BACKUP_TIMESTAMP_FORMAT};
use crate::error::{LabelError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupEntry {
    pub target: PathBuf,
    pub backup: PathBuf,
}

/// Backups taken before a write, plus the targets that did not exist yet.
/// Backup files are left on disk after a successful run.
#[derive(Debug, Default)]
pub struct BackupSet {
    entries: Vec<BackupEntry>,
    absent: Vec<PathBuf>,
}

impl BackupSet {
    pub fn entries(&self) -> &[BackupEntry] {
        &self.entries
    }

    /// Put every target back the way it was when the backups were taken.
    /// Targets that had no file before are removed.
    ///
    /// Every target is attempted even after a failure. Returns the paths that
    /// were touched, or every error together with the paths that did succeed.
    pub fn restore(&self) -> std::result::Result<Vec<PathBuf>, RestoreFailure> {
        let mut touched = Vec::new();
        let mut errors = Vec::new();

        for entry in &self.entries {
            match copy_preserving_mtime(&entry.backup, &entry.target) {
                Ok(()) => {
                    log::info!("Restored {} from {}", entry.target.display(), entry.backup.display());
                    touched.push(entry.target.clone());
                }
                Err(e) => {
                    log::error!("Failed to restore {}: {}", entry.target.display(), e);
                    errors.push((entry.target.clone(), e));
                }
            }
        }

        for target in &self.absent {
            if !target.exists() {
                continue;
            }
            match fs::remove_file(target) {
                Ok(()) => {
                    log::info!("Removed {} (did not exist before the run)", target.display());
                    touched.push(target.clone());
                }
                Err(e) => {
                    log::error!("Failed to remove {}: {}", target.display(), e);
                    errors.push((target.clone(), e.into()));
                }
            }
        }

        if errors.is_empty() {
            Ok(touched)
        } else {
            Err(RestoreFailure { touched, errors })
        }
    }
}

/// Restore that left at least one target unrestored.
#[derive(Debug, thiserror::Error)]
#[error("{} of {} mapping file(s) could not be restored", .errors.len(), .errors.len() + .touched.len())]
pub struct RestoreFailure {
    pub touched: Vec<PathBuf>,
    pub errors: Vec<(PathBuf, LabelError)>,
}

/// Copy each existing target to a timestamped sibling.
pub fn create_backups(targets: &[&Path]) -> Result<BackupSet> {
    let timestamp = Local::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
    create_backups_with_timestamp(targets, &timestamp)
}

pub fn create_backups_with_timestamp(targets: &[&Path], timestamp: &str) -> Result<BackupSet> {
    let mut set = BackupSet::default();

    for &target in targets {
        if !target.exists() {
            log::debug!("No existing {} to back up", target.display());
            set.absent.push(target.to_path_buf());
            continue;
        }

        let backup = backup_path(target, timestamp);
        copy_preserving_mtime(target, &backup)?;
        log::info!("Created backup {}", backup.display());

        set.entries.push(BackupEntry {
            target: target.to_path_buf(),
            backup,
        });
    }

    Ok(set)
}

/// `<dir>/<file name>.backup_<timestamp>`
pub fn backup_path(target: &Path, timestamp: &str) -> PathBuf {
    let mut name = target
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(BACKUP_INFIX);
    name.push(timestamp);
    target.with_file_name(name)
}

/// Copy with a size check, keeping the source modification time.
fn copy_preserving_mtime(source: &Path, dest: &Path) -> Result<()> {
    fs::copy(source, dest)?;

    let source_size = fs::metadata(source)?.len();
    let dest_size = fs::metadata(dest)?.len();
    if source_size != dest_size {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!(
                "copy of {} is incomplete: size mismatch ({} vs {})",
                source.display(), source_size, dest_size
            ),
        ).into());
    }

    if let Ok(source_meta) = fs::metadata(source) {
        if let Ok(modified) = source_meta.modified() {
            let _ = filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(modified));
        }
    }

    Ok(())
}
