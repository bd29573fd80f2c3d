//! Cross-process locking of data files
//!
//! Every `pocket` invocation is its own process with its own in-memory
//! snapshot. Writers take an exclusive advisory lock on a `<file>.lock`
//! sibling, reload the file and only then append, so rows written by another
//! process in the meantime are kept.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::LedgerError;

/// Held for the duration of one read-modify-write; unlocks on drop
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Block until the lock guarding `data_path` is ours
    pub fn acquire(data_path: &Path) -> Result<Self, LedgerError> {
        let path = lock_path(data_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LedgerError::Storage(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| {
                LedgerError::Storage(format!("Failed to open lock {}: {}", path.display(), e))
            })?;

        FileExt::lock_exclusive(&file).map_err(|e| {
            LedgerError::Storage(format!("Failed to lock {}: {}", path.display(), e))
        })?;

        Ok(Self { file, path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            log::warn!("Failed to release {}: {}", self.path.display(), e);
        }
    }
}

fn lock_path(data_path: &Path) -> PathBuf {
    let mut name = data_path.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    data_path.with_file_name(name)
}
