//! Safe file deletion using the trash crate.
//!
//! # Overview
//!
//! Requested paths are moved to a recoverable store, never erased:
//! - [`SystemTrash`] moves files to the OS recycle bin via [`trash::delete`]
//! - [`DirectoryTrash`] moves files into a plain directory (useful where no
//!   desktop trash exists, and in tests)
//!
//! [`delete_paths`] processes a batch sequentially. Every requested path
//! ends up in exactly one of [`DeleteOutcome::deleted`] or
//! [`DeleteOutcome::failed`]; one failure never stops the rest and nothing
//! is rolled back.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::actions::delete::{delete_paths, SystemTrash};
//! use std::path::PathBuf;
//!
//! let paths = vec![PathBuf::from("/path/to/duplicate.txt")];
//! let outcome = delete_paths(&paths, &SystemTrash, None);
//! println!("{}", outcome.summary());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Path names a directory, not a file.
    #[error("not a file: {0}")]
    NotAFile(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed {
        /// Path that could not be moved
        path: PathBuf,
        /// Backend message
        message: String,
    },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::NotAFile(p)
            | Self::TrashFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// A requested path that could not be moved, with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteFailure {
    /// Path as requested
    pub path: PathBuf,
    /// Why it failed
    pub error: String,
}

/// Results of a batch deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Paths moved to the trash, in request order.
    pub deleted: Vec<PathBuf>,
    /// Paths that failed, in request order.
    pub failed: Vec<DeleteFailure>,
}

impl DeleteOutcome {
    /// Total number of attempted deletions.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.deleted.len() + self.failed.len()
    }

    /// Check if all deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!("Moved {} file(s) to trash", self.deleted.len())
        } else {
            format!(
                "Moved {} file(s) to trash, {} failed",
                self.deleted.len(),
                self.failed.len()
            )
        }
    }
}

/// A recoverable store that files can be moved into.
pub trait Trash: Send + Sync {
    /// Move `path` into the store.
    ///
    /// # Errors
    ///
    /// Returns a `DeleteError` if the move fails; the file is then left in place.
    fn move_to_trash(&self, path: &Path) -> Result<(), DeleteError>;
}

/// The operating system's trash / recycle bin.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTrash;

impl Trash for SystemTrash {
    fn move_to_trash(&self, path: &Path) -> Result<(), DeleteError> {
        trash::delete(path).map_err(|e| {
            log::error!("Trash operation failed for {}: {}", path.display(), e);
            DeleteError::TrashFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })
    }
}

/// A plain directory used as the recoverable store.
///
/// Files are renamed into the directory; a numeric suffix avoids clobbering
/// an earlier file of the same name. The directory must be on the same
/// filesystem as the files moved into it.
#[derive(Debug, Clone)]
pub struct DirectoryTrash {
    dir: PathBuf,
}

impl DirectoryTrash {
    /// Use `dir` as the store, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory files are moved into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn free_slot(&self, name: &std::ffi::OsStr) -> PathBuf {
        let first = self.dir.join(name);
        if !first.exists() {
            return first;
        }
        (1u32..)
            .map(|n| {
                let mut candidate = name.to_os_string();
                candidate.push(format!(".{}", n));
                self.dir.join(candidate)
            })
            .find(|p| !p.exists())
            .unwrap_or(first)
    }
}

impl Trash for DirectoryTrash {
    fn move_to_trash(&self, path: &Path) -> Result<(), DeleteError> {
        let name = path
            .file_name()
            .ok_or_else(|| DeleteError::NotAFile(path.to_path_buf()))?;
        let target = self.free_slot(name);
        fs::rename(path, &target).map_err(|e| DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        log::debug!("Moved {} to {}", path.display(), target.display());
        Ok(())
    }
}

/// Callback trait for deletion progress reporting.
pub trait DeleteProgressCallback: Send + Sync {
    /// Called before each file deletion.
    fn on_before_delete(&self, path: &Path, index: usize, total: usize);

    /// Called after successful deletion.
    fn on_delete_success(&self, path: &Path);

    /// Called after failed deletion.
    fn on_delete_failure(&self, path: &Path, error: &str);

    /// Called when the batch completes.
    fn on_complete(&self, outcome: &DeleteOutcome);
}

/// Move a single file to the given store after checking it still exists.
///
/// # Errors
///
/// - `NotFound` if nothing exists at `path`
/// - `NotAFile` if `path` is a directory
/// - whatever the store reports if the move fails
pub fn delete_one(path: &Path, trash: &dyn Trash) -> Result<(), DeleteError> {
    // symlink_metadata so a dangling link can still be trashed
    let metadata = fs::symlink_metadata(path).map_err(|e| DeleteError::from_io(path, e))?;
    if metadata.is_dir() {
        return Err(DeleteError::NotAFile(path.to_path_buf()));
    }

    trash.move_to_trash(path)?;
    log::info!("Moved to trash: {}", path.display());
    Ok(())
}

/// Move every requested path to the store, sequentially.
///
/// Duplicated entries in `paths` are processed independently; the second
/// one reports `file not found`.
#[must_use]
pub fn delete_paths(
    paths: &[PathBuf],
    trash: &dyn Trash,
    callback: Option<&dyn DeleteProgressCallback>,
) -> DeleteOutcome {
    let mut outcome = DeleteOutcome::default();
    let total = paths.len();

    for (index, path) in paths.iter().enumerate() {
        if let Some(cb) = callback {
            cb.on_before_delete(path, index, total);
        }

        match delete_one(path, trash) {
            Ok(()) => {
                if let Some(cb) = callback {
                    cb.on_delete_success(path);
                }
                outcome.deleted.push(path.clone());
            }
            Err(e) => {
                let message = e.to_string();
                log::warn!("Failed to delete {}: {}", path.display(), message);
                if let Some(cb) = callback {
                    cb.on_delete_failure(path, &message);
                }
                outcome.failed.push(DeleteFailure {
                    path: path.clone(),
                    error: message,
                });
            }
        }
    }

    if let Some(cb) = callback {
        cb.on_complete(&outcome);
    }

    log::info!("{}", outcome.summary());
    outcome
}
