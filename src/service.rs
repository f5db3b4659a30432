//! Async boundary operations and their wire types.
//!
//! [`DedupService`] exposes the three operations a frontend needs:
//! scanning a folder, previewing a file, and deleting files. Each returns
//! serde-serializable data, with errors flattened to strings for the
//! caller to display. Blocking work runs on tokio's blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::actions::{
    delete_paths, preview_file, DeleteFailure, DeleteOutcome, PreviewConfig, PreviewResult,
    SystemTrash, Trash,
};
use crate::coordinator::ScanCoordinator;
use crate::duplicates::{DuplicateGroup, ScanMode};
use crate::scanner::FileRecord;

/// One file in a reported group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Absolute path
    pub path: String,
    /// Final path component
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Group digest in wire form
    pub hash: String,
    /// Lowercased extension, possibly empty
    pub extension: String,
}

impl FileInfo {
    fn from_record(record: &FileRecord, hash: &str) -> Self {
        Self {
            path: path_string(&record.path),
            name: record.name.clone(),
            size: record.size,
            hash: hash.to_string(),
            extension: record.extension.clone(),
        }
    }
}

/// A reported duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroupInfo {
    /// Hex digest, or `size_<bytes>` for size-only groups
    pub hash: String,
    /// Shared size in bytes
    pub size: u64,
    /// Members
    pub files: Vec<FileInfo>,
}

impl From<&DuplicateGroup> for DuplicateGroupInfo {
    fn from(group: &DuplicateGroup) -> Self {
        let hash = group.digest_key();
        Self {
            files: group
                .files
                .iter()
                .map(|f| FileInfo::from_record(f, &hash))
                .collect(),
            hash,
            size: group.size,
        }
    }
}

/// A file preview in wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePreview {
    /// `"image"`, `"text"` or `"unsupported"`
    pub preview_type: String,
    /// Data URL, text excerpt, or reason
    pub content: String,
    /// Path as requested
    pub file_path: String,
}

impl From<PreviewResult> for FilePreview {
    fn from(preview: PreviewResult) -> Self {
        Self {
            preview_type: preview.kind.as_str().to_string(),
            content: preview.content,
            file_path: path_string(&preview.path),
        }
    }
}

/// A failed deletion in wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteFailureInfo {
    /// Path as requested
    pub path: String,
    /// Why it failed
    pub error: String,
}

/// A batch deletion outcome in wire form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    /// Paths moved to the trash
    pub deleted: Vec<String>,
    /// Paths that failed, with reasons
    pub failed: Vec<DeleteFailureInfo>,
}

impl From<DeleteOutcome> for DeleteResult {
    fn from(outcome: DeleteOutcome) -> Self {
        Self {
            deleted: outcome.deleted.iter().map(|p| path_string(p)).collect(),
            failed: outcome
                .failed
                .into_iter()
                .map(|DeleteFailure { path, error }| DeleteFailureInfo {
                    path: path_string(&path),
                    error,
                })
                .collect(),
        }
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// The three boundary operations.
pub struct DedupService {
    coordinator: ScanCoordinator,
    trash: Arc<dyn Trash>,
    preview: PreviewConfig,
}

impl Default for DedupService {
    fn default() -> Self {
        Self::new(ScanCoordinator::default())
    }
}

impl DedupService {
    /// Create a service scanning through `coordinator`, deleting to the system trash.
    #[must_use]
    pub fn new(coordinator: ScanCoordinator) -> Self {
        Self {
            coordinator,
            trash: Arc::new(SystemTrash),
            preview: PreviewConfig::default(),
        }
    }

    /// Delete into `trash` instead of the system trash.
    #[must_use]
    pub fn with_trash(mut self, trash: Arc<dyn Trash>) -> Self {
        self.trash = trash;
        self
    }

    /// Use custom preview limits.
    #[must_use]
    pub fn with_preview_config(mut self, config: PreviewConfig) -> Self {
        self.preview = config;
        self
    }

    /// The coordinator scans run on, e.g. for cancelling.
    #[must_use]
    pub fn coordinator(&self) -> &ScanCoordinator {
        &self.coordinator
    }

    /// Scan `path` for duplicates.
    ///
    /// # Errors
    ///
    /// A readable message if the scan is rejected, cancelled, or the root
    /// is unusable.
    pub async fn scan_folder(
        &self,
        path: String,
        mode: ScanMode,
    ) -> Result<Vec<DuplicateGroupInfo>, String> {
        let groups = self
            .coordinator
            .scan(PathBuf::from(path), mode)
            .await
            .map_err(|e| e.to_string())?;
        Ok(groups.iter().map(DuplicateGroupInfo::from).collect())
    }

    /// Preview one file. Content problems degrade to `"unsupported"`.
    ///
    /// # Errors
    ///
    /// Only if the background task fails.
    pub async fn get_file_preview(&self, path: String) -> Result<FilePreview, String> {
        let config = self.preview.clone();
        let preview =
            tokio::task::spawn_blocking(move || preview_file(Path::new(&path), &config))
                .await
                .map_err(|e| format!("join error: {e}"))?;
        Ok(preview.into())
    }

    /// Move `paths` to the trash, reporting each one as deleted or failed.
    ///
    /// # Errors
    ///
    /// Only if the background task fails.
    pub async fn delete_files(&self, paths: Vec<String>) -> Result<DeleteResult, String> {
        let trash = Arc::clone(&self.trash);
        let paths: Vec<PathBuf> = paths.into_iter().map(PathBuf::from).collect();
        let outcome = tokio::task::spawn_blocking(move || delete_paths(&paths, trash.as_ref(), None))
            .await
            .map_err(|e| format!("join error: {e}"))?;
        Ok(outcome.into())
    }
}
