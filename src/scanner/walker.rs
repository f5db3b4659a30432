//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing directories
//! and collecting [`FileRecord`]s for duplicate detection. It uses
//! [`jwalk`] for parallel directory reading.
//!
//! # Features
//!
//! - Parallel directory traversal using the rayon thread pool
//! - Optional symlink following with cycle protection: directories are
//!   entered at most once per canonical path, and each real file is
//!   emitted at most once
//! - Gitignore-style pattern matching via the `ignore` crate
//! - Size filtering (min/max) and optional empty-file skipping
//! - Hidden file filtering
//! - Graceful shutdown via atomic flag
//!
//! Unreadable entries are yielded as [`ScanError`] values and never stop
//! the walk. Emission order is unspecified.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     skip_hidden: true,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), config);
//! let (files, errors): (Vec<_>, Vec<_>) = walker.walk().partition(Result::is_ok);
//! println!("{} files, {} skipped", files.len(), errors.len());
//! ```

use std::collections::HashSet;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;

use super::{FileRecord, ScanError, WalkerConfig};

/// Directory walker for parallel file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Absolute root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// Relative roots are made absolute against the current directory so
    /// every emitted record carries an absolute path.
    ///
    /// # Arguments
    ///
    /// * `path` - Root directory to scan
    /// * `config` - Walker configuration options
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        let root = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        Self {
            root,
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops iteration as soon
    /// as possible.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The absolute root being walked.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build gitignore matcher from config patterns and the root .gitignore.
    fn build_gitignore(&self) -> Option<Gitignore> {
        let mut builder = GitignoreBuilder::new(&self.root);

        let gitignore_path = self.root.join(".gitignore");
        if gitignore_path.exists() {
            if let Some(e) = builder.add(&gitignore_path) {
                log::warn!(
                    "Failed to load .gitignore from {}: {}",
                    gitignore_path.display(),
                    e
                );
            } else {
                log::debug!("Loaded .gitignore from {}", gitignore_path.display());
            }
        }

        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if gitignore.is_empty() => None,
            Ok(gitignore) => Some(gitignore),
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Check a file against the ignore patterns, including its parent directories.
    fn should_ignore(&self, path: &Path, gitignore: Option<&Gitignore>) -> bool {
        let Some(gi) = gitignore else {
            return false;
        };
        match path.strip_prefix(&self.root) {
            Ok(relative) => gi
                .matched_path_or_any_parents(relative, false)
                .is_ignore(),
            Err(_) => false,
        }
    }

    /// Check if a file passes size filters.
    fn passes_size_filter(&self, size: u64) -> bool {
        if size == 0 && self.config.skip_empty {
            return false;
        }
        if self.config.min_size.is_some_and(|min| size < min) {
            return false;
        }
        if self.config.max_size.is_some_and(|max| size > max) {
            return false;
        }
        true
    }

    /// Walk the directory tree, yielding file records.
    ///
    /// Returns an iterator over [`FileRecord`] results. Errors are yielded
    /// as [`ScanError`] values rather than stopping iteration.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileRecord, ScanError>> + '_ {
        let gitignore = self.build_gitignore();
        let follow = self.config.follow_symlinks;

        // Canonical identities of directories already entered. Only consulted
        // when following links, since that is the only way to revisit one.
        // The root arrives as the sole child of the first callback and is
        // recorded there like any other directory.
        let visited_dirs: Arc<Mutex<HashSet<PathBuf>>> = Arc::new(Mutex::new(HashSet::new()));
        let mut seen_files: HashSet<PathBuf> = HashSet::new();

        let visited = Arc::clone(&visited_dirs);
        let walk_dir = WalkDir::new(&self.root)
            .follow_links(follow)
            .skip_hidden(self.config.skip_hidden)
            .max_depth(self.config.max_depth.unwrap_or(usize::MAX))
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                if !follow {
                    return;
                }
                for child in children.iter_mut().flatten() {
                    if child.read_children_path.is_none() {
                        continue;
                    }
                    let first_visit = match std::fs::canonicalize(child.path()) {
                        Ok(real) => visited.lock().map(|mut set| set.insert(real)).unwrap_or(false),
                        Err(_) => false,
                    };
                    if !first_visit {
                        log::debug!(
                            "Not descending into already visited directory: {}",
                            child.path().display()
                        );
                        child.read_children_path = None;
                    }
                }
            });

        walk_dir.into_iter().filter_map(move |entry_result| {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                return None;
            }

            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    return Some(Err(self.handle_jwalk_error(path, &e)));
                }
            };

            if entry.depth == 0 {
                return None;
            }

            let path = entry.path();
            let file_type = entry.file_type();

            if file_type.is_dir() {
                if let Some(ref e) = entry.read_children_error {
                    return Some(Err(self.handle_jwalk_error(path, e)));
                }
                return None;
            }

            if self.should_ignore(&path, gitignore.as_ref()) {
                log::trace!("Ignoring file: {}", path.display());
                return None;
            }

            if (file_type.is_symlink() || entry.path_is_symlink()) && !follow {
                log::trace!("Skipping symlink: {}", path.display());
                return None;
            }

            let metadata = if follow {
                std::fs::metadata(&path)
            } else {
                std::fs::symlink_metadata(&path)
            };
            let metadata = match metadata {
                Ok(m) => m,
                Err(e) => return Some(Err(self.handle_io_error(&path, e))),
            };

            if !metadata.is_file() {
                return None;
            }

            if follow {
                match std::fs::canonicalize(&path) {
                    Ok(real) => {
                        if !seen_files.insert(real) {
                            log::debug!("Skipping already seen file: {}", path.display());
                            return None;
                        }
                    }
                    Err(e) => return Some(Err(self.handle_io_error(&path, e))),
                }
            }

            self.process_file_entry(path, &metadata).map(Ok)
        })
    }

    /// Build a FileRecord if the file passes the filters.
    fn process_file_entry(&self, path: PathBuf, metadata: &Metadata) -> Option<FileRecord> {
        let size = metadata.len();

        if !self.passes_size_filter(size) {
            log::trace!(
                "Skipping file due to size filter ({}): {}",
                size,
                path.display()
            );
            return None;
        }

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        Some(FileRecord::new(path, size, modified))
    }

    /// Handle I/O errors during file access.
    fn handle_io_error(&self, path: &Path, error: std::io::Error) -> ScanError {
        let err = ScanError::from_io(path, error);
        match err {
            ScanError::NotFound(_) => {
                log::debug!("File not found (may have been deleted): {}", path.display());
            }
            _ => log::warn!("{}", err),
        }
        err
    }

    /// Handle jwalk errors.
    fn handle_jwalk_error(&self, path: PathBuf, error: &jwalk::Error) -> ScanError {
        log::warn!("Walker error for {}: {}", path.display(), error);
        match error.io_error().map(std::io::Error::kind) {
            Some(std::io::ErrorKind::PermissionDenied) => ScanError::PermissionDenied(path),
            Some(std::io::ErrorKind::NotFound) => ScanError::NotFound(path),
            _ => ScanError::Io {
                path,
                source: std::io::Error::other(error.to_string()),
            },
        }
    }
}
