//! Duplicate finder implementation with staged detection.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Walk**: Collect file records from the target directory
//! 2. **Stage 1 - Size grouping**: Bucket files by size (see [`crate::duplicates::groups`])
//! 3. **Stage 2 - Content hash**: In [`ScanMode::Strict`], hash every member of
//!    a multi-file bucket and regroup by `(size, digest)`
//!
//! In [`ScanMode::SizeOnly`] Stage 2 is skipped and every size bucket is
//! reported as a group. Equal-size files with different content are then
//! reported together; that is the documented trade-off of the mode.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::{Walker, WalkerConfig, FileRecord, Hasher};
//! use dupsweep::duplicates::{group_by_size, hash_buckets, HashConfig};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! let files: Vec<FileRecord> = walker.walk().filter_map(Result::ok).collect();
//! let (buckets, _) = group_by_size(files);
//!
//! let (groups, stats) = hash_buckets(buckets, Arc::new(Hasher::new()), HashConfig::default());
//! println!("{} groups, {} files hashed", groups.len(), stats.hashed_files);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::groups::{group_by_size, sort_groups, DuplicateGroup, GroupDigest, SizeBucket};
use crate::progress::ProgressCallback;
use crate::scanner::{Digest, FileRecord, HashAlgorithm, HashError, Hasher, ScanError, Walker, WalkerConfig};

/// Files above this size are logged at debug level when hashed.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Default I/O parallelism: the available hardware parallelism, or 4 if unknown.
#[must_use]
pub fn default_io_threads() -> usize {
    std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
}

/// How strictly files must match to be grouped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Size match confirmed by a content digest.
    #[default]
    Strict,
    /// Size match only; no file content is read.
    #[serde(alias = "size-only")]
    SizeOnly,
}

impl ScanMode {
    /// Wire name of the mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::SizeOnly => "size_only",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a scan mode string is not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown scan mode '{0}' (expected 'strict' or 'size_only')")]
pub struct ParseScanModeError(pub String);

impl FromStr for ScanMode {
    type Err = ParseScanModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "size_only" | "size-only" => Ok(Self::SizeOnly),
            _ => Err(ParseScanModeError(s.to_string())),
        }
    }
}

/// Configuration for the hashing stage.
#[derive(Clone)]
pub struct HashConfig {
    /// Number of threads in the hashing pool.
    pub io_threads: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for HashConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashConfig")
            .field("io_threads", &self.io_threads)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            io_threads: default_io_threads(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl HashConfig {
    /// Set the hashing pool size (at least one thread).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Statistics from the hashing stage.
#[derive(Debug, Default)]
pub struct HashStats {
    /// Total files that entered Stage 2
    pub input_files: usize,
    /// Number of files successfully hashed
    pub hashed_files: usize,
    /// Number of files that failed to hash
    pub failed_files: usize,
    /// Errors encountered while hashing
    pub errors: Vec<HashError>,
    /// Total bytes hashed across all files
    pub bytes_hashed: u64,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Number of confirmed duplicate files (excluding originals)
    pub duplicate_files: usize,
    /// Total space wasted by duplicates
    pub wasted_space: u64,
    /// Whether the stage stopped early on shutdown
    pub interrupted: bool,
}

impl HashStats {
    /// Fill the group-derived counters.
    pub fn calculate_wasted_space(&mut self, groups: &[DuplicateGroup]) {
        self.duplicate_groups = groups.len();
        self.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        self.wasted_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
    }
}

enum HashOutcome {
    Hashed(FileRecord, Digest),
    Failed(HashError),
    Skipped,
}

/// Run `op` on a pool of `threads` workers, or on the global pool if one cannot be built.
fn run_on_pool<R: Send>(threads: usize, op: impl FnOnce() -> R + Send) -> R {
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(op),
        Err(e) => {
            log::warn!(
                "Failed to create hashing pool ({}), using global pool with {} threads",
                e,
                rayon::current_num_threads()
            );
            op()
        }
    }
}

/// Hash every member of the given buckets and regroup them by `(size, digest)` (Stage 2).
///
/// Hashing runs on a dedicated rayon pool bounded by `io_threads`. A file
/// that fails to hash is dropped from its bucket and counted; the rest of
/// the bucket proceeds. Only digest subsets with two or more members become
/// groups.
///
/// Once the shutdown flag is set no further files are started and
/// `stats.interrupted` is set; the returned groups are then incomplete and
/// must not be reported.
#[must_use]
pub fn hash_buckets(
    buckets: Vec<SizeBucket>,
    hasher: Arc<Hasher>,
    config: HashConfig,
) -> (Vec<DuplicateGroup>, HashStats) {
    let all_files: Vec<FileRecord> = buckets.into_iter().flat_map(|b| b.files).collect();
    let mut stats = HashStats {
        input_files: all_files.len(),
        ..Default::default()
    };

    if all_files.is_empty() {
        log::debug!("Stage 2: No files to hash");
        return (Vec::new(), stats);
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start("hashing", all_files.len());
    }

    log::info!(
        "Stage 2: Hashing {} files on {} threads",
        all_files.len(),
        config.io_threads
    );

    let started = AtomicUsize::new(0);
    let outcomes: Vec<HashOutcome> = run_on_pool(config.io_threads, || {
        all_files
            .into_par_iter()
            .map(|file| {
                if config.is_shutdown_requested() {
                    return HashOutcome::Skipped;
                }

                if file.size > LARGE_FILE_THRESHOLD {
                    log::debug!(
                        "Hashing large file ({} MB): {}",
                        file.size / (1024 * 1024),
                        file.path.display()
                    );
                }

                if let Some(ref callback) = config.progress_callback {
                    let current = started.fetch_add(1, Ordering::Relaxed) + 1;
                    callback.on_progress(current, file.path.to_string_lossy().as_ref());
                }

                match hasher.hash_record(&file) {
                    Ok(digest) => {
                        if let Some(ref callback) = config.progress_callback {
                            callback.on_item_completed(file.size);
                        }
                        HashOutcome::Hashed(file, digest)
                    }
                    Err(HashError::Interrupted(_)) => HashOutcome::Skipped,
                    Err(e) => {
                        log::warn!("Failed to hash {}: {}", file.path.display(), e);
                        HashOutcome::Failed(e)
                    }
                }
            })
            .collect()
    });

    if config.is_shutdown_requested() {
        stats.interrupted = true;
        log::info!("Stage 2: Interrupted by shutdown signal");
    }

    let mut by_digest: HashMap<(u64, Digest), Vec<FileRecord>> = HashMap::new();
    for outcome in outcomes {
        match outcome {
            HashOutcome::Hashed(file, digest) => {
                stats.hashed_files += 1;
                stats.bytes_hashed += file.size;
                by_digest.entry((file.size, digest)).or_default().push(file);
            }
            HashOutcome::Failed(e) => {
                stats.failed_files += 1;
                stats.errors.push(e);
            }
            HashOutcome::Skipped => stats.interrupted = true,
        }
    }

    let mut groups: Vec<DuplicateGroup> = by_digest
        .into_iter()
        .filter(|(_, files)| files.len() > 1)
        .map(|((size, digest), files)| {
            log::debug!(
                "Duplicate group {}: {} files, {} bytes each",
                crate::scanner::hash_to_hex(&digest),
                files.len(),
                size
            );
            DuplicateGroup::new(GroupDigest::Content(digest), size, files)
        })
        .collect();
    sort_groups(&mut groups);

    stats.calculate_wasted_space(&groups);

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end("hashing");
    }

    log::info!(
        "Stage 2 complete: {} groups, {} duplicates, {} bytes reclaimable",
        stats.duplicate_groups,
        stats.duplicate_files,
        stats.wasted_space
    );

    (groups, stats)
}

/// Report every size bucket as a group without reading content.
#[must_use]
pub fn size_only_groups(buckets: Vec<SizeBucket>) -> Vec<DuplicateGroup> {
    let mut groups: Vec<DuplicateGroup> = buckets
        .into_iter()
        .filter(|b| b.len() > 1)
        .map(|b| DuplicateGroup::new(GroupDigest::SizeOnly, b.size, b.files))
        .collect();
    sort_groups(&mut groups);
    groups
}

// ============================================================================
// DuplicateFinder - Pipeline Orchestrator
// ============================================================================

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of I/O threads for parallel hashing.
    pub io_threads: usize,
    /// Content digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Hasher read buffer size in bytes.
    pub buffer_size: usize,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("algorithm", &self.algorithm)
            .field("buffer_size", &self.buffer_size)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: default_io_threads(),
            algorithm: HashAlgorithm::default(),
            buffer_size: crate::scanner::DEFAULT_BUFFER_SIZE,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the hashing pool size (at least one thread).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the content digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the hasher read buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Mode the scan ran in
    pub mode: ScanMode,
    /// Total number of files enumerated
    pub total_files: usize,
    /// Total size of all enumerated files in bytes
    pub total_size: u64,
    /// Number of files eliminated by size grouping (unique sizes)
    pub eliminated_by_size: usize,
    /// Number of files whose content was hashed
    pub files_hashed: usize,
    /// Bytes streamed through the hasher
    pub bytes_hashed: u64,
    /// Entries the walker could not read
    pub skipped_entries: usize,
    /// Files dropped because hashing failed
    pub hash_failures: usize,
    /// Number of reported duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding originals)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Entry-local walk errors
    pub scan_errors: Vec<ScanError>,
    /// Entry-local hashing errors
    pub hash_errors: Vec<HashError>,
}

impl ScanSummary {
    /// Percentage of scanned bytes that duplicates waste.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Whether any entry was skipped or failed to hash.
    #[must_use]
    pub fn had_errors(&self) -> bool {
        self.skipped_entries > 0 || self.hash_failures > 0
    }

    /// Reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize(self.reclaimable_space).to_string()
    }

    /// Total size as a human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        bytesize::ByteSize(self.total_size).to_string()
    }

    fn record_groups(&mut self, groups: &[DuplicateGroup]) {
        self.duplicate_groups = groups.len();
        self.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        self.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
    }
}

/// Errors that end a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or cancel).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The root directory cannot be read.
    #[error("Cannot read directory {path}: {source}")]
    Unreadable {
        /// Root that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Check that `path` is an existing, readable directory.
///
/// # Errors
///
/// Returns the scan-fatal [`FinderError`] describing why the root is unusable.
pub fn validate_root(path: &Path) -> Result<(), FinderError> {
    let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => FinderError::PathNotFound(path.to_path_buf()),
        _ => FinderError::Unreadable {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    if !metadata.is_dir() {
        return Err(FinderError::NotADirectory(path.to_path_buf()));
    }
    std::fs::read_dir(path).map_err(|e| FinderError::Unreadable {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Duplicate finder that runs the walk and both grouping stages synchronously.
///
/// # Example
///
/// ```no_run
/// use dupsweep::duplicates::{DuplicateFinder, FinderConfig, ScanMode};
/// use std::path::Path;
///
/// let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(4));
/// let (groups, summary) = finder.find_duplicates(Path::new("/some/path"), ScanMode::Strict).unwrap();
///
/// println!("Found {} duplicate groups", groups.len());
/// println!("Reclaimable space: {}", summary.reclaimable_display());
/// ```
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Arc<Hasher>,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new()
            .with_algorithm(config.algorithm)
            .with_buffer_size(config.buffer_size);
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(Arc::clone(flag));
        }
        Self {
            config,
            hasher: Arc::new(hasher),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The finder's configuration.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate files under `path`.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if the root is missing, not a directory, or
    /// unreadable, or if the scan is interrupted. Unreadable entries below
    /// the root are counted in the summary instead.
    pub fn find_duplicates(
        &self,
        path: &Path,
        mode: ScanMode,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();

        validate_root(path)?;
        log::info!("Starting {} scan of {}", mode, path.display());

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("walking", 0);
            callback.on_message(&format!("Walking {}", path.display()));
        }

        let mut walker = Walker::new(path, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let mut files = Vec::new();
        let mut scan_errors = Vec::new();
        for result in walker.walk() {
            match result {
                Ok(file) => {
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_progress(files.len() + 1, file.path.to_string_lossy().as_ref());
                    }
                    files.push(file);
                }
                Err(e) => scan_errors.push(e),
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("walking");
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!(
            "Found {} files, {} entries skipped",
            files.len(),
            scan_errors.len()
        );

        let (groups, mut summary) = self.group_records(files, mode)?;
        summary.skipped_entries = scan_errors.len();
        summary.scan_errors = scan_errors;
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display()
        );

        Ok((groups, summary))
    }

    /// Find duplicates among pre-collected file records.
    ///
    /// # Errors
    ///
    /// Returns `FinderError::Interrupted` if shutdown is requested mid-scan.
    pub fn find_duplicates_from_records(
        &self,
        files: Vec<FileRecord>,
        mode: ScanMode,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let (groups, mut summary) = self.group_records(files, mode)?;
        summary.scan_duration = start_time.elapsed();
        Ok((groups, summary))
    }

    fn group_records(
        &self,
        files: Vec<FileRecord>,
        mode: ScanMode,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let (buckets, size_stats) = group_by_size(files);
        let mut summary = ScanSummary {
            mode,
            total_files: size_stats.total_files,
            total_size: size_stats.total_size,
            eliminated_by_size: size_stats.eliminated_unique,
            ..Default::default()
        };

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let groups = match mode {
            ScanMode::SizeOnly => size_only_groups(buckets),
            ScanMode::Strict => {
                let hash_config = HashConfig {
                    io_threads: self.config.io_threads,
                    shutdown_flag: self.config.shutdown_flag.clone(),
                    progress_callback: self.config.progress_callback.clone(),
                };
                let (groups, stats) = hash_buckets(buckets, Arc::clone(&self.hasher), hash_config);
                if stats.interrupted || self.config.is_shutdown_requested() {
                    return Err(FinderError::Interrupted);
                }
                summary.files_hashed = stats.hashed_files;
                summary.bytes_hashed = stats.bytes_hashed;
                summary.hash_failures = stats.failed_files;
                summary.hash_errors = stats.errors;
                groups
            }
        };

        summary.record_groups(&groups);
        Ok((groups, summary))
    }
}
