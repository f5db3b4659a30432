//! Duplicate grouping and size-based file organization.
//!
//! # Overview
//!
//! This module provides structures for grouping files by size (Stage 1 of
//! duplicate detection) and the [`DuplicateGroup`] type that scans report.
//!
//! ## Size Grouping (Stage 1)
//!
//! Files with different sizes cannot be duplicates, so bucketing by exact
//! size removes most candidates without reading any content. Only buckets
//! with two or more members move on.
//!
//! # Example
//!
//! ```
//! use dupsweep::scanner::FileRecord;
//! use dupsweep::duplicates::group_by_size;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let files = vec![
//!     FileRecord::new(PathBuf::from("/file1.txt"), 1024, SystemTime::now()),
//!     FileRecord::new(PathBuf::from("/file2.txt"), 1024, SystemTime::now()),
//!     FileRecord::new(PathBuf::from("/file3.txt"), 2048, SystemTime::now()),
//! ];
//!
//! let (buckets, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(buckets.len(), 1);
//! ```

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::scanner::{hash_to_hex, Digest, FileRecord};

/// A transient set of files sharing one size.
///
/// Produced by [`group_by_size`] and consumed by the hashing stage. Never
/// part of a scan result.
#[derive(Debug, Clone)]
pub struct SizeBucket {
    /// File size in bytes (shared by all files in this bucket)
    pub size: u64,
    /// Files with this exact size
    pub files: Vec<FileRecord>,
}

impl SizeBucket {
    /// Create a bucket with initial files.
    #[must_use]
    pub fn with_files(size: u64, files: Vec<FileRecord>) -> Self {
        Self { size, files }
    }

    /// Number of files in this bucket.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Potential space savings (all copies minus one).
    #[must_use]
    pub fn potential_savings(&self) -> u64 {
        self.size * (self.files.len() as u64).saturating_sub(1)
    }
}

/// What the members of a [`DuplicateGroup`] are known to share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupDigest {
    /// Members have byte-identical content with this digest.
    Content(Digest),
    /// Members only share a size; content was never compared.
    SizeOnly,
}

impl GroupDigest {
    /// Content digest, if one was computed.
    #[must_use]
    pub fn content(&self) -> Option<&Digest> {
        match self {
            Self::Content(digest) => Some(digest),
            Self::SizeOnly => None,
        }
    }

    /// Wire form of the digest: lowercase hex, or `size_<bytes>` for size-only groups.
    #[must_use]
    pub fn to_key(&self, size: u64) -> String {
        match self {
            Self::Content(digest) => hash_to_hex(digest),
            Self::SizeOnly => format!("size_{}", size),
        }
    }
}

/// A reported set of two or more files considered duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Shared content digest, or the size-only sentinel
    pub digest: GroupDigest,
    /// File size in bytes, shared by every member
    pub size: u64,
    /// Members, sorted by path
    pub files: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Create a new duplicate group, sorting members by path.
    ///
    /// # Arguments
    ///
    /// * `digest` - Content digest or size-only sentinel
    /// * `size` - File size in bytes
    /// * `files` - Member records
    #[must_use]
    pub fn new(digest: GroupDigest, size: u64, mut files: Vec<FileRecord>) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            digest,
            size,
            files,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Total wasted space (all copies minus one).
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Digest in wire form.
    #[must_use]
    pub fn digest_key(&self) -> String {
        self.digest.to_key(self.size)
    }

    /// Get just the paths of files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// Remove the given paths from this group, returning how many were removed.
    ///
    /// The group may drop below two members; [`prune_deleted`] discards
    /// such groups.
    pub fn remove_paths(&mut self, paths: &[PathBuf]) -> usize {
        let doomed: HashSet<&Path> = paths.iter().map(PathBuf::as_path).collect();
        let before = self.files.len();
        self.files.retain(|f| !doomed.contains(f.path.as_path()));
        before - self.files.len()
    }

    /// Scan result ordering: size descending, then digest, then first path.
    fn result_order(&self, other: &Self) -> Ordering {
        other
            .size
            .cmp(&self.size)
            .then_with(|| self.digest.cmp(&other.digest))
            .then_with(|| {
                let a = self.files.first().map(|f| f.path.as_path());
                let b = other.files.first().map(|f| f.path.as_path());
                a.cmp(&b)
            })
    }
}

impl fmt::Display for DuplicateGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files of {} bytes ({})",
            self.files.len(),
            self.size,
            self.digest_key()
        )
    }
}

/// Sort groups into scan result order.
pub fn sort_groups(groups: &mut [DuplicateGroup]) {
    groups.sort_by(DuplicateGroup::result_order);
}

/// The group with the most wasted space, ties broken by result order.
#[must_use]
pub fn largest_group(groups: &[DuplicateGroup]) -> Option<&DuplicateGroup> {
    groups.iter().min_by(|a, b| {
        b.wasted_space()
            .cmp(&a.wasted_space())
            .then_with(|| a.result_order(b))
    })
}

/// Drop deleted paths from every group and discard groups left with fewer than two members.
#[must_use]
pub fn prune_deleted(groups: Vec<DuplicateGroup>, deleted: &[PathBuf]) -> Vec<DuplicateGroup> {
    groups
        .into_iter()
        .filter_map(|mut group| {
            group.remove_paths(deleted);
            (group.files.len() >= 2).then_some(group)
        })
        .collect()
}

/// Statistics from the size grouping stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of unique file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in buckets of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton buckets)
    pub eliminated_unique: usize,
    /// Number of zero-byte files encountered
    pub empty_files: usize,
    /// Number of buckets with 2+ files
    pub duplicate_groups: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by size (Stage 1 of duplicate detection).
///
/// Keeps only buckets with two or more members, sorted by size descending.
/// Zero-byte files are bucketed like any other size.
///
/// # Performance
///
/// O(n) in the number of files; metadata only, no file I/O.
///
/// # Example
///
/// ```
/// use dupsweep::scanner::FileRecord;
/// use dupsweep::duplicates::group_by_size;
/// use std::path::PathBuf;
/// use std::time::SystemTime;
///
/// let files = vec![
///     FileRecord::new(PathBuf::from("/a.txt"), 100, SystemTime::now()),
///     FileRecord::new(PathBuf::from("/b.txt"), 100, SystemTime::now()),
///     FileRecord::new(PathBuf::from("/c.txt"), 200, SystemTime::now()),
/// ];
///
/// let (buckets, stats) = group_by_size(files);
///
/// assert_eq!(buckets.len(), 1);
/// assert_eq!(buckets[0].size, 100);
/// assert_eq!(stats.eliminated_unique, 1);
/// ```
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileRecord>,
) -> (Vec<SizeBucket>, GroupingStats) {
    let mut all_groups: HashMap<u64, Vec<FileRecord>> = HashMap::new();
    let mut stats = GroupingStats::default();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;
        if file.size == 0 {
            stats.empty_files += 1;
        }
        all_groups.entry(file.size).or_default().push(file);
    }

    stats.unique_sizes = all_groups.len();

    let mut buckets: Vec<SizeBucket> = all_groups
        .into_iter()
        .filter_map(|(size, files)| {
            if files.len() == 1 {
                stats.eliminated_unique += 1;
                log::trace!(
                    "Eliminated unique size {}: {}",
                    size,
                    files[0].path.display()
                );
                None
            } else {
                stats.potential_duplicates += files.len();
                stats.duplicate_groups += 1;
                log::debug!(
                    "Size bucket {} bytes: {} potential duplicates",
                    size,
                    files.len()
                );
                Some(SizeBucket::with_files(size, files))
            }
        })
        .collect();

    buckets.sort_by(|a, b| b.size.cmp(&a.size));

    log::info!(
        "Stage 1 complete: {} files → {} potential duplicates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (buckets, stats)
}
