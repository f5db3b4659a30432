//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping (Stage 1)
//! - Content hash regrouping (Stage 2, strict mode only)
//! - Duplicate group management and caller-side pruning

pub mod finder;
pub mod groups;

pub use finder::{
    default_io_threads, hash_buckets, size_only_groups, validate_root, DuplicateFinder,
    FinderConfig, FinderError, HashConfig, HashStats, ParseScanModeError, ScanMode, ScanSummary,
};
pub use groups::{
    group_by_size, largest_group, prune_deleted, sort_groups, DuplicateGroup, GroupDigest,
    GroupingStats, SizeBucket,
};
