//! File actions module.
//!
//! This module provides functionality for:
//! - Safe deletion to a recoverable store (OS trash by default)
//! - File preview (image data URLs, text excerpts)
//!
//! # Deletion
//!
//! ```no_run
//! use dupsweep::actions::{delete_paths, SystemTrash};
//! use std::path::PathBuf;
//!
//! let outcome = delete_paths(&[PathBuf::from("/path/to/duplicate.txt")], &SystemTrash, None);
//! for failure in &outcome.failed {
//!     eprintln!("{}: {}", failure.path.display(), failure.error);
//! }
//! ```
//!
//! # Preview
//!
//! ```no_run
//! use dupsweep::actions::{preview_file, PreviewConfig};
//! use std::path::Path;
//!
//! let preview = preview_file(Path::new("example.txt"), &PreviewConfig::default());
//! println!("{}", preview.content);
//! ```

pub mod delete;
pub mod preview;

pub use delete::{
    delete_one, delete_paths, DeleteError, DeleteFailure, DeleteOutcome, DeleteProgressCallback,
    DirectoryTrash, SystemTrash, Trash,
};
pub use preview::{preview_file, PreviewConfig, PreviewKind, PreviewResult};
