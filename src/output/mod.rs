//! Output formatters for scan results and boundary operations.
//!
//! - [`text`]: colored human-readable report
//! - [`json`]: wire types serialized with serde_json
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::duplicates::{DuplicateFinder, ScanMode};
//! use dupsweep::output::json::JsonOutput;
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::with_defaults();
//! let (groups, _summary) = finder.find_duplicates(Path::new("."), ScanMode::Strict).unwrap();
//!
//! let output = JsonOutput::new(&groups);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

pub use json::{write_json, JsonOutput};
pub use text::TextOutput;
