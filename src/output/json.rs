//! JSON output.
//!
//! A scan prints a bare array of groups, the same shape `scan_folder`
//! returns:
//!
//! ```json
//! [
//!   {
//!     "hash": "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824",
//!     "size": 2,
//!     "files": [
//!       { "path": "/data/a.txt", "name": "a.txt", "size": 2, "hash": "2cf2...", "extension": "txt" }
//!     ]
//!   }
//! ]
//! ```
//!
//! Size-only groups carry `"size_<bytes>"` in place of the hex digest.

use std::io::Write;

use serde::Serialize;

use crate::duplicates::DuplicateGroup;
use crate::service::DuplicateGroupInfo;

/// Scan result in JSON form.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct JsonOutput {
    /// Groups in result order
    pub groups: Vec<DuplicateGroupInfo>,
}

impl JsonOutput {
    /// Convert `groups` to their wire form.
    #[must_use]
    pub fn new(groups: &[DuplicateGroup]) -> Self {
        Self {
            groups: groups.iter().map(DuplicateGroupInfo::from).collect(),
        }
    }

    /// Compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: W) -> anyhow::Result<()> {
        write_json(writer, self)
    }
}

/// Write any serializable value as pretty JSON plus a trailing newline.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write, T: Serialize + ?Sized>(mut writer: W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
