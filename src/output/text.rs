//! Human-readable scan report.
//!
//! Colors come from `yansi` and are switched off globally with
//! `yansi::disable()` (the CLI does this for `--no-color`).

use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::Paint;

use crate::duplicates::{DuplicateGroup, ScanSummary};

/// Text report over a finished scan.
pub struct TextOutput<'a> {
    groups: &'a [DuplicateGroup],
    summary: &'a ScanSummary,
}

impl<'a> TextOutput<'a> {
    /// Report on `groups` and `summary`.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup], summary: &'a ScanSummary) -> Self {
        Self { groups, summary }
    }

    /// Write the full report.
    ///
    /// # Errors
    ///
    /// Returns any error from `writer`.
    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for (index, group) in self.groups.iter().enumerate() {
            self.write_group(&mut writer, index + 1, group)?;
        }
        self.write_summary(&mut writer)?;
        writer.flush()
    }

    fn write_group<W: Write>(&self, w: &mut W, number: usize, group: &DuplicateGroup) -> io::Result<()> {
        writeln!(
            w,
            "{} {} files, {} each, {} reclaimable",
            format!("Group {number}:").bold(),
            group.len(),
            ByteSize(group.size),
            ByteSize(group.wasted_space()).yellow()
        )?;
        writeln!(w, "  {}", group.digest_key().dim())?;
        for file in &group.files {
            writeln!(w, "  {}", file.path.display())?;
        }
        writeln!(w)
    }

    fn write_summary<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let s = self.summary;
        if self.groups.is_empty() {
            writeln!(
                w,
                "{} among {} files ({})",
                "No duplicates found".green(),
                s.total_files,
                s.total_size_display()
            )?;
        } else {
            writeln!(
                w,
                "Found {} duplicate groups ({} redundant files) among {} files",
                s.duplicate_groups.bold(),
                s.duplicate_files,
                s.total_files
            )?;
            writeln!(
                w,
                "Reclaimable: {} ({:.1}% of {})",
                s.reclaimable_display().yellow().bold(),
                s.wasted_percentage(),
                s.total_size_display()
            )?;
        }

        if s.had_errors() {
            writeln!(
                w,
                "{} {} entries skipped, {} files could not be hashed",
                "Warning:".red().bold(),
                s.skipped_entries,
                s.hash_failures
            )?;
        }

        writeln!(
            w,
            "Mode: {}, completed in {:.2}s",
            s.mode,
            s.scan_duration.as_secs_f64()
        )
    }
}
