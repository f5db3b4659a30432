//! Command-line interface definitions.
//!
//! Global options (verbosity, color, config file) apply to every
//! subcommand. Scan options left unset fall back to the loaded
//! [`Settings`](crate::config::Settings).
//!
//! # Example
//!
//! ```bash
//! # Strict scan with text output
//! dupsweep scan ~/Downloads
//!
//! # Size-only scan as JSON
//! dupsweep scan ~/Downloads --mode size-only --output json
//!
//! # Preview one file, then trash two
//! dupsweep preview ~/Downloads/a.png
//! dupsweep delete ~/Downloads/a.png ~/Downloads/b.png
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::ScanSettings;
use crate::duplicates::ScanMode;
use crate::scanner::HashAlgorithm;

/// Duplicate file finder with trash-backed deletion.
///
/// Groups files by size, confirms duplicates by content digest, and moves
/// unwanted copies to the system trash.
#[derive(Debug, Parser)]
#[command(name = "dupsweep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (default: platform config dir)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory for duplicate files
    Scan(ScanArgs),
    /// Preview a file as JSON
    Preview(PreviewArgs),
    /// Move files to the trash and report the outcome as JSON
    Delete(DeleteArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory path to scan for duplicates
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Grouping mode: strict (size + content) or size-only
    #[arg(short, long, value_name = "MODE")]
    pub mode: Option<ScanMode>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Content digest algorithm: sha256 or blake3
    #[arg(long, value_name = "ALGO")]
    pub algorithm: Option<HashAlgorithm>,

    /// Minimum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Maximum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// Gitignore-style patterns to skip (can be specified multiple times)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Follow symbolic links during scan (cycles are detected)
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Skip zero-byte files
    #[arg(long)]
    pub skip_empty: bool,

    /// Maximum directory depth below PATH
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Number of I/O threads for hashing (default: available cores)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub io_threads: Option<u16>,
}

impl ScanArgs {
    /// Overlay the flags that were given on top of `settings`.
    pub fn apply_to(&self, settings: &mut ScanSettings) {
        if let Some(mode) = self.mode {
            settings.mode = mode;
        }
        if let Some(algorithm) = self.algorithm {
            settings.algorithm = algorithm;
        }
        if let Some(threads) = self.io_threads {
            settings.io_threads = usize::from(threads);
        }
        if self.min_size.is_some() {
            settings.min_size = self.min_size;
        }
        if self.max_size.is_some() {
            settings.max_size = self.max_size;
        }
        if self.max_depth.is_some() {
            settings.max_depth = self.max_depth;
        }
        settings.follow_symlinks |= self.follow_symlinks;
        settings.skip_hidden |= self.skip_hidden;
        settings.skip_empty |= self.skip_empty;
        settings
            .ignore_patterns
            .extend(self.ignore_patterns.iter().cloned());
    }
}

/// Arguments for the preview subcommand.
#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// File to preview
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

/// Arguments for the delete subcommand.
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Files to move to the trash
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Move files into this directory instead of the system trash
    #[arg(long, value_name = "DIR")]
    pub trash_dir: Option<PathBuf>,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    Text,
    /// JSON array of duplicate groups
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupsweep::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1.5MB").unwrap(), 1_500_000);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
