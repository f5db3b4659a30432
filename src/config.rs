//! Layered application configuration.
//!
//! Settings are merged with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file: `--config FILE`, or `config.toml` in the platform config
//!    directory if it exists
//! 3. `DUPSWEEP_` environment variables, nested with `__`
//!    (e.g. `DUPSWEEP_SCAN__IO_THREADS=8`)
//! 4. CLI flags, applied by the caller
//!
//! ```toml
//! [scan]
//! mode = "size_only"
//! algorithm = "blake3"
//! io_threads = 8
//! ignore_patterns = ["*.tmp", "node_modules/"]
//!
//! [preview]
//! max_text_lines = 40
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::actions::PreviewConfig;
use crate::duplicates::{default_io_threads, FinderConfig, ScanMode};
use crate::scanner::{HashAlgorithm, WalkerConfig, DEFAULT_BUFFER_SIZE};

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "DUPSWEEP_";

/// Errors raised while loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    /// A layer failed to parse or has the wrong shape.
    #[error("Invalid configuration: {0}")]
    Invalid(#[source] Box<figment::Error>),
}

/// `[scan]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Default scan mode.
    pub mode: ScanMode,
    /// Content digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Hashing pool size.
    pub io_threads: usize,
    /// Hasher read buffer size in bytes.
    pub buffer_size: usize,
    /// Follow symbolic links.
    pub follow_symlinks: bool,
    /// Skip hidden files and directories.
    pub skip_hidden: bool,
    /// Skip zero-byte files.
    pub skip_empty: bool,
    /// Maximum recursion depth below the root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    /// Ignore files smaller than this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u64>,
    /// Ignore files larger than this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    /// Gitignore-style patterns to skip.
    pub ignore_patterns: Vec<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            mode: ScanMode::Strict,
            algorithm: HashAlgorithm::default(),
            io_threads: default_io_threads(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            follow_symlinks: false,
            skip_hidden: false,
            skip_empty: false,
            max_depth: None,
            min_size: None,
            max_size: None,
            ignore_patterns: Vec::new(),
        }
    }
}

impl ScanSettings {
    /// Walker options described by these settings.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig {
            follow_symlinks: self.follow_symlinks,
            skip_hidden: self.skip_hidden,
            skip_empty: self.skip_empty,
            max_depth: self.max_depth,
            min_size: self.min_size,
            max_size: self.max_size,
            ignore_patterns: self.ignore_patterns.clone(),
        }
    }

    /// Finder options described by these settings.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_io_threads(self.io_threads)
            .with_algorithm(self.algorithm)
            .with_buffer_size(self.buffer_size)
            .with_walker_config(self.walker_config())
    }
}

/// Application settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Scan behavior.
    pub scan: ScanSettings,
    /// Preview limits.
    pub preview: PreviewConfig,
}

impl Settings {
    /// Load settings from the default layers.
    ///
    /// `config_file` replaces the platform config file; it must exist.
    ///
    /// # Errors
    ///
    /// `FileNotFound` for a missing explicit file, `Invalid` if any layer
    /// fails to parse.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let figment = match config_file {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::FileNotFound(path.to_path_buf()));
                }
                Self::figment(Some(path))
            }
            None => Self::figment(default_config_path().filter(|p| p.is_file()).as_deref()),
        };

        let settings: Self = figment
            .extract()
            .map_err(|e| ConfigError::Invalid(Box::new(e)))?;
        log::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// The figment stack: defaults, then `file` if given, then environment.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            log::debug!("Reading config file {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

/// Platform-specific config file location.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "dupsweep", "dupsweep").map(|dirs| dirs.config_dir().join("config.toml"))
}
