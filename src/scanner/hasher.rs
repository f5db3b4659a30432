//! Streaming file hasher.
//!
//! # Overview
//!
//! [`Hasher`] computes a 256-bit content digest of a file by streaming it
//! through a fixed-size buffer, so memory use does not grow with file size.
//! SHA-256 is the default; BLAKE3 is available as a faster alternative.
//!
//! The hasher holds no mutable state between calls and can be shared across
//! worker threads behind an `Arc`.
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::scanner::{hash_to_hex, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new();
//! let digest = hasher.full_hash(Path::new("photo.png")).unwrap();
//! println!("{}", hash_to_hex(&digest));
//! ```

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::Digest as _;

use super::{FileRecord, HashError};

/// Default read buffer size (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Smallest buffer the hasher will use.
const MIN_BUFFER_SIZE: usize = 4 * 1024;

/// A 256-bit content digest.
pub type Digest = [u8; 32];

/// Content hash algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256 (FIPS 180-4).
    #[default]
    Sha256,
    /// BLAKE3.
    Blake3,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            other => Err(format!(
                "unknown hash algorithm '{other}' (expected 'sha256' or 'blake3')"
            )),
        }
    }
}

/// Incremental state for one hashing run.
enum State {
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl State {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(bytes),
            Self::Blake3(h) => {
                h.update(bytes);
            }
        }
    }

    fn finalize(self) -> Digest {
        match self {
            Self::Sha256(h) => h.finalize().into(),
            Self::Blake3(h) => *h.finalize().as_bytes(),
        }
    }
}

/// Streaming content hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    buffer_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a SHA-256 hasher with the default buffer size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            shutdown_flag: None,
        }
    }

    /// Select the hash algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the read buffer size (clamped to at least 4 KiB).
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(MIN_BUFFER_SIZE);
        self
    }

    /// Set the shutdown flag, checked between buffer reads.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The configured algorithm.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The configured buffer size.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Hash the entire content of a file.
    ///
    /// # Errors
    ///
    /// Returns `HashError` if the file cannot be opened or read, or if
    /// shutdown is requested mid-file.
    pub fn full_hash(&self, path: &Path) -> Result<Digest, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let (digest, _) = self.stream(path, file)?;
        Ok(digest)
    }

    /// Hash a walked file, verifying it still has the recorded size.
    ///
    /// The length is checked on the open handle before reading and again
    /// against the number of bytes actually streamed, so a file that grows,
    /// shrinks, or is replaced between the walk and the hash is reported as
    /// [`HashError::Changed`] instead of producing a digest for stale data.
    ///
    /// # Errors
    ///
    /// Returns `HashError` on I/O failure, size mismatch, or shutdown.
    pub fn hash_record(&self, record: &FileRecord) -> Result<Digest, HashError> {
        let path = record.path.as_path();
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;

        let current = file
            .metadata()
            .map_err(|e| HashError::from_io(path, e))?
            .len();
        if current != record.size {
            return Err(HashError::Changed {
                path: record.path.clone(),
                expected: record.size,
                actual: current,
            });
        }

        let (digest, bytes_read) = self.stream(path, file)?;
        if bytes_read != record.size {
            return Err(HashError::Changed {
                path: record.path.clone(),
                expected: record.size,
                actual: bytes_read,
            });
        }

        Ok(digest)
    }

    /// Stream `reader` through the digest, returning it with the byte count.
    fn stream(&self, path: &Path, mut reader: impl Read) -> Result<(Digest, u64), HashError> {
        let mut state = State::new(self.algorithm);
        let mut buffer = vec![0u8; self.buffer_size];
        let mut total: u64 = 0;

        loop {
            if self.is_shutdown_requested() {
                log::trace!("Hashing interrupted: {}", path.display());
                return Err(HashError::Interrupted(path.to_path_buf()));
            }

            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };

            state.update(&buffer[..n]);
            total += n as u64;
        }

        Ok((state.finalize(), total))
    }
}

/// Render a digest as lowercase hexadecimal.
#[must_use]
pub fn hash_to_hex(hash: &Digest) -> String {
    use std::fmt::Write;

    hash.iter().fold(String::with_capacity(64), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// Parse a 64-character hexadecimal string into a digest.
#[must_use]
pub fn hex_to_hash(hex: &str) -> Option<Digest> {
    if hex.len() != 64 || !hex.is_ascii() {
        return None;
    }

    let mut out = [0u8; 32];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(out)
}
