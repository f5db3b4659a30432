//! File preview functionality.
//!
//! This module turns a file into something a frontend can show directly:
//! - Images become a `data:` URL (downscaled to a PNG thumbnail when large)
//! - Text files become their first lines
//! - Everything else is reported as unsupported, with a reason
//!
//! [`preview_file`] never fails. Missing, unreadable, or undecodable files
//! degrade to [`PreviewKind::Unsupported`].
//!
//! # Example
//!
//! ```no_run
//! use dupsweep::actions::preview::{preview_file, PreviewConfig, PreviewKind};
//! use std::path::Path;
//!
//! let preview = preview_file(Path::new("notes.txt"), &PreviewConfig::default());
//! match preview.kind {
//!     PreviewKind::Text => println!("{}", preview.content),
//!     PreviewKind::Image => println!("image, {} bytes of data URL", preview.content.len()),
//!     PreviewKind::Unsupported => println!("no preview: {}", preview.content),
//! }
//! ```

use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::scanner::extension_of;

/// Bytes to sample for binary detection.
const BINARY_DETECT_BYTES: usize = 512;

/// Known text file extensions.
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "rs", "js", "ts", "tsx", "jsx", "css", "html", "json", "toml", "yaml", "yml",
    "xml", "csv", "log", "py", "java", "c", "cpp", "h", "hpp", "go", "rb", "php", "sh", "bat",
    "ps1", "ini", "cfg", "conf", "sql",
];

/// Known image extensions and their MIME types.
const IMAGE_MIME_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("webp", "image/webp"),
    ("ico", "image/x-icon"),
    ("svg", "image/svg+xml"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
];

/// What kind of preview was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewKind {
    /// `content` is a `data:` URL.
    Image,
    /// `content` is the leading lines of the file.
    Text,
    /// `content` is a human-readable reason.
    Unsupported,
}

impl PreviewKind {
    /// Wire name of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Text => "text",
            Self::Unsupported => "unsupported",
        }
    }
}

/// Preview content with type information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewResult {
    /// The preview kind.
    pub kind: PreviewKind,
    /// Data URL, text excerpt, or reason, depending on `kind`.
    pub content: String,
    /// Path as requested.
    pub path: PathBuf,
}

impl PreviewResult {
    fn image(path: &Path, data_url: String) -> Self {
        Self {
            kind: PreviewKind::Image,
            content: data_url,
            path: path.to_path_buf(),
        }
    }

    fn text(path: &Path, excerpt: String) -> Self {
        Self {
            kind: PreviewKind::Text,
            content: excerpt,
            path: path.to_path_buf(),
        }
    }

    fn unsupported(path: &Path, reason: impl Into<String>) -> Self {
        Self {
            kind: PreviewKind::Unsupported,
            content: reason.into(),
            path: path.to_path_buf(),
        }
    }
}

/// Preview limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Images up to this size are embedded as-is.
    pub max_image_bytes: u64,
    /// Bounding box, in pixels, of thumbnails made for larger images.
    pub thumbnail_size: u32,
    /// Maximum lines in a text preview.
    pub max_text_lines: usize,
    /// Maximum bytes read for a text preview.
    pub max_text_bytes: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: 2 * 1024 * 1024,
            thumbnail_size: 256,
            max_text_lines: 20,
            max_text_bytes: 8 * 1024,
        }
    }
}

/// Preview a file, detecting the appropriate kind from its extension and content.
#[must_use]
pub fn preview_file(path: &Path, config: &PreviewConfig) -> PreviewResult {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return PreviewResult::unsupported(path, format!("File not found: {}", path.display()));
        }
        Err(e) => {
            return PreviewResult::unsupported(path, format!("Failed to read file: {}", e));
        }
    };
    if !metadata.is_file() {
        return PreviewResult::unsupported(path, format!("Not a file: {}", path.display()));
    }

    let extension = extension_of(path);

    if let Some(mime) = image_mime(&extension) {
        return preview_image(path, metadata.len(), mime, config);
    }

    if TEXT_EXTENSIONS.contains(&extension.as_str()) || looks_like_text(path) {
        return preview_text(path, config);
    }

    if extension.is_empty() {
        PreviewResult::unsupported(path, "Preview not available for this file type")
    } else {
        PreviewResult::unsupported(
            path,
            format!("Preview not available for .{} files", extension),
        )
    }
}

fn image_mime(extension: &str) -> Option<&'static str> {
    IMAGE_MIME_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Embed small images directly; downscale larger ones.
fn preview_image(path: &Path, size: u64, mime: &str, config: &PreviewConfig) -> PreviewResult {
    if size <= config.max_image_bytes {
        return match fs::read(path) {
            Ok(bytes) => PreviewResult::image(path, data_url(mime, &bytes)),
            Err(e) => PreviewResult::unsupported(path, format!("Failed to read image: {}", e)),
        };
    }

    match make_thumbnail(path, config.thumbnail_size) {
        Ok(png) => {
            log::debug!(
                "Previewing {} as a {} px thumbnail ({} bytes)",
                path.display(),
                config.thumbnail_size,
                size
            );
            PreviewResult::image(path, data_url("image/png", &png))
        }
        Err(e) => {
            log::debug!("Thumbnail failed for {}: {}", path.display(), e);
            PreviewResult::unsupported(
                path,
                format!(
                    "Image too large to preview ({}) and could not be downscaled",
                    bytesize::ByteSize(size)
                ),
            )
        }
    }
}

fn make_thumbnail(path: &Path, bound: u32) -> image::ImageResult<Vec<u8>> {
    let img = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?;
    let thumb = img.thumbnail(bound, bound);
    let mut png = Vec::new();
    thumb.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    Ok(png)
}

/// Read up to `limit` bytes from the start of the file.
fn read_head(path: &Path, limit: usize) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(limit.min(64 * 1024));
    File::open(path)?
        .take(limit as u64)
        .read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Decode a possibly truncated buffer, tolerating a partial character at the end.
fn decode_utf8_prefix(bytes: &[u8]) -> Option<&str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Some(s),
        Err(e) if e.error_len().is_none() => std::str::from_utf8(&bytes[..e.valid_up_to()]).ok(),
        Err(_) => None,
    }
}

/// Content sniff for files with unknown extensions.
fn looks_like_text(path: &Path) -> bool {
    match read_head(path, BINARY_DETECT_BYTES) {
        Ok(sample) => !sample.contains(&0) && decode_utf8_prefix(&sample).is_some(),
        Err(_) => false,
    }
}

fn preview_text(path: &Path, config: &PreviewConfig) -> PreviewResult {
    let bytes = match read_head(path, config.max_text_bytes) {
        Ok(b) => b,
        Err(e) => return PreviewResult::unsupported(path, format!("Failed to read file: {}", e)),
    };

    let Some(text) = decode_utf8_prefix(&bytes) else {
        return PreviewResult::unsupported(path, "File is not valid UTF-8 text");
    };

    let excerpt = text
        .lines()
        .take(config.max_text_lines)
        .collect::<Vec<_>>()
        .join("\n");
    PreviewResult::text(path, excerpt)
}
