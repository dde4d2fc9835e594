//! MIME detection and coarse content classification.
//!
//! Detection looks at the file name first and falls back to magic bytes
//! from the head of the content. Classification maps a MIME type onto
//! the bucket a blob is stored under.

use std::fmt;

use serde::{Deserialize, Serialize};

/// MIME type used when neither the name nor the content identify a type.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// MIME type reported for directories in mixed listings.
pub const DIRECTORY_MIME: &str = "inode/directory";

/// Top-level content bucket a blob is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentBucket {
    /// Raster and vector images.
    Images,
    /// Text, PDF, and office documents.
    Documents,
    /// Everything else (archives, binaries).
    Others,
}

impl ContentBucket {
    /// All buckets, in directory creation order.
    pub const ALL: [ContentBucket; 3] = [Self::Images, Self::Documents, Self::Others];

    /// Directory name of the bucket under the content root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Documents => "documents",
            Self::Others => "others",
        }
    }

    /// Classify a MIME type.
    pub fn classify(mime: &str) -> Self {
        let mime = mime.to_ascii_lowercase();
        if mime.starts_with("image/") {
            return Self::Images;
        }
        if mime.starts_with("text/")
            || mime == "application/pdf"
            || mime == "application/msword"
            || mime == "application/rtf"
            || mime.starts_with("application/vnd.openxmlformats-officedocument")
            || mime.starts_with("application/vnd.ms-")
            || mime.starts_with("application/vnd.oasis.opendocument")
        {
            return Self::Documents;
        }
        Self::Others
    }
}

impl fmt::Display for ContentBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Lowercased extension of a file name, without the dot.
pub fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.contains(['/', '\\']) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Guess a MIME type from a file name alone.
pub fn mime_from_name(name: &str) -> Option<String> {
    extension_of(name)?;
    mime_guess::from_path(name)
        .first()
        .map(|m| m.essence_str().to_string())
}

/// Identify well-known formats by their leading bytes.
pub fn mime_from_magic(head: &[u8]) -> Option<&'static str> {
    const SIGNATURES: &[(&[u8], &str)] = &[
        (&[0xFF, 0xD8, 0xFF], "image/jpeg"),
        (&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A], "image/png"),
        (b"GIF87a", "image/gif"),
        (b"GIF89a", "image/gif"),
        (b"%PDF", "application/pdf"),
        (&[0x50, 0x4B, 0x03, 0x04], "application/zip"),
        (b"BM", "image/bmp"),
    ];

    if head.len() >= 12 && &head[0..4] == b"RIFF" && &head[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    SIGNATURES
        .iter()
        .find(|(magic, _)| head.starts_with(magic))
        .map(|(_, mime)| *mime)
}

/// Detect the MIME type of a blob from its name and first bytes.
pub fn detect_mime(name: &str, head: &[u8]) -> String {
    mime_from_name(name)
        .or_else(|| mime_from_magic(head).map(str::to_string))
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}

/// Whether a type pattern matches a file.
///
/// Patterns are an exact MIME type (`image/png`), a major-type wildcard
/// (`image/*`), or a bare extension with or without a leading dot (`png`).
/// Comparison is case-insensitive.
pub fn type_pattern_matches(pattern: &str, mime: &str, name: &str) -> bool {
    let pattern = pattern.trim().to_ascii_lowercase();
    if pattern.is_empty() {
        return false;
    }
    let mime = mime.to_ascii_lowercase();
    if let Some(major) = pattern.strip_suffix("/*") {
        return mime.split('/').next() == Some(major);
    }
    if pattern.contains('/') {
        return mime == pattern;
    }
    let ext = pattern.trim_start_matches('.');
    extension_of(name).is_some_and(|e| e == ext)
}
