//! MIME type detection module
//!
//! Two-tier lookup: a process-wide read-only default table plus a per-instance
//! [`MimeTypes`] table seeded from it. Only the instance table is mutable.
//! Buffers can also be classified by their leading magic bytes.

use crate::error::MimeError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

/// Fallback when nothing better is known
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Default extension table (lowercase, no leading dot)
const DEFAULT_TYPES: &[(&str, &str)] = &[
    // Text
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("csv", "text/csv"),
    ("xml", "application/xml"),
    ("ics", "text/calendar"),
    // JavaScript/WASM
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("json", "application/json"),
    ("map", "application/json"),
    ("jsonld", "application/ld+json"),
    ("webmanifest", "application/manifest+json"),
    ("wasm", "application/wasm"),
    // Images
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("avif", "image/avif"),
    // Audio
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("flac", "audio/flac"),
    ("m4a", "audio/mp4"),
    ("aac", "audio/aac"),
    ("oga", "audio/ogg"),
    ("opus", "audio/opus"),
    ("mid", "audio/midi"),
    ("midi", "audio/midi"),
    // Video
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("ogg", "video/ogg"),
    ("ogv", "video/ogg"),
    ("mov", "video/quicktime"),
    ("avi", "video/x-msvideo"),
    ("mpeg", "video/mpeg"),
    ("mkv", "video/x-matroska"),
    // Fonts
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("otf", "font/otf"),
    ("eot", "application/vnd.ms-fontobject"),
    // Archives
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("gzip", "application/gzip"),
    ("tar", "application/x-tar"),
    ("7z", "application/x-7z-compressed"),
    ("rar", "application/vnd.rar"),
    ("bz2", "application/x-bzip2"),
    // Documents
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("xls", "application/vnd.ms-excel"),
    (
        "xlsx",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    ),
    ("ppt", "application/vnd.ms-powerpoint"),
    (
        "pptx",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ),
    ("rtf", "application/rtf"),
    ("epub", "application/epub+zip"),
];

/// Magic-number signatures checked by [`type_for_buffer`], first match wins
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1F\x8B", "application/gzip"),
    (b"BM", "image/bmp"),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    (b"wOFF", "font/woff"),
    (b"wOF2", "font/woff2"),
    (b"OggS", "audio/ogg"),
    (b"fLaC", "audio/flac"),
    (b"ID3", "audio/mpeg"),
    (b"\x00asm", "application/wasm"),
    (b"7z\xBC\xAF\x27\x1C", "application/x-7z-compressed"),
    (b"\x1A\x45\xDF\xA3", "video/webm"),
];

fn default_table() -> &'static HashMap<&'static str, &'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| DEFAULT_TYPES.iter().copied().collect())
}

/// Lowercase an extension and strip any leading dots
fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_ascii_lowercase()
}

fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// Get MIME type for an extension from the default table
///
/// # Examples
/// ```
/// use rust_router::http::mime::get_content_type;
/// assert_eq!(get_content_type(".HTML"), Some("text/html"));
/// assert_eq!(get_content_type("nope"), None);
/// ```
pub fn get_content_type(extension: &str) -> Option<&'static str> {
    default_table()
        .get(normalize_extension(extension).as_str())
        .copied()
}

/// Same as [`get_content_type`] for a file path, falling back to
/// `application/octet-stream`
pub fn get_content_type_for_file(path: impl AsRef<Path>) -> &'static str {
    extension_of(path.as_ref())
        .and_then(get_content_type)
        .unwrap_or(DEFAULT_MIME_TYPE)
}

/// Sniff a MIME type from leading magic bytes
pub fn type_for_buffer(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" {
        return match &bytes[8..12] {
            b"WEBP" => Some("image/webp"),
            b"WAVE" => Some("audio/wav"),
            b"AVI " => Some("video/x-msvideo"),
            _ => None,
        };
    }

    if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        return match &bytes[8..12] {
            b"avif" => Some("image/avif"),
            b"M4A " => Some("audio/mp4"),
            b"qt  " => Some("video/quicktime"),
            _ => Some("video/mp4"),
        };
    }

    SIGNATURES
        .iter()
        .find(|(magic, _)| bytes.starts_with(magic))
        .map(|(_, mime)| *mime)
}

/// Per-instance MIME table, seeded from the default table
#[derive(Debug, Clone)]
pub struct MimeTypes {
    types: HashMap<String, String>,
}

impl MimeTypes {
    pub fn new() -> Self {
        let types = DEFAULT_TYPES
            .iter()
            .map(|(ext, mime)| ((*ext).to_string(), (*mime).to_string()))
            .collect();
        Self { types }
    }

    /// Register or replace a type in this instance only
    pub fn add_type(&mut self, extension: &str, mime_type: &str) -> Result<(), MimeError> {
        let extension = normalize_extension(extension);
        if extension.is_empty() {
            return Err(MimeError::EmptyExtension);
        }
        let mime_type = mime_type.trim();
        if mime_type.is_empty() {
            return Err(MimeError::EmptyMimeType);
        }
        self.types.insert(extension, mime_type.to_string());
        Ok(())
    }

    pub fn type_for_extension(&self, extension: &str) -> Option<&str> {
        self.types
            .get(&normalize_extension(extension))
            .map(String::as_str)
    }

    /// Type for a file path, `application/octet-stream` when unknown
    pub fn type_for_file(&self, path: impl AsRef<Path>) -> &str {
        extension_of(path.as_ref())
            .and_then(|ext| self.type_for_extension(ext))
            .unwrap_or(DEFAULT_MIME_TYPE)
    }

    pub fn type_for_buffer(&self, bytes: &[u8]) -> Option<&'static str> {
        type_for_buffer(bytes)
    }
}

impl Default for MimeTypes {
    fn default() -> Self {
        Self::new()
    }
}
