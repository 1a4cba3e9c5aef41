//! File attachments: on-demand size, base64 text, and MIME type lookup.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Column width for base64 attachment bodies, per RFC 2045.
const BASE64_LINE_WIDTH: usize = 76;

/// Fallback when the extension table has no mapping.
const UNKNOWN_MIME_TYPE: &str = "application/unknown";

/// Static extension-to-MIME-type table, keyed by lowercase extension.
static MIME_TYPES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "txt" => "text/plain",
    "html" => "text/html",
    "htm" => "text/html",
    "css" => "text/css",
    "csv" => "text/csv",
    "pdf" => "application/pdf",
    "zip" => "application/zip",
    "gz" => "application/gzip",
    "json" => "application/json",
    "xml" => "application/xml",
    "doc" => "application/msword",
    "jpg" => "image/jpeg",
    "jpeg" => "image/jpeg",
    "png" => "image/png",
    "gif" => "image/gif",
    "svg" => "image/svg+xml",
    "mp3" => "audio/mpeg",
    "mp4" => "video/mp4",
    "eml" => "message/rfc822",
};

/// A file referenced by a message.
///
/// Content is read on demand at render time and never cached. A missing or
/// unreadable file is not fatal: size degrades to zero and the base64 body
/// to an empty string, so the message still transmits.
#[derive(Debug, Clone)]
pub struct Attachment {
    path: PathBuf,
    short_name: String,
}

impl Attachment {
    /// Reference the file at `path`. The display name used in MIME part
    /// headers is the final path segment.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let short_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self { path, short_name }
    }

    /// The path this attachment refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The base name emitted in the MIME part headers.
    #[must_use]
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// File size in bytes, zero when the file cannot be read.
    #[must_use]
    pub fn size(&self) -> u64 {
        fs::metadata(&self.path).map(|meta| meta.len()).unwrap_or(0)
    }

    /// The file content encoded as base64, wrapped at 76 columns with each
    /// line CRLF-terminated. Empty when the file cannot be read.
    #[must_use]
    pub fn base64(&self) -> String {
        let Ok(bytes) = fs::read(&self.path) else {
            return String::new();
        };

        let encoded = STANDARD.encode(bytes);
        let mut wrapped =
            String::with_capacity(encoded.len() + (encoded.len() / BASE64_LINE_WIDTH + 1) * 2);
        for chunk in encoded.as_bytes().chunks(BASE64_LINE_WIDTH) {
            // chunks of base64 output are always valid UTF-8
            wrapped.push_str(std::str::from_utf8(chunk).unwrap_or_default());
            wrapped.push_str("\r\n");
        }

        wrapped
    }

    /// MIME type resolved from the extension table,
    /// `application/unknown` when no mapping is found.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .and_then(|ext| MIME_TYPES.get(ext.as_str()).copied())
            .unwrap_or(UNKNOWN_MIME_TYPE)
    }
}
