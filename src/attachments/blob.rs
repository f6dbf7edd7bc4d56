//! Binary attachment sources

use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// MIME type used when nothing better is known
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Where the blob's bytes live
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlobSource {
    /// Bytes already in memory (clipboard, drag payload)
    Bytes(Arc<[u8]>),
    /// A file read lazily by the encoder
    File(PathBuf),
}

/// An opaque binary handle selected or dropped by the user
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageBlob {
    /// Display name (file name for picked files)
    pub name: String,
    /// Declared MIME type, if the source provided one
    pub mime_type: Option<String>,
    source: BlobSource,
}

impl ImageBlob {
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: Option<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type,
            source: BlobSource::Bytes(bytes.into()),
        }
    }

    /// Reference a file on disk. The type is taken from the extension, the
    /// way a file picker declares it; nothing is read until encoding.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_from_extension(&path).map(str::to_string);
        Self {
            name,
            mime_type,
            source: BlobSource::File(path),
        }
    }

    pub fn source(&self) -> &BlobSource {
        &self.source
    }

    /// Whether the declared type passes an `image/*` accept filter
    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|mime| mime.starts_with("image/"))
    }

    /// Size in bytes, taken from file metadata without loading the file
    pub fn size(&self) -> Result<u64> {
        match &self.source {
            BlobSource::Bytes(bytes) => Ok(bytes.len() as u64),
            BlobSource::File(path) => Ok(std::fs::metadata(path)?.len()),
        }
    }

    /// Load the blob's bytes
    pub fn read(&self) -> Result<Arc<[u8]>> {
        match &self.source {
            BlobSource::Bytes(bytes) => Ok(Arc::clone(bytes)),
            BlobSource::File(path) => Ok(std::fs::read(path)?.into()),
        }
    }

    /// Declared type, else sniffed from content, else the fallback
    pub fn resolve_mime(&self, bytes: &[u8]) -> String {
        self.mime_type
            .clone()
            .filter(|mime| !mime.is_empty())
            .or_else(|| sniff_image_mime(bytes).map(str::to_string))
            .unwrap_or_else(|| FALLBACK_MIME.to_string())
    }
}

/// Guess an image type from a file extension
pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        "ico" => Some("image/x-icon"),
        "avif" => Some("image/avif"),
        _ => None,
    }
}

/// Recognize common raster formats by their magic bytes
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.starts_with(b"BM") {
        Some("image/bmp")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_uses_extension() {
        let blob = ImageBlob::from_path("/tmp/photos/Cat.JPG");
        assert_eq!(blob.name, "Cat.JPG");
        assert_eq!(blob.mime_type.as_deref(), Some("image/jpeg"));
        assert!(blob.is_image());
    }

    #[test]
    fn test_unknown_extension_is_not_image() {
        let blob = ImageBlob::from_path("notes.txt");
        assert_eq!(blob.mime_type, None);
        assert!(!blob.is_image());
    }

    #[test]
    fn test_sniffing() {
        assert_eq!(sniff_image_mime(b"\x89PNG\r\n\x1a\n...."), Some("image/png"));
        assert_eq!(sniff_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_image_mime(b"GIF89a"), Some("image/gif"));
        assert_eq!(sniff_image_mime(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_image_mime(b"hello"), None);
    }

    #[test]
    fn test_resolve_mime_order() {
        let declared = ImageBlob::from_bytes("a", Some("image/gif".into()), b"\x89PNG\r\n\x1a\n".to_vec());
        assert_eq!(declared.resolve_mime(b"\x89PNG\r\n\x1a\n"), "image/gif");

        let sniffed = ImageBlob::from_bytes("b", None, b"GIF87a".to_vec());
        assert_eq!(sniffed.resolve_mime(b"GIF87a"), "image/gif");

        let unknown = ImageBlob::from_bytes("c", Some(String::new()), b"??".to_vec());
        assert_eq!(unknown.resolve_mime(b"??"), FALLBACK_MIME);
    }

    #[test]
    fn test_size_of_file_and_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, &[0u8; 42]).unwrap();

        assert_eq!(ImageBlob::from_path(file.path()).size().unwrap(), 42);
        assert_eq!(ImageBlob::from_bytes("b", None, vec![1, 2, 3]).size().unwrap(), 3);
        assert!(ImageBlob::from_path("/definitely/not/here.png").size().is_err());
    }

    #[test]
    fn test_read_missing_file_fails() {
        let blob = ImageBlob::from_path("/definitely/not/here.png");
        assert!(blob.read().is_err());
    }
}
