//! Source file types.
//!
//! A [`SelectedFile`] is an entry in the session's file list: a name, a
//! detected [`SourceKind`] and the place its bytes come from. Reading it
//! yields an immutable [`SourceFile`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// Kind of a source file, detected from its MIME type or extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// `image/jpeg`
    Jpeg,
    /// `image/png`
    Png,
    /// `application/pdf`
    Pdf,
    /// Anything else; carries the MIME type or extension that was seen.
    Unsupported(String),
}

impl SourceKind {
    /// Detect the kind from a MIME type.
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/png" => Self::Png,
            "application/pdf" => Self::Pdf,
            other => Self::Unsupported(other.to_string()),
        }
    }

    /// Detect the kind from a path's extension.
    ///
    /// Returns `None` when the path has no extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        Some(match ext.as_str() {
            "jpg" | "jpeg" | "jpe" => Self::Jpeg,
            "png" => Self::Png,
            "pdf" => Self::Pdf,
            _ => Self::Unsupported(format!(".{ext}")),
        })
    }

    /// Detect the kind from leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(b"%PDF-") {
            Some(Self::Pdf)
        } else {
            None
        }
    }

    /// MIME type string for this kind.
    pub fn mime(&self) -> &str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
            Self::Unsupported(mime) => mime,
        }
    }

    /// Whether the merge can process this kind.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

impl Serialize for SourceKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.mime())
    }
}

/// Where the bytes of a selected file live.
#[derive(Debug, Clone)]
pub enum FileOrigin {
    /// A file on disk, read when the merge starts.
    Path(PathBuf),
    /// Bytes already in memory.
    Memory(Arc<[u8]>),
}

/// An entry in the session's file list.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    /// Display name (the file's base name).
    pub name: String,
    /// Detected kind.
    pub kind: SourceKind,
    /// Location of the bytes.
    pub origin: FileOrigin,
}

impl SelectedFile {
    /// Select a file on disk, detecting its kind from the extension.
    ///
    /// Paths without a recognizable extension are sniffed when read.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let kind = SourceKind::from_extension(&path)
            .unwrap_or_else(|| SourceKind::Unsupported(String::new()));

        Self {
            name,
            kind,
            origin: FileOrigin::Path(path),
        }
    }

    /// Select in-memory bytes with an explicit MIME type.
    pub fn from_bytes(name: impl Into<String>, mime: &str, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::from_mime(mime),
            origin: FileOrigin::Memory(bytes.into()),
        }
    }
}

/// A file whose contents have been read. Immutable once created.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Display name.
    pub name: String,
    /// Kind, refined by sniffing when a path's extension was not conclusive.
    pub kind: SourceKind,
    /// Raw file contents.
    pub bytes: Arc<[u8]>,
}

impl SourceFile {
    /// Size of the contents in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
