//! Error types for pdfstitch.
//!
//! Errors fall into two groups. File-local errors (an unreadable file, an
//! unsupported type, a document the engine rejects) are folded into the
//! per-file [`MergeReport`](crate::merge::MergeReport) and never abort a
//! merge. Everything else stops the operation and is returned to the caller.
//!
//! # Error Categories
//!
//! - **Session Errors**: operations invoked before the session is initialized
//! - **Source Errors**: read failures, unsupported file types
//! - **Engine Errors**: PDF parsing, image embedding, page copying
//! - **Output Errors**: the download sink could not deliver the result

use std::io;
use std::path::PathBuf;

/// Result type alias for pdfstitch operations.
pub type Result<T> = std::result::Result<T, StitchError>;

/// Main error type for pdfstitch operations.
#[derive(Debug, thiserror::Error)]
pub enum StitchError {
    /// An operation needing the output document ran before `initialize()`.
    #[error("Output document is not initialized")]
    NotInitialized,

    /// The file is neither JPEG, PNG nor PDF.
    #[error("Unsupported file type for {name}: {mime}")]
    UnsupportedFileType {
        /// Display name of the file.
        name: String,
        /// MIME type (or extension) that was not recognized.
        mime: String,
    },

    /// Reading the file contents failed.
    #[error("Failed to read {name}\n  Reason: {source}")]
    ReadFailure {
        /// Display name of the file.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The document engine rejected a parse, embed or copy call.
    #[error("Failed to process {name}\n  Reason: {reason}")]
    Engine {
        /// Display name of the file.
        name: String,
        /// Reason reported by the engine.
        reason: String,
    },

    /// No files were selected.
    #[error("No input files selected for merging")]
    NoFilesToMerge,

    /// A reorder referenced a position outside the file list.
    #[error("Cannot move file from position {from} to {to}: list has {len} file(s)")]
    InvalidReorder {
        /// Source position.
        from: usize,
        /// Destination position.
        to: usize,
        /// Length of the file list.
        len: usize,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// Output file already exists and overwrite is not allowed.
    #[error(
        "Output file already exists: {}\n  Use --force to overwrite or choose a different name",
        .path.display()
    )]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Failed to write the output file.
    #[error("Failed to write output file: {}\n  Reason: {source}", .path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The merge was cancelled before delivery.
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<lopdf::Error> for StitchError {
    fn from(err: lopdf::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl StitchError {
    /// Create a ReadFailure error.
    pub fn read_failure(name: impl Into<String>, source: io::Error) -> Self {
        Self::ReadFailure {
            name: name.into(),
            source,
        }
    }

    /// Create an Engine error.
    pub fn engine(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Engine {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an UnsupportedFileType error.
    pub fn unsupported(name: impl Into<String>, mime: impl Into<String>) -> Self {
        Self::UnsupportedFileType {
            name: name.into(),
            mime: mime.into(),
        }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: PathBuf) -> Self {
        Self::OutputExists { path }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this error only concerns a single source file.
    ///
    /// Recoverable errors exclude the offending file from the output while
    /// the remaining files are still merged.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFileType { .. } | Self::ReadFailure { .. } | Self::Engine { .. }
        )
    }

    /// Short reason for a file-local error, without the file name.
    pub fn reason(&self) -> String {
        match self {
            Self::UnsupportedFileType { mime, .. } if mime.is_empty() => {
                "unsupported file type".to_string()
            }
            Self::UnsupportedFileType { mime, .. } => format!("unsupported file type {mime}"),
            Self::ReadFailure { source, .. } => source.to_string(),
            Self::Engine { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotInitialized => 6,
            Self::UnsupportedFileType { .. } => 3,
            Self::ReadFailure { .. } => 2,
            Self::Engine { .. } => 3,
            Self::NoFilesToMerge => 1,
            Self::InvalidReorder { .. } => 1,
            Self::InvalidConfig { .. } => 1,
            Self::OutputExists { .. } => 4,
            Self::FailedToWrite { .. } => 5,
            Self::Cancelled => 130, // Standard exit code for SIGINT
            Self::Io { .. } => 5,
            Self::Other { .. } => 1,
        }
    }
}
