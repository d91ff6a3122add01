//! Delivery of the finished PDF.
//!
//! A [`DownloadSink`] receives the serialized document together with its
//! file name and MIME type. Two sinks are provided:
//! - [`DirectorySink`] writes the file into a directory on a blocking
//!   thread, atomically (uniquely named temp file, then rename) and
//!   honoring an [`OverwriteMode`]
//! - [`MemorySink`] keeps every delivery in memory
//!
//! # Examples
//!
//! ```no_run
//! use pdfstitch::io::sink::{DirectorySink, DownloadSink};
//!
//! # async fn example(bytes: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut sink = DirectorySink::new("out");
//! sink.download(bytes, "merged.pdf", "application/pdf").await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tokio::task;
use tracing::debug;

use crate::config::OverwriteMode;
use crate::error::{Result, StitchError};

/// MIME type of every document the orchestrator delivers.
pub const PDF_MIME: &str = "application/pdf";

/// Receiver of a finished document.
pub trait DownloadSink {
    /// Deliver `bytes` under `file_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot store the document.
    fn download(
        &mut self,
        bytes: Vec<u8>,
        file_name: &str,
        mime: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// A document recorded by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// File name the document was delivered under.
    pub file_name: String,
    /// MIME type.
    pub mime: String,
    /// Serialized document.
    pub bytes: Vec<u8>,
}

/// Sink that keeps deliveries in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    downloads: Vec<Download>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every delivery so far, oldest first.
    pub fn downloads(&self) -> &[Download] {
        &self.downloads
    }

    /// The most recent delivery.
    pub fn last(&self) -> Option<&Download> {
        self.downloads.last()
    }
}

impl DownloadSink for MemorySink {
    async fn download(&mut self, bytes: Vec<u8>, file_name: &str, mime: &str) -> Result<()> {
        self.downloads.push(Download {
            file_name: file_name.to_string(),
            mime: mime.to_string(),
            bytes,
        });
        Ok(())
    }
}

/// Sink that writes documents into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    overwrite: OverwriteMode,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    /// Create a sink writing into `dir`, refusing to overwrite.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            overwrite: OverwriteMode::NoClobber,
            written: Vec::new(),
        }
    }

    /// Set the overwrite behavior.
    ///
    /// [`OverwriteMode::Prompt`] is treated as no-clobber here; prompting is
    /// the caller's job and happens before delivery.
    pub fn with_overwrite(mut self, overwrite: OverwriteMode) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Path a document named `file_name` would be written to.
    pub fn target(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Paths written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Check that the directory exists and is writable.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is missing or read-only.
    pub fn can_write(&self) -> Result<()> {
        let metadata = std::fs::metadata(&self.dir).map_err(|_| {
            StitchError::invalid_config(format!(
                "Output directory does not exist: {}",
                self.dir.display()
            ))
        })?;

        if !metadata.is_dir() {
            return Err(StitchError::invalid_config(format!(
                "Output path is not a directory: {}",
                self.dir.display()
            )));
        }

        if metadata.permissions().readonly() {
            return Err(StitchError::invalid_config(format!(
                "Output directory is not writable: {}",
                self.dir.display()
            )));
        }

        Ok(())
    }
}

impl DownloadSink for DirectorySink {
    async fn download(&mut self, bytes: Vec<u8>, file_name: &str, _mime: &str) -> Result<()> {
        let path = self.target(file_name);
        let dir = self.dir.clone();
        let overwrite = self.overwrite;
        let target = path.clone();
        let len = bytes.len();

        task::spawn_blocking(move || write_file(&dir, &target, &bytes, overwrite))
            .await
            .map_err(|e| StitchError::other(format!("Write task failed: {e}")))??;
        debug!(path = %path.display(), bytes = len, "wrote output file");

        self.written.push(path);
        Ok(())
    }
}

/// Write `bytes` to a temp file in `dir` and move it onto `path`.
///
/// The temp file is removed if any step fails.
fn write_file(dir: &Path, path: &Path, bytes: &[u8], overwrite: OverwriteMode) -> Result<()> {
    if overwrite != OverwriteMode::Force && path.exists() {
        return Err(StitchError::output_exists(path.to_path_buf()));
    }

    let failed = |source: io::Error| StitchError::FailedToWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut temp = NamedTempFile::new_in(dir).map_err(failed)?;
    temp.write_all(bytes)
        .and_then(|_| temp.flush())
        .map_err(failed)?;

    let persisted = match overwrite {
        OverwriteMode::Force => temp.persist(path),
        OverwriteMode::NoClobber | OverwriteMode::Prompt => temp.persist_noclobber(path),
    };

    match persisted {
        Ok(_) => Ok(()),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
            Err(StitchError::output_exists(path.to_path_buf()))
        }
        Err(e) => Err(failed(e.error)),
    }
}
