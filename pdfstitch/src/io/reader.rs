//! Source file reading.
//!
//! This module reads the contents of every selected file with:
//! - Concurrent reads bounded by a worker count
//! - Results indexed by file list position, whatever order reads finish in
//! - Magic-byte sniffing for files whose extension was not conclusive
//! - Aggregate read statistics
//!
//! # Examples
//!
//! ```no_run
//! use pdfstitch::io::reader::SourceReader;
//! use pdfstitch::source::SelectedFile;
//!
//! # async fn example() {
//! let reader = SourceReader::new();
//! let files = vec![
//!     SelectedFile::from_path("cover.jpg"),
//!     SelectedFile::from_path("report.pdf"),
//! ];
//! let (results, stats) = reader.read_all(&files, 4).await;
//! println!("Read {} of {} files", stats.success_count, results.len());
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::error::{Result, StitchError};
use crate::source::{FileOrigin, SelectedFile, SourceFile, SourceKind};

/// Result of reading one file.
pub type ReadResult = Result<SourceFile>;

/// Statistics for a batch read.
#[derive(Debug, Clone)]
pub struct ReadStatistics {
    /// Number of files successfully read.
    pub success_count: usize,

    /// Number of files that failed to read.
    pub failure_count: usize,

    /// Wall time for the whole batch.
    pub total_time: Duration,

    /// Total size of successfully read files.
    pub total_size: u64,
}

impl ReadStatistics {
    fn from_results(results: &[ReadResult], total_time: Duration) -> Self {
        let mut success_count = 0;
        let mut failure_count = 0;
        let mut total_size = 0;

        for result in results {
            match result {
                Ok(source) => {
                    success_count += 1;
                    total_size += source.len() as u64;
                }
                Err(_) => failure_count += 1,
            }
        }

        Self {
            success_count,
            failure_count,
            total_time,
            total_size,
        }
    }
}

/// Reader that turns file list entries into in-memory sources.
#[derive(Debug, Clone, Default)]
pub struct SourceReader;

impl SourceReader {
    /// Create a new reader.
    pub fn new() -> Self {
        Self
    }

    /// Read one selected file.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::ReadFailure`] if the file cannot be read.
    pub async fn read(&self, file: &SelectedFile) -> ReadResult {
        let bytes: Arc<[u8]> = match &file.origin {
            FileOrigin::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| StitchError::read_failure(&file.name, e))?
                .into(),
            FileOrigin::Memory(bytes) => bytes.clone(),
        };

        // A declared MIME type is final; only an inconclusive extension is sniffed.
        let kind = match (&file.kind, &file.origin) {
            (SourceKind::Unsupported(_), FileOrigin::Path(_)) => {
                SourceKind::sniff(&bytes).unwrap_or_else(|| file.kind.clone())
            }
            (kind, _) => kind.clone(),
        };

        debug!(name = %file.name, %kind, bytes = bytes.len(), "read source file");

        Ok(SourceFile {
            name: file.name.clone(),
            kind,
            bytes,
        })
    }

    /// Read every file concurrently with at most `workers` reads in flight.
    ///
    /// Returns once every read has settled. Results are in the same order
    /// as `files`, regardless of completion order.
    pub async fn read_parallel(&self, files: &[SelectedFile], workers: usize) -> Vec<ReadResult> {
        let workers = workers.max(1);

        let tasks = files.iter().enumerate().map(|(index, file)| async move {
            (index, self.read(file).await)
        });

        let mut settled: Vec<(usize, ReadResult)> = stream::iter(tasks)
            .buffer_unordered(workers)
            .collect()
            .await;

        settled.sort_by_key(|(index, _)| *index);
        settled.into_iter().map(|(_, result)| result).collect()
    }

    /// Read every file and return per-file results plus statistics.
    pub async fn read_all(
        &self,
        files: &[SelectedFile],
        max_workers: usize,
    ) -> (Vec<ReadResult>, ReadStatistics) {
        let start = Instant::now();
        let results = self.read_parallel(files, max_workers).await;
        let stats = ReadStatistics::from_results(&results, start.elapsed());
        (results, stats)
    }
}
