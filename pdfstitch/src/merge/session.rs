//! The merge session.
//!
//! A [`MergeSession`] owns the file list, the page layout, the output name
//! and the [`OutputDocument`] being assembled. A merge runs in three phases
//! separated by join barriers:
//!
//! 1. **Read**: every file is read concurrently; the phase ends once all
//!    reads have settled.
//! 2. **Compose**: files are decoded or parsed on blocking threads; each
//!    result is inserted into the document as soon as it is ready, at the
//!    slot its list position resolves to. The phase ends once every file is
//!    either inserted or excluded.
//! 3. **Deliver**: the document is serialized and handed to a
//!    [`DownloadSink`], after which the session resets.
//!
//! Files that cannot be read, have an unsupported type or are rejected by
//! the engine are excluded and listed in the [`MergeReport`]; the other
//! files are merged regardless.
//!
//! # Examples
//!
//! ```no_run
//! use pdfstitch::io::MemorySink;
//! use pdfstitch::merge::{CancelToken, MergeSession};
//! use pdfstitch::source::SelectedFile;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = MergeSession::default();
//! session.initialize();
//! session.set_file_list(vec![
//!     SelectedFile::from_path("report.pdf"),
//!     SelectedFile::from_path("photo.jpg"),
//! ]);
//!
//! let mut sink = MemorySink::new();
//! let report = session
//!     .merge_and_download(&mut sink, &CancelToken::new())
//!     .await?;
//! println!("{} pages in {:?}", report.total_pages, report.file_name);
//! # Ok(())
//! # }
//! ```

use std::time::Instant;

use futures::stream::{self, StreamExt};
use lopdf::Document;
use tracing::{debug, info, warn};

use super::cancel::CancelToken;
use super::report::{FileOutcome, FileStatus, MergeReport};
use crate::config::{PageLayout, SessionOptions};
use crate::engine::{OutputDocument, PreparedImage};
use crate::error::{Result, StitchError};
use crate::io::{DownloadSink, PDF_MIME, SourceReader};
use crate::source::{SelectedFile, SourceFile, SourceKind};

/// Output name used when none can be derived from the file list.
pub const DEFAULT_OUTPUT_NAME: &str = "merged";

/// A source decoded or parsed and ready to be inserted.
#[derive(Debug)]
pub enum PreparedSource {
    /// A JPEG or PNG image, one page.
    Image(PreparedImage),
    /// A parsed PDF, all of its pages.
    Pdf(Document),
}

impl PreparedSource {
    /// Decode or parse a source file.
    ///
    /// This is CPU-bound work independent of any output document.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::UnsupportedFileType`] for unsupported kinds
    /// and [`StitchError::Engine`] if the engine rejects the bytes.
    pub fn prepare(source: &SourceFile) -> Result<Self> {
        let prepared = match &source.kind {
            SourceKind::Jpeg => PreparedImage::prepare_jpeg(&source.bytes).map(Self::Image),
            SourceKind::Png => PreparedImage::prepare_png(&source.bytes).map(Self::Image),
            SourceKind::Pdf => OutputDocument::load_source(&source.bytes).map(Self::Pdf),
            SourceKind::Unsupported(mime) => {
                return Err(StitchError::unsupported(&source.name, mime));
            }
        };

        prepared.map_err(|e| StitchError::engine(&source.name, e))
    }
}

/// Derive an output name from a file name: the base name without its last
/// extension, or [`DEFAULT_OUTPUT_NAME`] if that is empty.
pub fn derive_output_name(file_name: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => file_name,
    };
    let stem = stem.trim();

    if stem.is_empty() {
        DEFAULT_OUTPUT_NAME.to_string()
    } else {
        stem.to_string()
    }
}

/// Merge session state and operations.
#[derive(Debug)]
pub struct MergeSession {
    document: Option<OutputDocument>,
    files: Vec<SelectedFile>,
    output_name: String,
    options: SessionOptions,
    reader: SourceReader,
}

impl Default for MergeSession {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl MergeSession {
    /// Create an uninitialized session.
    ///
    /// Call [`initialize`](Self::initialize) before adding sources or merging.
    pub fn new(options: SessionOptions) -> Self {
        Self {
            document: None,
            files: Vec::new(),
            output_name: DEFAULT_OUTPUT_NAME.to_string(),
            options,
            reader: SourceReader::new(),
        }
    }

    /// Create a fresh, empty output document, discarding any previous one.
    pub fn initialize(&mut self) {
        self.document = Some(OutputDocument::new());
        debug!("initialized output document");
    }

    /// Whether an output document exists.
    pub fn is_initialized(&self) -> bool {
        self.document.is_some()
    }

    /// The output document being assembled, if initialized.
    pub fn document(&self) -> Option<&OutputDocument> {
        self.document.as_ref()
    }

    /// Replace the file list.
    ///
    /// The output name is derived from the first file when the list is not
    /// empty. No file is read here.
    pub fn set_file_list(&mut self, files: Vec<SelectedFile>) {
        if let Some(first) = files.first() {
            self.output_name = derive_output_name(&first.name);
        }
        self.files = files;
        debug!(files = self.files.len(), name = %self.output_name, "set file list");
    }

    /// Append a file to the list.
    ///
    /// Appending to an empty list derives the output name from the file.
    pub fn push_file(&mut self, file: SelectedFile) {
        if self.files.is_empty() {
            self.output_name = derive_output_name(&file.name);
        }
        self.files.push(file);
    }

    /// Remove the file at `index`, if there is one.
    pub fn remove_file(&mut self, index: usize) -> Option<SelectedFile> {
        (index < self.files.len()).then(|| self.files.remove(index))
    }

    /// Move the file at `from` so that it ends up at `to`.
    ///
    /// A missing drop target (`None`) leaves the list as it is.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::InvalidReorder`] if either position is outside
    /// the list; the list is left unchanged.
    pub fn reorder(&mut self, from: usize, to: Option<usize>) -> Result<()> {
        let Some(to) = to else {
            return Ok(());
        };

        let len = self.files.len();
        if from >= len || to >= len {
            return Err(StitchError::InvalidReorder { from, to, len });
        }

        let file = self.files.remove(from);
        self.files.insert(to, file);
        Ok(())
    }

    /// The current file list.
    pub fn files(&self) -> &[SelectedFile] {
        &self.files
    }

    /// The current page layout.
    pub fn layout(&self) -> PageLayout {
        self.options.layout
    }

    /// Change the page layout. Applies to pages created from now on.
    pub fn set_layout(&mut self, layout: PageLayout) {
        self.options.layout = layout;
    }

    /// Output name, without the `.pdf` extension.
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Override the output name. A blank name falls back to the default.
    pub fn set_output_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        let name = name.trim();
        self.output_name = if name.is_empty() {
            DEFAULT_OUTPUT_NAME.to_string()
        } else {
            name.to_string()
        };
    }

    /// File name the merged document is delivered under.
    pub fn output_file_name(&self) -> String {
        format!("{}.pdf", self.output_name)
    }

    /// Session options.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Mutable session options.
    pub fn options_mut(&mut self) -> &mut SessionOptions {
        &mut self.options
    }

    /// Insert one already-read source at list position `position`.
    ///
    /// Returns how the source ended up: merged with its page count, or
    /// skipped when its type is unsupported.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::NotInitialized`] before
    /// [`initialize`](Self::initialize), leaving everything untouched, and
    /// [`StitchError::Engine`] if the source cannot be decoded or parsed.
    pub fn add_source(&mut self, position: usize, source: &SourceFile) -> Result<FileStatus> {
        let layout = self.options.layout;
        let Some(document) = self.document.as_mut() else {
            warn!(name = %source.name, "cannot add source: output document is not initialized");
            return Err(StitchError::NotInitialized);
        };

        match PreparedSource::prepare(source) {
            Ok(prepared) => insert_prepared(document, position, &source.name, prepared, &layout),
            Err(e @ StitchError::UnsupportedFileType { .. }) => {
                document.release(position);
                Ok(FileStatus::Skipped { reason: e.reason() })
            }
            Err(e) => {
                document.release(position);
                Err(e)
            }
        }
    }

    /// Merge every file of the list and deliver the result to `sink` as
    /// `<output name>.pdf`.
    ///
    /// An empty list is a no-op. On success the file list is cleared and a
    /// fresh document is created. On error the file list is kept and the
    /// document is replaced by a fresh one.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::NotInitialized`] if the session has no output
    /// document, [`StitchError::Cancelled`] if `cancel` fires, or the
    /// error of a failed serialization or delivery. Errors of individual
    /// files are reported in the [`MergeReport`] instead.
    pub async fn merge_and_download<S>(
        &mut self,
        sink: &mut S,
        cancel: &CancelToken,
    ) -> Result<MergeReport>
    where
        S: DownloadSink,
    {
        if self.files.is_empty() {
            debug!("file list is empty, nothing to merge");
            return Ok(MergeReport::default());
        }

        let Some(mut document) = self.document.take() else {
            warn!("cannot merge: output document is not initialized");
            return Err(StitchError::NotInitialized);
        };

        let result = self.run(&mut document, sink, cancel).await;

        match &result {
            Ok(report) if report.downloaded => {
                self.files.clear();
                info!(
                    file = report.file_name.as_deref().unwrap_or_default(),
                    pages = report.total_pages,
                    bytes = report.byte_len,
                    "merge delivered"
                );
            }
            Ok(_) => warn!("no file could be merged, nothing delivered"),
            Err(e) => warn!(error = %e, "merge aborted"),
        }

        self.initialize();
        result
    }

    async fn run<S>(
        &self,
        document: &mut OutputDocument,
        sink: &mut S,
        cancel: &CancelToken,
    ) -> Result<MergeReport>
    where
        S: DownloadSink,
    {
        let mut report = MergeReport::default();
        let jobs = self.options.effective_jobs();

        cancel.check()?;
        let (read_results, read_stats) = self.reader.read_all(&self.files, jobs).await;
        report.read_time = read_stats.total_time;
        report.input_size = read_stats.total_size;
        debug!(
            read = read_stats.success_count,
            failed = read_stats.failure_count,
            elapsed = ?read_stats.total_time,
            "read phase settled"
        );

        cancel.check()?;
        let compose_start = Instant::now();
        let outcomes = self.compose(document, read_results, jobs, cancel).await?;
        report.compose_time = compose_start.elapsed();
        report.total_pages = outcomes.iter().map(|o| o.status.pages()).sum();
        report.outcomes = outcomes;

        if report.total_pages == 0 {
            return Ok(report);
        }

        cancel.check()?;
        let save_start = Instant::now();
        let output = std::mem::take(document);
        let compression = self.options.compression;
        let metadata = self.options.metadata.clone();
        let title = self.output_name.clone();
        let bytes =
            tokio::task::spawn_blocking(move || output.save(compression, &metadata, &title))
                .await
                .map_err(|e| StitchError::other(format!("Serialization task failed: {e}")))??;
        report.save_time = save_start.elapsed();

        cancel.check()?;
        let file_name = self.output_file_name();
        report.byte_len = bytes.len();
        sink.download(bytes, &file_name, PDF_MIME).await?;
        report.file_name = Some(file_name);
        report.downloaded = true;

        Ok(report)
    }

    /// Prepare every readable source on blocking threads and insert each
    /// one as soon as it is ready. Returns outcomes in list order.
    async fn compose(
        &self,
        document: &mut OutputDocument,
        read_results: Vec<Result<SourceFile>>,
        jobs: usize,
        cancel: &CancelToken,
    ) -> Result<Vec<FileOutcome>> {
        let mut statuses: Vec<Option<FileStatus>> = vec![None; self.files.len()];
        let mut kinds: Vec<SourceKind> = self.files.iter().map(|f| f.kind.clone()).collect();
        let mut pending = Vec::new();

        for (index, result) in read_results.into_iter().enumerate() {
            if let Ok(source) = &result {
                kinds[index] = source.kind.clone();
            }
            match result {
                Ok(source) if source.kind.is_supported() => pending.push((index, source)),
                Ok(source) => {
                    let reason =
                        StitchError::unsupported(&source.name, source.kind.mime()).reason();
                    warn!(name = %source.name, kind = %source.kind, "skipping unsupported file");
                    statuses[index] = Some(FileStatus::Skipped { reason });
                }
                Err(e) => {
                    warn!(name = %self.files[index].name, error = %e, "failed to read file");
                    statuses[index] = Some(FileStatus::Failed { reason: e.reason() });
                }
            }
        }

        let mut prepared = stream::iter(pending)
            .map(|(index, source)| async move {
                let name = source.name.clone();
                let result = tokio::task::spawn_blocking(move || PreparedSource::prepare(&source))
                    .await
                    .unwrap_or_else(|e| Err(StitchError::engine(&name, e)));
                (index, name, result)
            })
            .buffer_unordered(jobs.max(1));

        let layout = self.options.layout;
        while let Some((index, name, result)) = prepared.next().await {
            cancel.check()?;

            let status = result.and_then(|source| {
                insert_prepared(document, index, &name, source, &layout)
            });
            statuses[index] = Some(match status {
                Ok(status) => status,
                Err(e) => {
                    warn!(%name, error = %e.reason(), "failed to merge file");
                    document.release(index);
                    FileStatus::Failed { reason: e.reason() }
                }
            });
        }

        Ok(self
            .files
            .iter()
            .zip(kinds.into_iter().zip(statuses))
            .enumerate()
            .map(|(index, (file, (kind, status)))| FileOutcome {
                index,
                name: file.name.clone(),
                kind,
                status: status.unwrap_or(FileStatus::Failed {
                    reason: "not processed".to_string(),
                }),
            })
            .collect())
    }
}

/// Resolve the slot for `position` and insert a prepared source there.
fn insert_prepared(
    document: &mut OutputDocument,
    position: usize,
    name: &str,
    prepared: PreparedSource,
    layout: &PageLayout,
) -> Result<FileStatus> {
    let pages = match prepared {
        PreparedSource::Image(image) => {
            document
                .add_image(position, image, layout)
                .map_err(|e| StitchError::engine(name, e))?;
            1
        }
        PreparedSource::Pdf(source) => document
            .copy_pages(position, source, layout.dimensions())
            .map_err(|e| StitchError::engine(name, e))?
            .len(),
    };

    debug!(name, position, pages, "inserted source");
    Ok(FileStatus::Merged { pages })
}
