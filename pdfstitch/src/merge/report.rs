//! Per-file outcomes and merge statistics.

use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::source::SourceKind;

/// What happened to one file of the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// The file contributed `pages` pages.
    Merged {
        /// Number of pages contributed.
        pages: usize,
    },
    /// The file was left out because its type is not supported.
    Skipped {
        /// Why the file was skipped.
        reason: String,
    },
    /// Reading or processing the file failed.
    Failed {
        /// Why the file failed.
        reason: String,
    },
}

impl FileStatus {
    /// Pages contributed by the file.
    pub fn pages(&self) -> usize {
        match self {
            Self::Merged { pages } => *pages,
            Self::Skipped { .. } | Self::Failed { .. } => 0,
        }
    }

    /// Whether the file made it into the output.
    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged { .. })
    }

    /// Why the file was left out, if it was.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Merged { .. } => None,
            Self::Skipped { reason } | Self::Failed { reason } => Some(reason),
        }
    }
}

/// Outcome for one file, in file list order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    /// Position in the file list.
    pub index: usize,
    /// Display name.
    pub name: String,
    /// Detected kind.
    pub kind: SourceKind,
    /// What happened.
    #[serde(flatten)]
    pub status: FileStatus,
}

/// Summary of one merge.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    /// One outcome per file, in file list order.
    pub outcomes: Vec<FileOutcome>,

    /// Pages in the delivered document.
    pub total_pages: usize,

    /// Name the document was delivered under.
    pub file_name: Option<String>,

    /// Size of the delivered document.
    pub byte_len: usize,

    /// Total size of the files that were read.
    pub input_size: u64,

    /// Whether a document was handed to the sink.
    pub downloaded: bool,

    /// Time spent reading files.
    #[serde(serialize_with = "as_millis")]
    pub read_time: Duration,

    /// Time spent preparing and inserting pages.
    #[serde(serialize_with = "as_millis")]
    pub compose_time: Duration,

    /// Time spent serializing the document.
    #[serde(serialize_with = "as_millis")]
    pub save_time: Duration,
}

impl MergeReport {
    /// Files that made it into the output.
    pub fn merged(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_merged())
    }

    /// Files that were left out, skipped or failed.
    pub fn excluded(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.status.is_merged())
    }

    /// Number of files that made it into the output.
    pub fn merged_count(&self) -> usize {
        self.merged().count()
    }

    /// Whether any file was left out.
    pub fn has_exclusions(&self) -> bool {
        self.excluded().next().is_some()
    }

    /// Total time of the merge.
    pub fn total_time(&self) -> Duration {
        self.read_time + self.compose_time + self.save_time
    }

    /// Format the input size as a human-readable string.
    pub fn format_input_size(&self) -> String {
        format_file_size(self.input_size)
    }

    /// Format the output size as a human-readable string.
    pub fn format_output_size(&self) -> String {
        format_file_size(self.byte_len as u64)
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Format a byte count as a human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
