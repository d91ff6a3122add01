//! Merge orchestration.
//!
//! The [`MergeSession`] drives a merge from file list to delivered PDF;
//! [`stitch`] is a one-shot shortcut over it.

pub mod cancel;
pub mod report;
pub mod session;

pub use cancel::CancelToken;
pub use report::{FileOutcome, FileStatus, MergeReport};
pub use session::{DEFAULT_OUTPUT_NAME, MergeSession, PreparedSource, derive_output_name};

use crate::config::SessionOptions;
use crate::error::Result;
use crate::io::DownloadSink;
use crate::source::SelectedFile;

/// Merge `files` in order and deliver the result to `sink`.
///
/// The output is named after the first file unless `name` is given.
///
/// # Errors
///
/// See [`MergeSession::merge_and_download`].
pub async fn stitch<S>(
    files: Vec<SelectedFile>,
    name: Option<&str>,
    options: SessionOptions,
    sink: &mut S,
    cancel: &CancelToken,
) -> Result<MergeReport>
where
    S: DownloadSink,
{
    let mut session = MergeSession::new(options);
    session.initialize();
    session.set_file_list(files);
    if let Some(name) = name {
        session.set_output_name(name);
    }

    session.merge_and_download(sink, cancel).await
}
