//! Reading sources and delivering the merged document.

pub mod reader;
pub mod sink;

pub use reader::{ReadResult, ReadStatistics, SourceReader};
pub use sink::{DirectorySink, Download, DownloadSink, MemorySink, PDF_MIME};
