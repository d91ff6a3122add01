//! pdfstitch - Stitch JPEG, PNG and PDF files into a single PDF document.
//!
//! This library merges an ordered list of images and PDF documents into one
//! PDF. It supports:
//!
//! - One page per image, scaled to fit and centered on A4, Letter or Legal
//!   paper, or sized to the image itself
//! - Every page of every PDF, refitted to the chosen paper size
//! - Concurrent reading and decoding with a deterministic page order
//! - A per-file report of what was merged, skipped or failed
//! - Delivery to a directory or to memory
//!
//! # Examples
//!
//! ## One-shot merge
//!
//! ```no_run
//! use pdfstitch::config::SessionOptions;
//! use pdfstitch::io::DirectorySink;
//! use pdfstitch::merge::{self, CancelToken};
//! use pdfstitch::source::SelectedFile;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let files = vec![
//!     SelectedFile::from_path("cover.png"),
//!     SelectedFile::from_path("report.pdf"),
//! ];
//! let mut sink = DirectorySink::new("out");
//!
//! let report = merge::stitch(
//!     files,
//!     None,
//!     SessionOptions::default(),
//!     &mut sink,
//!     &CancelToken::new(),
//! )
//! .await?;
//! println!("Created {} page document", report.total_pages);
//! # Ok(())
//! # }
//! ```
//!
//! ## Driving a session
//!
//! ```no_run
//! use pdfstitch::config::{Orientation, PageLayout, PageSize};
//! use pdfstitch::io::MemorySink;
//! use pdfstitch::merge::{CancelToken, MergeSession};
//! use pdfstitch::source::SelectedFile;
//!
//! # async fn example(jpeg: Vec<u8>, pdf: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = MergeSession::default();
//! session.initialize();
//! session.set_file_list(vec![
//!     SelectedFile::from_bytes("scan.jpg", "image/jpeg", jpeg),
//!     SelectedFile::from_bytes("notes.pdf", "application/pdf", pdf),
//! ]);
//! session.reorder(1, Some(0))?;
//! session.set_layout(PageLayout::new(PageSize::Letter, Orientation::Landscape));
//!
//! let mut sink = MemorySink::new();
//! session.merge_and_download(&mut sink, &CancelToken::new()).await?;
//! assert_eq!(sink.last().unwrap().file_name, "scan.pdf");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod merge;
pub mod source;

// Re-export commonly used types
pub use config::{Config, PageLayout, SessionOptions};
pub use error::{Result, StitchError};
pub use merge::{CancelToken, MergeReport, MergeSession};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
