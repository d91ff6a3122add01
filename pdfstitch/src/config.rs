//! Configuration module for pdfstitch.
//!
//! This module holds the page layout a session renders images onto, the
//! serialization options applied to the output document, and the complete
//! [`Config`] the CLI derives from its arguments. It handles:
//! - Parsing of page sizes, orientations and compression levels
//! - Validation of argument combinations
//! - Application of defaults

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StitchError};

/// Points per millimetre.
const MM: f32 = 72.0 / 25.4;

/// Paper size for created pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageSize {
    /// ISO A4, 210 × 297 mm.
    #[default]
    A4,
    /// US Letter, 8.5 × 11 in.
    Letter,
    /// US Legal, 8.5 × 14 in.
    Legal,
    /// Every page takes the native size of its image or source page.
    FitToImage,
}

impl PageSize {
    /// Portrait dimensions (width, height) in points.
    ///
    /// Returns `None` for [`PageSize::FitToImage`], which has no fixed size.
    pub fn portrait_points(&self) -> Option<(f32, f32)> {
        match self {
            Self::A4 => Some((210.0 * MM, 297.0 * MM)),
            Self::Letter => Some((8.5 * 72.0, 11.0 * 72.0)),
            Self::Legal => Some((8.5 * 72.0, 14.0 * 72.0)),
            Self::FitToImage => None,
        }
    }
}

impl FromStr for PageSize {
    type Err = StitchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            "fit" | "fit-to-image" | "fittoimage" => Ok(Self::FitToImage),
            _ => Err(StitchError::invalid_config(format!(
                "Invalid page size: {s}. Must be one of: a4, letter, legal, fit"
            ))),
        }
    }
}

/// Page orientation for fixed-size pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    /// Height ≥ width.
    #[default]
    Portrait,
    /// Width ≥ height.
    Landscape,
}

impl FromStr for Orientation {
    type Err = StitchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "portrait" => Ok(Self::Portrait),
            "landscape" => Ok(Self::Landscape),
            _ => Err(StitchError::invalid_config(format!(
                "Invalid orientation: {s}. Must be portrait or landscape"
            ))),
        }
    }
}

/// Page size and orientation used when a page is created.
///
/// The layout is read at the moment each page is produced; changing it
/// only affects pages created afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PageLayout {
    /// Paper size.
    pub size: PageSize,
    /// Orientation, ignored for [`PageSize::FitToImage`].
    pub orientation: Orientation,
}

impl PageLayout {
    /// Create a layout from a size and orientation.
    pub fn new(size: PageSize, orientation: Orientation) -> Self {
        Self { size, orientation }
    }

    /// Layout that keeps every page at its native size.
    pub fn fit_to_image() -> Self {
        Self::new(PageSize::FitToImage, Orientation::Portrait)
    }

    /// Whether pages keep their native size.
    pub fn is_fit_to_image(&self) -> bool {
        self.size == PageSize::FitToImage
    }

    /// Oriented page dimensions (width, height) in points.
    ///
    /// Returns `None` in fit-to-image mode.
    pub fn dimensions(&self) -> Option<(f32, f32)> {
        let (w, h) = self.size.portrait_points()?;
        match self.orientation {
            Orientation::Portrait => Some((w.min(h), w.max(h))),
            Orientation::Landscape => Some((w.max(h), w.min(h))),
        }
    }
}

/// Compression level for the output PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionLevel {
    /// No compression - streams are written as produced.
    None,
    /// Compress content streams.
    #[default]
    Standard,
    /// Compress streams and prune unreachable objects.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = StitchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(StitchError::invalid_config(format!(
                "Invalid compression level: {s}. Must be one of: none, standard, maximum"
            ))),
        }
    }
}

/// PDF metadata to set on the output document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title. Defaults to the output file name when unset.
    pub title: Option<String>,
    /// Document author.
    pub author: Option<String>,
    /// Document subject.
    pub subject: Option<String>,
    /// Document keywords (comma-separated).
    pub keywords: Option<String>,
}

impl Metadata {
    /// Check if any metadata fields are set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
    }

    /// Create metadata from optional strings, trimming whitespace.
    pub fn new(
        title: Option<String>,
        author: Option<String>,
        subject: Option<String>,
        keywords: Option<String>,
    ) -> Self {
        let to_string_opt = |opt: Option<String>| {
            opt.filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
        };

        Self {
            title: to_string_opt(title),
            author: to_string_opt(author),
            subject: to_string_opt(subject),
            keywords: to_string_opt(keywords),
        }
    }
}

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Prompt the user before overwriting (default).
    #[default]
    Prompt,
    /// Always overwrite without prompting.
    Force,
    /// Never overwrite, error if file exists.
    NoClobber,
}

/// A single reorder step, `FROM:TO` with 0-based positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    /// Position the file is taken from.
    pub from: usize,
    /// Position the file is dropped at.
    pub to: usize,
}

impl FromStr for Move {
    type Err = StitchError;

    fn from_str(s: &str) -> Result<Self> {
        let (from, to) = s.split_once(':').ok_or_else(|| {
            StitchError::invalid_config(format!("Invalid move: {s}. Expected FROM:TO"))
        })?;

        let parse = |part: &str| {
            part.trim().parse::<usize>().map_err(|_| {
                StitchError::invalid_config(format!("Invalid position in move {s}: {part}"))
            })
        };

        Ok(Self {
            from: parse(from)?,
            to: parse(to)?,
        })
    }
}

/// Options a merge session reads while composing and serializing.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Page layout for created pages.
    pub layout: PageLayout,
    /// Compression applied on save.
    pub compression: CompressionLevel,
    /// Metadata stamped on save.
    pub metadata: Metadata,
    /// Maximum number of concurrent file reads (None = auto-detect).
    pub jobs: Option<usize>,
}

impl SessionOptions {
    /// Get the effective number of concurrent reads.
    pub fn effective_jobs(&self) -> usize {
        effective_jobs(self.jobs)
    }
}

/// Complete configuration for a stitch run.
///
/// This structure contains all settings needed to perform a run,
/// derived and validated from CLI arguments.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Input files (in selection order).
    pub inputs: Vec<PathBuf>,

    /// Directory the merged PDF is written into.
    pub out_dir: PathBuf,

    /// Output file name without extension. Derived from the first input when unset.
    pub name: Option<String>,

    /// Reorder steps applied to the selection, in order.
    pub moves: Vec<Move>,

    /// Page layout for created pages.
    pub layout: PageLayout,

    /// Compression level for output.
    pub compression: CompressionLevel,

    /// Metadata to set on output document.
    pub metadata: Metadata,

    /// Number of concurrent reads (None = auto-detect).
    pub jobs: Option<usize>,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,

    /// Dry run mode - inspect and report without writing output.
    pub dry_run: bool,

    /// Print the merge report as JSON.
    pub json: bool,

    /// Verbose output mode.
    pub verbose: bool,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No input files are specified
    /// - Verbose and quiet modes are both enabled
    /// - Jobs count is zero
    /// - An explicit output name is blank
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(StitchError::NoFilesToMerge);
        }

        if self.verbose && self.quiet {
            return Err(StitchError::invalid_config(
                "Cannot use both --verbose and --quiet",
            ));
        }

        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            return Err(StitchError::invalid_config(
                "Number of jobs must be at least 1",
            ));
        }

        if let Some(ref name) = self.name
            && name.trim().is_empty()
        {
            return Err(StitchError::invalid_config("Output name cannot be empty"));
        }

        Ok(())
    }

    /// Options handed to the merge session.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            layout: self.layout,
            compression: self.compression,
            metadata: self.metadata.clone(),
            jobs: self.jobs,
        }
    }

    /// Get the effective number of concurrent reads.
    pub fn effective_jobs(&self) -> usize {
        effective_jobs(self.jobs)
    }
}

/// Returns the configured job count, or the number of CPU cores.
fn effective_jobs(jobs: Option<usize>) -> usize {
    jobs.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    })
    .max(1)
}
