//! CLI argument parsing for pdfstitch.
//!
//! This module defines the command-line interface structure using `clap`.
//! It handles argument parsing, validation, and help text generation.
//! It is also compiled by the build script to render the man page, so it
//! only depends on `clap` and the library crate.

use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

use pdfstitch::config::{
    CompressionLevel, Config, Metadata, Move, Orientation, OverwriteMode, PageLayout, PageSize,
};
use pdfstitch::error::{Result, StitchError};

/// Stitch JPEG, PNG and PDF files into a single PDF document.
///
/// Images are placed one per page, centered and scaled to fit; PDF pages
/// are copied in order. Files that cannot be used are reported and left
/// out while the rest are merged.
#[derive(Parser, Debug)]
#[command(name = "pdfstitch")]
#[command(version)]
#[command(about = "Stitch JPEG, PNG and PDF files into a single PDF document", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Input files to merge (in order)
    ///
    /// JPEG, PNG and PDF files are accepted. Glob patterns are expanded,
    /// matches of one pattern in alphabetical order.
    ///
    /// Examples:
    ///   pdfstitch cover.jpg report.pdf
    ///   pdfstitch 'scans/*.png' -n scans
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Directory the merged PDF is written into
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Output file name, without the .pdf extension
    ///
    /// Defaults to the name of the first input without its extension.
    #[arg(short, long, value_name = "NAME")]
    pub name: Option<String>,

    /// Page size for created pages
    ///
    /// - a4, letter, legal: images are centered and scaled to fit,
    ///   PDF pages are scaled onto the page
    /// - fit: every page keeps the size of its image or source page
    #[arg(short = 's', long, value_name = "SIZE", default_value = "a4")]
    #[arg(value_parser = ["a4", "letter", "legal", "fit"])]
    pub page_size: String,

    /// Page orientation for fixed page sizes
    #[arg(long, value_name = "ORIENTATION", default_value = "portrait")]
    #[arg(value_parser = ["portrait", "landscape"])]
    pub orientation: String,

    /// Move a file within the list before merging (0-based FROM:TO)
    ///
    /// May be repeated; moves apply in the order given.
    ///
    /// Example:
    ///   --move 2:0   # put the third file first
    #[arg(long = "move", value_name = "FROM:TO")]
    pub moves: Vec<String>,

    /// Compression level for output PDF
    ///
    /// - none: No compression
    /// - standard: Compress content streams (default)
    /// - maximum: Also drop unreachable objects
    #[arg(short, long, value_name = "LEVEL", default_value = "standard")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: String,

    /// Set title metadata for output PDF
    ///
    /// Defaults to the output name.
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Set author metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub author: Option<String>,

    /// Set subject metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub subject: Option<String>,

    /// Set keywords metadata for output PDF (comma-separated)
    #[arg(long, value_name = "TEXT")]
    pub keywords: Option<String>,

    /// Number of files read and prepared concurrently
    ///
    /// Default is number of CPU cores. Use 1 for sequential processing.
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Force overwrite of existing output file without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite existing output file
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Merge in memory and report, without writing the output
    #[arg(long)]
    pub dry_run: bool,

    /// Print the merge report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Verbose output - show statistics and debug logs
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Convert CLI arguments into a validated Config.
    ///
    /// # Errors
    ///
    /// Returns an error if a page size, orientation, compression level or
    /// move cannot be parsed, or if the resulting configuration is invalid.
    pub fn to_config(&self) -> Result<Config> {
        let compression = CompressionLevel::from_str(&self.compression)?;
        let layout = PageLayout::new(
            PageSize::from_str(&self.page_size)?,
            Orientation::from_str(&self.orientation)?,
        );

        let moves = self
            .moves
            .iter()
            .map(|m| Move::from_str(m))
            .collect::<Result<Vec<_>>>()?;

        let overwrite_mode = if self.force {
            OverwriteMode::Force
        } else if self.no_clobber {
            OverwriteMode::NoClobber
        } else {
            OverwriteMode::Prompt
        };

        let metadata = Metadata::new(
            self.title.clone(),
            self.author.clone(),
            self.subject.clone(),
            self.keywords.clone(),
        );

        let config = Config {
            inputs: self.inputs.clone(),
            out_dir: self.out_dir.clone(),
            name: self.name.clone(),
            moves,
            layout,
            compression,
            metadata,
            jobs: self.jobs,
            overwrite_mode,
            dry_run: self.dry_run,
            json: self.json,
            verbose: self.verbose,
            quiet: self.quiet,
        };

        config.validate().map_err(|e| match e {
            StitchError::NoFilesToMerge => e,
            e => StitchError::invalid_config(format!("Configuration validation failed: {e}")),
        })?;

        Ok(config)
    }

    /// Validate CLI arguments before processing.
    ///
    /// # Errors
    ///
    /// Returns an error if no inputs are given, the job count is zero or
    /// the output name is blank or contains a path separator.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(StitchError::NoFilesToMerge);
        }

        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            return Err(StitchError::invalid_config(
                "Number of jobs must be at least 1",
            ));
        }

        if let Some(ref name) = self.name
            && (name.trim().is_empty() || name.contains(['/', '\\']))
        {
            return Err(StitchError::invalid_config(format!(
                "Invalid output name: {name:?}"
            )));
        }

        Ok(())
    }
}
