//! Message formatting and display.
//!
//! This module provides formatted output for different message types
//! with support for quiet and verbose modes, plus the rendering of a
//! [`MergeReport`].

use pdfstitch::config::Config;
use pdfstitch::merge::{FileStatus, MergeReport};
use std::io;

/// Level of output message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    /// Informational message.
    Info,
    /// Success message.
    Success,
    /// Warning message.
    Warning,
    /// Error message.
    Error,
}

/// Output formatter with configurable verbosity.
pub struct OutputFormatter {
    /// Whether to suppress non-error output.
    quiet: bool,
    /// Whether to show verbose output.
    verbose: bool,
    /// Whether to use colored output.
    colored: bool,
}

impl OutputFormatter {
    /// Create a new output formatter.
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self {
            quiet,
            verbose,
            colored: Self::should_use_color(),
        }
    }

    /// Create a formatter from configuration.
    ///
    /// JSON output keeps stdout machine-readable, so it implies quiet.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.quiet || config.json, config.verbose)
    }

    /// Create a quiet formatter (only warnings and errors).
    #[cfg(test)]
    pub fn quiet() -> Self {
        Self::new(true, false)
    }

    /// Create a verbose formatter.
    #[cfg(test)]
    pub fn verbose() -> Self {
        Self::new(false, true)
    }

    /// Returns true if stderr is a TTY and TERM is set.
    fn should_use_color() -> bool {
        use std::io::IsTerminal;
        io::stderr().is_terminal() && std::env::var("TERM").is_ok()
    }

    /// Print an informational message. Suppressed in quiet mode.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            self.print_message(MessageLevel::Info, message);
        }
    }

    /// Print a success message. Suppressed in quiet mode.
    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.print_message(MessageLevel::Success, message);
        }
    }

    /// Print a warning message. Always displayed.
    pub fn warning(&self, message: &str) {
        self.print_message(MessageLevel::Warning, message);
    }

    /// Print an error message. Always displayed.
    pub fn error(&self, message: &str) {
        self.print_message(MessageLevel::Error, message);
    }

    fn print_message(&self, level: MessageLevel, message: &str) {
        let (prefix, color_code) = match level {
            MessageLevel::Info => ("", ""),
            MessageLevel::Success => ("✓ ", "\x1b[32m"), // Green
            MessageLevel::Warning => ("⚠ ", "\x1b[33m"), // Yellow
            MessageLevel::Error => ("✗ ", "\x1b[31m"),   // Red
        };

        let reset = "\x1b[0m";

        // Human-readable output goes to stderr; stdout is reserved for --json.
        if self.colored && !color_code.is_empty() {
            eprintln!("{color_code}{prefix}{message}{reset}");
        } else {
            eprintln!("{prefix}{message}");
        }
    }

    /// Print a section header. Suppressed in quiet mode.
    pub fn section(&self, title: &str) {
        if !self.quiet {
            eprintln!("\n{title}");
        }
    }

    /// Print a labelled value. Only shown in verbose mode.
    pub fn detail(&self, label: &str, value: &str) {
        if self.verbose {
            eprintln!("  {label}: {value}");
        }
    }

    /// Print a list item. Suppressed in quiet mode.
    pub fn list_item(&self, index: usize, message: &str) {
        if !self.quiet {
            eprintln!("  {index}. {message}");
        }
    }

    /// Print a blank line. Suppressed in quiet mode.
    pub fn blank_line(&self) {
        if !self.quiet {
            eprintln!();
        }
    }

    /// Check if output should be shown.
    pub fn should_print(&self) -> bool {
        !self.quiet
    }

    /// Check if verbose output should be shown.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if quiet mode is enabled.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(false, false)
    }
}

/// One line describing what happened to a file.
pub fn describe_outcome(name: &str, status: &FileStatus) -> String {
    match status {
        FileStatus::Merged { pages: 1 } => format!("{name} (1 page)"),
        FileStatus::Merged { pages } => format!("{name} ({pages} pages)"),
        FileStatus::Skipped { reason } => format!("{name} skipped: {reason}"),
        FileStatus::Failed { reason } => format!("{name} failed: {reason}"),
    }
}

/// Display a merge report.
///
/// Every excluded file gets a warning, even in quiet mode. The file list
/// and timing statistics are shown in verbose mode only.
pub fn display_report(formatter: &OutputFormatter, report: &MergeReport) {
    for outcome in report.excluded() {
        formatter.warning(&describe_outcome(&outcome.name, &outcome.status));
    }

    if !formatter.is_verbose() {
        return;
    }

    formatter.section("Files");
    for outcome in &report.outcomes {
        formatter.list_item(
            outcome.index + 1,
            &describe_outcome(&outcome.name, &outcome.status),
        );
    }

    formatter.section("Statistics");
    formatter.detail("Files merged", &report.merged_count().to_string());
    formatter.detail("Total pages", &report.total_pages.to_string());
    formatter.detail("Input size", &report.format_input_size());
    formatter.detail("Output size", &report.format_output_size());
    formatter.detail(
        "Read time",
        &format!("{:.2}s", report.read_time.as_secs_f64()),
    );
    formatter.detail(
        "Compose time",
        &format!("{:.2}s", report.compose_time.as_secs_f64()),
    );
    formatter.detail(
        "Save time",
        &format!("{:.2}s", report.save_time.as_secs_f64()),
    );
}
