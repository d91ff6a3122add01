//! pdfstitch - Stitch JPEG, PNG and PDF files into a single PDF document.

mod cli;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::output::{OutputFormatter, display_report};
use pdfstitch::config::{Config, OverwriteMode};
use pdfstitch::error::StitchError;
use pdfstitch::io::{DirectorySink, MemorySink};
use pdfstitch::merge::{CancelToken, MergeReport, MergeSession};
use pdfstitch::source::SelectedFile;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        OutputFormatter::default().error(&format!("Error: {err:#}"));
        let code = err
            .downcast_ref::<StitchError>()
            .map_or(1, StitchError::exit_code);
        process::exit(code);
    }
}

/// Install the log subscriber. `RUST_LOG` overrides the default filter.
///
/// Excluded files are already reported by the formatter, so library
/// warnings only show up in verbose mode.
fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,pdfstitch=debug" } else { "error" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main application logic.
async fn run(cli: Cli) -> Result<()> {
    cli.validate()?;

    let mut config = cli.to_config()?;
    config.inputs = expand_inputs(&config.inputs)?;

    let formatter = OutputFormatter::from_config(&config);
    if formatter.should_print() {
        formatter.section(&format!("{} v{}", pdfstitch::NAME, pdfstitch::VERSION));
        formatter.blank_line();
    }

    let mut session = MergeSession::new(config.session_options());
    session.initialize();
    session.set_file_list(config.inputs.iter().map(SelectedFile::from_path).collect());
    for step in &config.moves {
        session.reorder(step.from, Some(step.to))?;
    }
    if let Some(name) = &config.name {
        session.set_output_name(name);
    }

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    formatter.info(&format!("Merging {} file(s)...", session.files().len()));

    let report = if config.dry_run {
        let mut sink = MemorySink::new();
        session.merge_and_download(&mut sink, &cancel).await?
    } else {
        let target = config.out_dir.join(session.output_file_name());
        let overwrite = handle_output_overwrite(&config, &target, &formatter)?;
        let mut sink = DirectorySink::new(&config.out_dir).with_overwrite(overwrite);
        sink.can_write()?;
        session.merge_and_download(&mut sink, &cancel).await?
    };

    display_report(&formatter, &report);
    if config.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    finish(&config, &report, &formatter)
}

/// Print the closing summary and fail when nothing was produced.
fn finish(config: &Config, report: &MergeReport, formatter: &OutputFormatter) -> Result<()> {
    let Some(file_name) = report.file_name.as_deref() else {
        return Err(StitchError::other("None of the selected files could be merged").into());
    };
    let path = config.out_dir.join(file_name);

    formatter.blank_line();
    if config.dry_run {
        formatter.success("Dry run completed successfully");
        formatter.info(&format!(
            "  Output would be: {} ({} pages, {})",
            path.display(),
            report.total_pages,
            report.format_output_size()
        ));
        formatter.info("  Run without --dry-run to create the merged PDF");
    } else {
        formatter.success(&format!(
            "Created {} ({} pages, {}) in {:.2}s",
            path.display(),
            report.total_pages,
            report.format_output_size(),
            report.total_time().as_secs_f64()
        ));
    }

    Ok(())
}

/// Expand glob patterns, keeping literal paths as given.
///
/// Each pattern's matches are sorted; a pattern without matches is an
/// error, while a literal path that does not exist is left for the merge
/// to report.
fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut resolved = Vec::new();

    for input in inputs {
        let pattern = input.to_string_lossy();
        if !pattern.contains(['*', '?', '[']) {
            resolved.push(input.clone());
            continue;
        }

        let mut matches = glob::glob(&pattern)
            .with_context(|| format!("Invalid glob pattern: {pattern}"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to expand {pattern}"))?;
        if matches.is_empty() {
            return Err(StitchError::invalid_config(format!("No files match {pattern}")).into());
        }

        matches.sort();
        resolved.extend(matches);
    }

    Ok(resolved)
}

/// Decide how an existing output file is treated.
///
/// Returns the mode handed to the sink: prompting happens here, so the
/// sink only ever sees force or no-clobber.
fn handle_output_overwrite(
    config: &Config,
    target: &Path,
    formatter: &OutputFormatter,
) -> Result<OverwriteMode, StitchError> {
    if !target.exists() {
        return Ok(OverwriteMode::NoClobber);
    }

    match config.overwrite_mode {
        OverwriteMode::Force => Ok(OverwriteMode::Force),
        OverwriteMode::NoClobber => Err(StitchError::output_exists(target.to_path_buf())),
        OverwriteMode::Prompt => {
            if formatter.is_quiet() {
                return Err(StitchError::output_exists(target.to_path_buf()));
            }

            formatter.warning(&format!(
                "Output file already exists: {}",
                target.display()
            ));

            use std::io::{self, Write};
            eprint!("Overwrite? [y/N]: ");
            io::stderr().flush().ok();

            let mut response = String::new();
            io::stdin()
                .read_line(&mut response)
                .map_err(|err| StitchError::other(format!("Failed to read input: {err}")))?;

            let response = response.trim().to_lowercase();
            if response == "y" || response == "yes" {
                Ok(OverwriteMode::Force)
            } else {
                Err(StitchError::Cancelled)
            }
        }
    }
}
