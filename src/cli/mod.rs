//! # CLI Module
//!
//! Command-line interface for the photo organizer.
//!
//! ## Usage
//! ```bash
//! # Organize into ~/Pictures/Phone_Organized
//! photo-organize ~/Pictures/Phone
//!
//! # Explicit destination, fixed worker count
//! photo-organize ~/Pictures/Phone ~/Library --workers 8
//!
//! # No network lookups, JSON summary
//! photo-organize ~/Pictures/Phone --offline --output json
//! ```

use clap::{Parser, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use photo_organizer::core::geocode::OfflineResolver;
use photo_organizer::core::pipeline::{default_destination, Pipeline, PipelineResult};
use photo_organizer::error::Result;
use photo_organizer::events::{Event, EventChannel, IngestEvent, PipelineEvent};
use std::path::PathBuf;
use std::process;
use std::thread;

/// Photo Organizer - Copy photos into a year and place library
#[derive(Parser, Debug)]
#[command(name = "photo-organize")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Folder to read photos from
    source: PathBuf,

    /// Library folder to copy into (default: <SOURCE>_Organized)
    destination: Option<PathBuf>,

    /// Number of concurrent workers (default: one per CPU)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Skip reverse geocoding; photos go into plain year folders
    #[arg(long)]
    offline: bool,

    /// Output format
    #[arg(short, long, default_value = "pretty")]
    output: OutputFormat,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    photo_organizer::init_tracing();

    if let Err(e) = run_organize(cli) {
        let term = Term::stderr();
        term.write_line(&format!("{} {}", style("Error:").red().bold(), e))
            .ok();
        process::exit(1);
    }

    Ok(())
}

fn run_organize(cli: Cli) -> Result<()> {
    let term = Term::stdout();
    let pretty = matches!(cli.output, OutputFormat::Pretty);

    let destination = cli
        .destination
        .clone()
        .unwrap_or_else(|| default_destination(&cli.source));

    let mut builder = Pipeline::builder()
        .source(&cli.source)
        .destination(&destination);
    if let Some(workers) = cli.workers {
        builder = builder.workers(workers);
    }
    if cli.offline {
        builder = builder.place_resolver(Box::new(OfflineResolver));
    }
    let pipeline = builder.build()?;

    if pretty {
        term.write_line(&format!(
            "{} {}",
            style("Photo Organizer").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line(&format!(
            "  {} {}",
            style("Source:").dim(),
            cli.source.display()
        ))
        .ok();
        term.write_line(&format!(
            "  {} {}",
            style("Destination:").dim(),
            destination.display()
        ))
        .ok();
        term.write_line("").ok();
    }

    let (sender, receiver) = EventChannel::new();

    let progress = if pretty {
        let pb = ProgressBar::new(0);
        if let Ok(bar_style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(bar_style.progress_chars("█▓░"));
        }
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let verbose = cli.verbose;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress_clone else {
                continue;
            };
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(format!("{}", phase));
                }
                Event::Ingest(IngestEvent::Started { total_photos, .. }) => {
                    pb.set_length(total_photos as u64);
                }
                Event::Ingest(IngestEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    if verbose {
                        pb.set_message(
                            p.current_path
                                .file_name()
                                .unwrap_or_default()
                                .to_string_lossy()
                                .into_owned(),
                        );
                    }
                }
                Event::Ingest(IngestEvent::Error { path, message }) if verbose => {
                    pb.println(format!(
                        "  {} {}: {}",
                        style("✗").red(),
                        path.display(),
                        message
                    ));
                }
                Event::Pipeline(PipelineEvent::Completed { .. })
                | Event::Pipeline(PipelineEvent::Error { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = pipeline.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    let result = result?;

    match cli.output {
        OutputFormat::Pretty => print_pretty_results(&term, &result, verbose),
        OutputFormat::Json => print_json_results(&result),
    }

    Ok(())
}

fn print_pretty_results(term: &Term, result: &PipelineResult, verbose: bool) {
    let summary = &result.summary;

    term.write_line(&format!("{} Organize Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!("  {} total files", style(summary.total).cyan()))
        .ok();
    term.write_line(&format!("  {} processed", style(summary.processed).green()))
        .ok();
    term.write_line(&format!(
        "  {} duplicates skipped",
        style(summary.duplicates).yellow()
    ))
    .ok();
    term.write_line(&format!("  {} errors", style(summary.errors).red()))
        .ok();
    term.write_line(&format!(
        "  {} workers, {:.1}s",
        style(result.workers).dim(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();

    if result.geocode_lookups + result.geocode_hits > 0 {
        term.write_line(&format!(
            "  {} place lookups, {} answered from cache",
            style(result.geocode_lookups).dim(),
            style(result.geocode_hits).dim()
        ))
        .ok();
    }

    if verbose && !result.errors.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!("{}", style("Errors:").bold().underlined()))
            .ok();
        for error in &result.errors {
            term.write_line(&format!("  {} {}", style("✗").red(), error))
                .ok();
        }
    }
}

fn print_json_results(result: &PipelineResult) {
    let output = serde_json::json!({
        "total": result.summary.total,
        "processed": result.summary.processed,
        "duplicates": result.summary.duplicates,
        "errors": result.summary.errors,
        "duration_ms": result.duration_ms,
        "workers": result.workers,
        "geocode_lookups": result.geocode_lookups,
        "geocode_hits": result.geocode_hits,
        "copied": result.copied,
        "error_messages": result.errors,
    });

    match serde_json::to_string_pretty(&output) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize summary: {}", e),
    }
}
