//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the organizer pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Source discovery events
    Scan(ScanEvent),
    /// Per-file ingestion events
    Ingest(IngestEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events while walking the source folder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Walking has started
    Started { root: PathBuf },
    /// An entry could not be read; the walk continues
    Error { path: PathBuf, message: String },
    /// Walking finished
    Completed { total_photos: usize },
}

/// Events while ingesting photos
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IngestEvent {
    /// Workers are starting on the candidate list
    Started { total_photos: usize, workers: usize },
    /// One more file has been dealt with, whatever the outcome
    Progress(IngestProgress),
    /// A photo was copied into the library
    Copied {
        source: PathBuf,
        destination: PathBuf,
    },
    /// A photo's content was already claimed by another file
    Duplicate { path: PathBuf },
    /// A photo could not be ingested
    Error { path: PathBuf, message: String },
}

/// Progress through the candidate list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestProgress {
    /// Files finished so far
    pub completed: usize,
    /// Files scheduled in total
    pub total: usize,
    /// The file that just finished
    pub current_path: PathBuf,
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Every scheduled file has been processed
    Completed { summary: RunSummary },
    /// The run could not start
    Error { message: String },
}

/// Phases of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Ingesting,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Ingesting => write!(f, "Organizing"),
        }
    }
}

/// Final tally of a run
///
/// `total` always equals `processed + duplicates + errors`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Candidate files found under the source
    pub total: usize,
    /// Files copied into the library
    pub processed: usize,
    /// Files skipped because their content was already copied
    pub duplicates: usize,
    /// Files that failed
    pub errors: usize,
}
