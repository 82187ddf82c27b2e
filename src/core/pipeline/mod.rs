//! # Pipeline Module
//!
//! Orchestrates a full organize run.
//!
//! ## Pipeline Stages
//! 1. **Scan** - Find candidate photos under the source folder
//! 2. **Extract** - Read capture time, GPS and content fingerprint
//! 3. **Deduplicate** - Claim the fingerprint; later copies are skipped
//! 4. **Place** - Resolve the location (cached) and pick the year folder
//! 5. **Copy** - Allocate a unique name and copy without overwriting
//!
//! ## Parallelism
//! Stages 2-5 run per file on a dedicated rayon pool, one worker per CPU
//! by default. A failing file is counted and logged; it never stops the
//! run. Only a missing source folder is fatal.

mod executor;
mod stats;

pub use executor::{
    default_destination, CopiedFile, Pipeline, PipelineBuilder, PipelineConfig, PipelineResult,
};
pub use stats::{Outcome, RunStatistics};
