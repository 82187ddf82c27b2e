//! # Core Module
//!
//! The UI-agnostic organizing engine.
//!
//! ## Modules
//! - `scanner` - Discovers candidate photos under the source folder
//! - `metadata` - Extracts capture time and GPS position from EXIF
//! - `fingerprint` - Content digests and the run's duplicate registry
//! - `geocode` - Turns coordinates into place names, with a spatial cache
//! - `organize` - Folder naming, collision-free file names and copying
//! - `pipeline` - Orchestrates the full workflow

pub mod fingerprint;
pub mod geocode;
pub mod metadata;
pub mod organize;
pub mod pipeline;
pub mod scanner;

// Re-export commonly used types
pub use fingerprint::{Fingerprint, FingerprintRegistry};
pub use geocode::{GeoPoint, PlaceName, PlaceResolver};
pub use metadata::{MetadataExtractor, PhotoRecord};
pub use pipeline::{Pipeline, PipelineResult};
pub use scanner::PhotoFile;
