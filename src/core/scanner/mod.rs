//! # Scanner Module
//!
//! Discovers candidate photo files under a source folder.
//!
//! ## Supported Formats
//! - JPEG (.jpg, .jpeg)
//! - PNG (.png)
//! - HEIC (.heic, .heif) - iPhone photos
//! - TIFF (.tiff, .tif)
//! - BMP (.bmp)
//! - GIF (.gif)
//!
//! Matching is on the extension only and ignores case.
//!
//! ## Example
//! ```rust,ignore
//! use photo_organizer::core::scanner::{ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let result = scanner.scan(Path::new("/Users/me/Backup"))?;
//! ```

mod filter;
mod walker;

pub use filter::ImageFilter;
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A candidate photo found under the source folder
///
/// Nothing is read from the file at scan time; anything wrong with it
/// surfaces when it is ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoFile {
    /// Path to the photo file
    pub path: PathBuf,
}

/// Result of a scan operation
#[derive(Debug)]
pub struct ScanResult {
    /// Candidate photos, sorted by path
    pub photos: Vec<PhotoFile>,
    /// Entries below the root that could not be read (non-fatal)
    pub errors: Vec<ScanError>,
}
