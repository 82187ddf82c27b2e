//! # Error Module
//!
//! Error types for the photo organizer.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Only one fatal error** - a missing source folder stops the run,
//!   everything else is counted and logged per file

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum OrganizerError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Geocoding error: {0}")]
    Geocode(#[from] GeocodeError),

    #[error("Organize error: {0}")]
    Organize(#[from] OrganizeError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while discovering photos
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Source folder not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while reading a photo's metadata or fingerprint
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine a capture date for {path}")]
    NoTimestamp { path: PathBuf },

    /// For [`MetadataExtractor`](crate::core::metadata::MetadataExtractor)
    /// implementations that reject a file's content. The EXIF extractor
    /// never returns it: broken EXIF falls back to the file time.
    #[error("Metadata extraction failed for {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

/// Errors from a single reverse geocoding request
///
/// These never reach the run's error tally; the resolver turns them into
/// an unknown place.
#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("Geocoding service is rate limiting requests (HTTP 429)")]
    RateLimited,

    #[error("Geocoding service returned HTTP {code}")]
    Status { code: u16 },

    #[error("Geocoding request failed: {0}")]
    Network(String),

    #[error("Geocoding response could not be parsed: {0}")]
    Malformed(String),

    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),
}

impl GeocodeError {
    /// Whether the request may succeed if retried after backing off
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GeocodeError::RateLimited)
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(error: reqwest::Error) -> Self {
        if error.status().map(|s| s.as_u16()) == Some(429) {
            GeocodeError::RateLimited
        } else if error.is_decode() {
            GeocodeError::Malformed(error.to_string())
        } else {
            GeocodeError::Network(error.to_string())
        }
    }
}

/// Errors while placing a photo in the destination tree
#[derive(Error, Debug)]
pub enum OrganizeError {
    #[error("Failed to create folder {path}: {source}")]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {source_path} to {destination}: {source}")]
    Copy {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No free file name left in {folder}")]
    CounterExhausted { folder: PathBuf },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, OrganizerError>;
