//! # Fingerprint Module
//!
//! Content fingerprints and the registry that decides which copy of a
//! photo is kept.
//!
//! A fingerprint is the SHA-256 of the file's bytes, so two files are
//! duplicates exactly when their contents are byte-identical, whatever
//! their names or folders.

mod registry;

pub use registry::FingerprintRegistry;

use crate::error::MetadataError;
use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

/// Minimum file size to hash through a memory map (1MB)
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Uppercase hex SHA-256 of a file's contents
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint an in-memory buffer
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode_upper(Sha256::digest(bytes)))
    }

    /// Fingerprint a file on disk
    ///
    /// Files of 1MB or more are memory-mapped; smaller files are streamed
    /// through the hasher.
    pub fn of_file(path: &Path) -> Result<Self, MetadataError> {
        let io_error = |source: io::Error| MetadataError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(io_error)?;
        let len = file.metadata().map_err(io_error)?.len();

        if len >= MMAP_THRESHOLD {
            // SAFETY: the map is read-only and dropped before `file`.
            let mmap = unsafe { Mmap::map(&file) }.map_err(io_error)?;
            return Ok(Self::of_bytes(&mmap));
        }

        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher).map_err(io_error)?;
        Ok(Self(hex::encode_upper(hasher.finalize())))
    }

    /// The hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
