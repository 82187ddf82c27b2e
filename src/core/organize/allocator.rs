//! Collision-free destination names.

use crate::error::OrganizeError;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Hands out `{date}_IMG{nnnn}{ext}` paths, unique per folder for a run
///
/// Each folder has a counter that only moves forward. Counter lookup,
/// increment and the on-disk existence check all happen under one lock,
/// so two workers can never be handed the same path, and files left over
/// from an earlier run are skipped rather than overwritten.
#[derive(Debug, Default)]
pub struct DestinationAllocator {
    counters: Mutex<HashMap<PathBuf, u32>>,
}

impl DestinationAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a free path in `folder`, creating the folder if needed
    ///
    /// `extension` is appended verbatim and should include its dot.
    pub fn allocate(
        &self,
        folder: &Path,
        date_prefix: &str,
        extension: &str,
    ) -> Result<PathBuf, OrganizeError> {
        fs::create_dir_all(folder).map_err(|source| OrganizeError::CreateFolder {
            path: folder.to_path_buf(),
            source,
        })?;

        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let counter = counters.entry(folder.to_path_buf()).or_insert(0);

        loop {
            *counter = counter
                .checked_add(1)
                .ok_or_else(|| OrganizeError::CounterExhausted {
                    folder: folder.to_path_buf(),
                })?;

            let candidate = folder.join(file_name(date_prefix, *counter, extension));
            if !candidate.exists() {
                return Ok(candidate);
            }
        }
    }

    /// Last counter value handed out for `folder`, if any
    pub fn counter(&self, folder: &Path) -> Option<u32> {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(folder)
            .copied()
    }
}

fn file_name(date_prefix: &str, counter: u32, extension: &str) -> String {
    format!("{}_IMG{:04}{}", date_prefix, counter, extension)
}
