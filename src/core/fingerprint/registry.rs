//! Shared set of fingerprints already claimed during a run.

use super::Fingerprint;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Thread-safe record of which contents have been claimed
///
/// The first caller to claim a fingerprint wins; every later claim for the
/// same content reports a duplicate, regardless of which worker asks first.
#[derive(Debug, Default)]
pub struct FingerprintRegistry {
    seen: Mutex<HashSet<Fingerprint>>,
}

impl FingerprintRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a fingerprint
    ///
    /// Returns `true` if it was not seen before and is now recorded, `false`
    /// if it is a duplicate. Test and insert happen under one lock.
    pub fn try_claim(&self, fingerprint: &Fingerprint) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.insert(fingerprint.clone())
    }

    /// Number of distinct fingerprints claimed
    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing has been claimed yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
