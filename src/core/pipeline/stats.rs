//! Run statistics shared by every worker.

use crate::events::RunSummary;
use std::sync::atomic::{AtomicUsize, Ordering};

/// How a single file ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Processed,
    Duplicate,
    Error,
}

/// Lock-free tally of per-file outcomes
#[derive(Debug, Default)]
pub struct RunStatistics {
    processed: AtomicUsize,
    duplicates: AtomicUsize,
    errors: AtomicUsize,
    finished: AtomicUsize,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one file; returns how many files have finished so far
    pub fn record(&self, outcome: Outcome) -> usize {
        let counter = match outcome {
            Outcome::Processed => &self.processed,
            Outcome::Duplicate => &self.duplicates,
            Outcome::Error => &self.errors,
        };
        counter.fetch_add(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Files counted under any outcome
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    /// Snapshot for reporting
    pub fn summary(&self) -> RunSummary {
        let processed = self.processed.load(Ordering::SeqCst);
        let duplicates = self.duplicates.load(Ordering::SeqCst);
        let errors = self.errors.load(Ordering::SeqCst);

        RunSummary {
            total: processed + duplicates + errors,
            processed,
            duplicates,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn summary_adds_up() {
        let stats = RunStatistics::new();
        stats.record(Outcome::Processed);
        stats.record(Outcome::Processed);
        stats.record(Outcome::Duplicate);
        stats.record(Outcome::Error);

        let summary = stats.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.processed, 2);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(summary.errors, 1);
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        let stats = RunStatistics::new();

        (0..3000).into_par_iter().for_each(|i| {
            let outcome = match i % 3 {
                0 => Outcome::Processed,
                1 => Outcome::Duplicate,
                _ => Outcome::Error,
            };
            stats.record(outcome);
        });

        let summary = stats.summary();
        assert_eq!(summary.total, 3000);
        assert_eq!(summary.processed, 1000);
        assert_eq!(stats.finished(), 3000);
    }

    #[test]
    fn each_record_reports_a_distinct_position() {
        let stats = RunStatistics::new();

        let mut positions: Vec<usize> = (0..2000)
            .into_par_iter()
            .map(|i| {
                let outcome = if i % 2 == 0 {
                    Outcome::Processed
                } else {
                    Outcome::Error
                };
                stats.record(outcome)
            })
            .collect();
        positions.sort_unstable();

        assert_eq!(positions, (1..=2000).collect::<Vec<_>>());
    }
}
