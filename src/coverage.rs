//! Per-k-mer abundance counters.
//!
//! Coverage is recorded while many workers map reads onto the same unitig,
//! so the counters are atomic: bumps need no lock, and structural edits read
//! the values out once they hold the graph's bucket locks.

use std::sync::atomic::{AtomicU32, Ordering};

/// A vector of saturating per-k-mer abundance counters.
#[derive(Debug, Default)]
pub struct CoverageVec(Vec<AtomicU32>);

impl CoverageVec {
    /// A zeroed coverage vector of `len` counters.
    pub fn new(len: usize) -> Self {
        Self((0..len).map(|_| AtomicU32::new(0)).collect())
    }

    /// Builds a coverage vector from explicit counts.
    pub fn from_counts(counts: Vec<u32>) -> Self {
        Self(counts.into_iter().map(AtomicU32::new).collect())
    }

    /// The number of counters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no counters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Increments the counter at `i`, saturating at `u32::MAX`.
    pub fn bump(&self, i: usize) {
        let _ = self.0[i].fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
            Some(v.saturating_add(1))
        });
    }

    /// The value at `i`.
    pub fn get(&self, i: usize) -> u32 {
        self.0[i].load(Ordering::Relaxed)
    }

    /// Snapshots all counters.
    pub fn to_vec(&self) -> Vec<u32> {
        self.0.iter().map(|c| c.load(Ordering::Relaxed)).collect()
    }

    /// Snapshots the counters in reverse order.
    pub fn to_vec_reversed(&self) -> Vec<u32> {
        let mut v = self.to_vec();
        v.reverse();
        v
    }
}

impl Clone for CoverageVec {
    fn clone(&self) -> Self {
        Self::from_counts(self.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_and_read() {
        let cov = CoverageVec::new(3);
        cov.bump(1);
        cov.bump(1);
        cov.bump(2);
        assert_eq!(cov.to_vec(), vec![0, 2, 1]);
    }

    #[test]
    fn saturates_at_max() {
        let cov = CoverageVec::from_counts(vec![u32::MAX]);
        cov.bump(0);
        assert_eq!(cov.get(0), u32::MAX);
    }

    #[test]
    fn reversed_snapshot() {
        let cov = CoverageVec::from_counts(vec![1, 2, 3]);
        assert_eq!(cov.to_vec_reversed(), vec![3, 2, 1]);
    }
}
