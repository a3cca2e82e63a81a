//! Two-stage cascading k-mer filter.
//!
//! Sequencing errors produce k-mers that occur once; real k-mers tend to
//! occur at least twice. The cascade keeps two Bloom filters in series: the
//! first absorbs every observation, the second only receives a k-mer the
//! first had already seen. Membership in the second filter is then the
//! overapproximation of "occurs twice or more" that bounds graph memory.
//!
//! In reference mode the second stage is absent and first-stage membership
//! passes, so every observed k-mer reaches the graph.

use std::path::Path;

use tracing::info;

use crate::bloom::BlockedBloomFilter;
use crate::error::KontigError;
use crate::kmer::Kmer;

/// Two blocked Bloom filters in series.
pub struct CascadingFilter {
    first: BlockedBloomFilter,
    second: Option<BlockedBloomFilter>,
}

impl CascadingFilter {
    /// Creates the two-stage cascade: the first stage sized for `nkmers`
    /// distinct k-mers, the second for `nkmers2` k-mers occurring twice or
    /// more.
    pub fn new(
        nkmers: usize,
        bits_per_kmer: usize,
        nkmers2: usize,
        bits_per_kmer2: usize,
        k: usize,
    ) -> Self {
        Self {
            first: BlockedBloomFilter::new(nkmers, bits_per_kmer, k),
            second: Some(BlockedBloomFilter::new(nkmers2, bits_per_kmer2, k)),
        }
    }

    /// Creates a single-stage filter for reference mode: no error filtering,
    /// every observed k-mer passes.
    pub fn reference(nkmers: usize, bits_per_kmer: usize, k: usize) -> Self {
        Self {
            first: BlockedBloomFilter::new(nkmers, bits_per_kmer, k),
            second: None,
        }
    }

    /// Wraps a persisted pass filter loaded from disk. The filter phase is
    /// skipped entirely, so only the pass stage exists.
    pub fn load(path: &Path, k: usize) -> Result<Self, KontigError> {
        let pass = BlockedBloomFilter::load(path, k)?;
        info!(
            blocks = pass.num_blocks(),
            hashes = pass.num_hashes(),
            "loaded persisted filter"
        );
        Ok(Self {
            first: pass,
            second: None,
        })
    }

    /// Writes the pass filter to `path` in the persisted format.
    pub fn save(&self, path: &Path) -> Result<(), KontigError> {
        self.pass_filter().save(path)
    }

    /// Records one observation of a canonical k-mer.
    ///
    /// The first observation stops at the first stage; later observations
    /// cascade into the second stage when one exists.
    pub fn observe(&self, km: &Kmer) {
        let h = km.canonical_hash();
        if self.first.insert(h) {
            return;
        }
        if let Some(second) = &self.second {
            second.insert(h);
        }
    }

    /// True when the canonical k-mer passes the cascade and may enter the
    /// graph. Overapproximate: Bloom false positives pass too.
    pub fn passes(&self, km: &Kmer) -> bool {
        let h = km.canonical_hash();
        match &self.second {
            Some(second) => second.contains(h),
            None => self.first.contains(h),
        }
    }

    /// The filter whose membership admits k-mers to the graph.
    fn pass_filter(&self) -> &BlockedBloomFilter {
        self.second.as_ref().unwrap_or(&self.first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn km(s: &str) -> Kmer {
        s.parse().unwrap()
    }

    #[test]
    fn single_observation_does_not_pass() {
        let cascade = CascadingFilter::new(1_000, 14, 1_000, 14, 4);
        cascade.observe(&km("ACGT"));
        assert!(!cascade.passes(&km("ACGT")));
    }

    #[test]
    fn second_observation_passes() {
        let cascade = CascadingFilter::new(1_000, 14, 1_000, 14, 4);
        cascade.observe(&km("ACGT"));
        cascade.observe(&km("ACGT"));
        assert!(cascade.passes(&km("ACGT")));
    }

    #[test]
    fn twin_observations_count_as_one_kmer() {
        let cascade = CascadingFilter::new(1_000, 14, 1_000, 14, 4);
        cascade.observe(&km("AAAC"));
        cascade.observe(&km("GTTT"));
        assert!(cascade.passes(&km("AAAC")));
        assert!(cascade.passes(&km("GTTT")));
    }

    #[test]
    fn reference_mode_passes_single_observation() {
        let cascade = CascadingFilter::reference(1_000, 14, 4);
        cascade.observe(&km("ACGT"));
        assert!(cascade.passes(&km("ACGT")));
        assert!(!cascade.passes(&km("CCCC")));
    }

    #[test]
    fn save_and_load_preserve_pass_membership() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pass.bbf");

        let cascade = CascadingFilter::new(1_000, 14, 1_000, 14, 5);
        cascade.observe(&km("ACGTA"));
        cascade.observe(&km("ACGTA"));
        cascade.save(&path).unwrap();

        let loaded = CascadingFilter::load(&path, 5).unwrap();
        assert!(loaded.passes(&km("ACGTA")));
        assert!(!loaded.passes(&km("TTTTT")));
    }
}
