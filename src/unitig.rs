//! Unitigs and unitig locators.
//!
//! A unitig is a maximal non-branching path of k-mers stored as one
//! compacted sequence, together with per-k-mer coverage and a user payload.
//! The graph owns every unitig exclusively; external code only sees
//! [`UnitigMap`] locators, which must not outlive the next structural edit
//! that touches the same unitig.

use crate::coverage::CoverageVec;
use crate::kmer::Kmer;
use crate::sequence::CompressedSequence;

/// Stable identifier of a unitig: its arena index. Never reused in a build.
pub type UnitigId = usize;

/// Reading direction of a unitig relative to its stored orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    /// The stored orientation.
    Forward,
    /// The reverse-complement of the stored orientation.
    Reverse,
}

impl Strand {
    /// The opposite direction.
    pub fn flip(self) -> Self {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
        }
    }

    /// True for [`Strand::Forward`].
    pub fn is_forward(self) -> bool {
        matches!(self, Strand::Forward)
    }

    /// The GFA orientation character.
    pub fn gfa_char(self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

/// A maximal compacted sequence plus per-k-mer coverage and a user payload.
#[derive(Debug)]
pub struct Unitig<U> {
    /// The stored sequence, in canonical-head orientation.
    pub seq: CompressedSequence,
    /// One abundance counter per k-mer of `seq`.
    pub coverage: CoverageVec,
    /// User payload.
    pub data: U,
}

impl<U> Unitig<U> {
    /// The number of k-mers in this unitig.
    pub fn num_kmers(&self, k: usize) -> usize {
        debug_assert!(self.seq.len() >= k);
        self.seq.len() - k + 1
    }

    /// The first k-mer in the stored orientation.
    pub fn head_kmer(&self, k: usize) -> Kmer {
        self.seq.kmer_at(0, k)
    }

    /// The last k-mer in the stored orientation.
    pub fn tail_kmer(&self, k: usize) -> Kmer {
        self.seq.kmer_at(self.seq.len() - k, k)
    }

    /// The k-mer at position `pos` read in direction `strand`.
    ///
    /// For [`Strand::Reverse`], `pos` counts from the end of the stored
    /// sequence, so position 0 is the twin of the stored tail k-mer.
    pub fn kmer_in(&self, pos: usize, k: usize, strand: Strand) -> Kmer {
        match strand {
            Strand::Forward => self.seq.kmer_at(pos, k),
            Strand::Reverse => self.seq.kmer_at(self.num_kmers(k) - 1 - pos, k).twin(),
        }
    }
}

/// A transient locator naming a k-mer or range within a unitig.
///
/// `pos` and `len` are in k-mer units over the stored orientation;
/// `strand` records how the located k-mers read relative to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitigMap {
    /// The located unitig.
    pub id: UnitigId,
    /// K-mer offset within the stored sequence.
    pub pos: usize,
    /// Number of located k-mers.
    pub len: usize,
    /// Orientation of the located k-mers relative to storage.
    pub strand: Strand,
}

impl UnitigMap {
    /// A locator for a single k-mer.
    pub fn single(id: UnitigId, pos: usize, strand: Strand) -> Self {
        Self {
            id,
            pos,
            len: 1,
            strand,
        }
    }
}
