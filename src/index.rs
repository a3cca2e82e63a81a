//! Minimizer-keyed unitig index.
//!
//! Maps every minimizer to the list of places it occurs across the graph's
//! unitigs. This is the sole mechanism for answering "which unitig contains
//! this k-mer": a k-mer can only live in a unitig that also contains its
//! minimizer, so a lookup inspects one occurrence list instead of the whole
//! graph.
//!
//! The map is a sharded concurrent hash map: readers see either the pre- or
//! post-state of any single insert or removal, and writers serialize per
//! shard. Structural graph edits additionally hold the graph's per-bucket
//! mutexes, so the index never has to reason about multi-key atomicity
//! itself.

use std::hash::BuildHasherDefault;

use dashmap::DashMap;
use rustc_hash::FxHasher;
use smallvec::SmallVec;

use crate::minimizer::Minimizer;
use crate::unitig::UnitigId;

/// One place a minimizer occurs: a unitig and the base offset of the g-mer
/// window within that unitig's stored sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    /// The unitig containing the occurrence.
    pub unitig: UnitigId,
    /// Base offset of the g-mer window within the stored sequence.
    pub pos: u32,
}

/// Most minimizers occur in very few places; keep short lists inline.
pub type OccList = SmallVec<[Occurrence; 4]>;

type FxDashMap<K, V> = DashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Concurrent map from minimizer to occurrence list.
#[derive(Debug, Default)]
pub struct MinimizerIndex {
    map: FxDashMap<Minimizer, OccList>,
}

impl MinimizerIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self {
            map: DashMap::with_hasher(BuildHasherDefault::default()),
        }
    }

    /// Appends an occurrence. Duplicates are permitted; callers prune them
    /// through [`MinimizerIndex::remove_matching`] when rewriting a unitig.
    pub fn insert(&self, m: Minimizer, occ: Occurrence) {
        self.map.entry(m).or_default().push(occ);
    }

    /// Snapshots the occurrences of `m`.
    pub fn lookup(&self, m: &Minimizer) -> OccList {
        self.map.get(m).map(|e| e.value().clone()).unwrap_or_default()
    }

    /// Removes every occurrence of `m` matching `pred`; drops the key when
    /// the list empties.
    pub fn remove_matching(&self, m: &Minimizer, pred: impl Fn(&Occurrence) -> bool) {
        if let Some(mut entry) = self.map.get_mut(m) {
            entry.retain(|occ| !pred(occ));
            let emptied = entry.is_empty();
            drop(entry);
            if emptied {
                self.map.remove_if(m, |_, list| list.is_empty());
            }
        }
    }

    /// Moves the occurrences of `m_old` matching `pred` under `m_new`,
    /// re-tagging them with `retag`. Used when a structural edit relocates a
    /// stretch of sequence without changing its minimizer content.
    pub fn rekey(
        &self,
        m_old: &Minimizer,
        m_new: Minimizer,
        pred: impl Fn(&Occurrence) -> bool,
        retag: impl Fn(Occurrence) -> Occurrence,
    ) {
        let mut moved: OccList = SmallVec::new();
        if let Some(mut entry) = self.map.get_mut(m_old) {
            let mut kept: OccList = SmallVec::new();
            for occ in entry.drain(..) {
                if pred(&occ) {
                    moved.push(retag(occ));
                } else {
                    kept.push(occ);
                }
            }
            *entry = kept;
            let emptied = entry.is_empty();
            drop(entry);
            if emptied {
                self.map.remove_if(m_old, |_, list| list.is_empty());
            }
        }
        if !moved.is_empty() {
            self.map.entry(m_new).or_default().extend(moved);
        }
    }

    /// The number of distinct minimizers present.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when no minimizer is indexed.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
