//! Compacted de Bruijn graph construction and simplification.
//!
//! The graph is a set of [`Unitig`]s in an append-only arena, located through
//! the [`MinimizerIndex`]. Construction slides canonical k-mers over reads,
//! admits the ones that pass the cascading filter, and grows maximal
//! non-branching paths; a final compaction sweep joins unitigs whose shared
//! endpoint has exactly one continuation on each side.
//!
//! # Concurrency
//!
//! Workers share the graph by reference. Coverage bumps are atomic, the
//! index is a sharded concurrent map, and unitig introduction runs inside a
//! critical section keyed by the minimizer buckets of every k-mer involved:
//! bucket mutexes are acquired in sorted order, the k-mers are re-checked
//! under the locks, and segments that lost the race are trimmed away. For
//! any single k-mer, at most one worker becomes its introducer.

use std::ops::Range;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::cascade::CascadingFilter;
use crate::coverage::CoverageVec;
use crate::error::KontigError;
use crate::feeder::ReadFeeder;
use crate::kmer::{Base, Kmer, MAX_KMER_SIZE};
use crate::minimizer::Minimizer;
use crate::sequence::CompressedSequence;
use crate::unitig::{Strand, Unitig, UnitigId, UnitigMap};
use crate::index::{MinimizerIndex, Occurrence};

/// Number of bucket mutexes guarding unitig introduction and edits.
const NUM_BUCKETS: usize = 1 << 12;

/// Payload combinator invoked when two unitigs are joined.
pub type JoinData<U> = fn(&UnitigMap, &UnitigMap, &CompactedDBG<U>) -> U;

/// Payload combinator invoked when a unitig splits into kept ranges.
pub type SplitData<U> = fn(&UnitigMap, &[Range<usize>], &CompactedDBG<U>) -> Vec<U>;

/// Parameters for [`CompactedDBG::build`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Input FASTA/FASTQ files, plain or gzipped.
    pub files: Vec<PathBuf>,
    /// Upper bound on distinct k-mers (sizes the first filter stage).
    pub nkmers: usize,
    /// Upper bound on k-mers occurring twice or more (second stage).
    pub nkmers2: usize,
    /// Bits per k-mer in the first filter stage.
    pub bloom_bits: usize,
    /// Bits per k-mer in the second filter stage.
    pub bloom_bits2: usize,
    /// Reference mode: no error filtering, every observed k-mer passes.
    pub reference: bool,
    /// Worker thread count.
    pub threads: usize,
    /// Reads per work chunk.
    pub chunk_size: usize,
    /// Load a persisted filter and skip the filter phase.
    pub load_filter: Option<PathBuf>,
    /// Persist the pass filter after the filter phase.
    pub save_filter: Option<PathBuf>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            nkmers: 0,
            nkmers2: 0,
            bloom_bits: 14,
            bloom_bits2: 14,
            reference: false,
            threads: 1,
            chunk_size: 10_000,
            load_filter: None,
            save_filter: None,
        }
    }
}

/// A connection between two unitig endpoints, overlapping by k-1 bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    /// Source unitig.
    pub from: UnitigId,
    /// Reading direction out of the source.
    pub from_strand: Strand,
    /// Target unitig.
    pub to: UnitigId,
    /// Reading direction into the target.
    pub to_strand: Strand,
}

/// A compacted de Bruijn graph over canonical k-mers.
///
/// `U` is a per-unitig payload combined through the `join_data` and
/// `split_data` hooks on structural edits; the default instantiation is the
/// unit type with no-op hooks.
pub struct CompactedDBG<U = ()> {
    k: usize,
    g: usize,
    slots: RwLock<Vec<Option<Unitig<U>>>>,
    index: MinimizerIndex,
    buckets: Box<[Mutex<()>]>,
    join_data: JoinData<U>,
    split_data: SplitData<U>,
}

fn default_join<U: Default + Clone + Send + Sync>(
    _tail: &UnitigMap,
    _head: &UnitigMap,
    _cdbg: &CompactedDBG<U>,
) -> U {
    U::default()
}

fn default_split<U: Default + Clone + Send + Sync>(
    _unitig: &UnitigMap,
    ranges: &[Range<usize>],
    _cdbg: &CompactedDBG<U>,
) -> Vec<U> {
    ranges.iter().map(|_| U::default()).collect()
}

impl<U: Default + Clone + Send + Sync> CompactedDBG<U> {
    /// Creates an empty graph for k-mers of length `k` and minimizers of
    /// length `g`, with no-op payload hooks.
    pub fn new(k: usize, g: usize) -> Result<Self, KontigError> {
        Self::with_hooks(k, g, default_join, default_split)
    }

    /// Creates an empty graph with user payload hooks.
    pub fn with_hooks(
        k: usize,
        g: usize,
        join_data: JoinData<U>,
        split_data: SplitData<U>,
    ) -> Result<Self, KontigError> {
        if k == 0 || k >= MAX_KMER_SIZE {
            return Err(KontigError::InvalidKmerLength {
                k,
                max: MAX_KMER_SIZE - 1,
            });
        }
        if g == 0 || g >= k {
            return Err(KontigError::InvalidMinimizerLength { g, k });
        }
        Ok(Self {
            k,
            g,
            slots: RwLock::new(Vec::new()),
            index: MinimizerIndex::new(),
            buckets: (0..NUM_BUCKETS).map(|_| Mutex::new(())).collect(),
            join_data,
            split_data,
        })
    }

    /// The k-mer length.
    pub fn k(&self) -> usize {
        self.k
    }

    /// The minimizer length.
    pub fn g(&self) -> usize {
        self.g
    }

    /// The number of live unitigs.
    pub fn num_unitigs(&self) -> usize {
        self.read_slots().iter().filter(|s| s.is_some()).count()
    }

    /// The total number of k-mer positions across live unitigs.
    pub fn num_kmers(&self) -> usize {
        let k = self.k;
        self.read_slots()
            .iter()
            .flatten()
            .map(|u| u.num_kmers(k))
            .sum()
    }

    /// Snapshot of live unitig ids.
    pub fn unitig_ids(&self) -> Vec<UnitigId> {
        self.read_slots()
            .iter()
            .enumerate()
            .filter_map(|(id, s)| s.as_ref().map(|_| id))
            .collect()
    }

    /// Snapshot of live unitigs as `(id, stored sequence)`.
    pub fn unitigs(&self) -> Vec<(UnitigId, String)> {
        self.read_slots()
            .iter()
            .enumerate()
            .filter_map(|(id, s)| s.as_ref().map(|u| (id, u.seq.to_string())))
            .collect()
    }

    /// Snapshot of live unitig sequences in stored orientation.
    pub fn sequences(&self) -> Vec<String> {
        self.unitigs().into_iter().map(|(_, s)| s).collect()
    }

    /// The stored sequence of one unitig.
    pub fn unitig_seq(&self, id: UnitigId) -> Option<String> {
        self.with_unitig(id, |u| u.seq.to_string())
    }

    /// The coverage counters of one unitig.
    pub fn coverage(&self, id: UnitigId) -> Option<Vec<u32>> {
        self.with_unitig(id, |u| u.coverage.to_vec())
    }

    /// The payload of the unitig a locator points into.
    pub fn data(&self, um: &UnitigMap) -> Option<U> {
        self.with_unitig(um.id, |u| u.data.clone())
    }

    /// Looks up the unitig occurrence of a k-mer, in either orientation.
    ///
    /// The returned locator reads `Strand::Forward` when the stored k-mer
    /// equals `km` as given, `Strand::Reverse` when it equals its twin.
    pub fn find(&self, km: &Kmer) -> Option<UnitigMap> {
        let k = self.k;
        debug_assert_eq!(km.len(), k);
        let twin = km.twin();
        let (m, _) = Minimizer::of(&km.rep(), self.g);
        let fwd = m.positions_in(km);
        let rev = m.positions_in(&twin);
        let occs = self.index.lookup(&m);
        let slots = self.read_slots();
        for occ in occs {
            let Some(u) = slots.get(occ.unitig).and_then(Option::as_ref) else {
                continue;
            };
            let q = occ.pos as usize;
            for &d in &fwd {
                if q >= d && q - d + k <= u.seq.len() && u.seq.kmer_at(q - d, k) == *km {
                    return Some(UnitigMap::single(occ.unitig, q - d, Strand::Forward));
                }
            }
            for &d in &rev {
                if q >= d && q - d + k <= u.seq.len() && u.seq.kmer_at(q - d, k) == twin {
                    return Some(UnitigMap::single(occ.unitig, q - d, Strand::Reverse));
                }
            }
        }
        None
    }

    /// Every unitig occurrence of a k-mer. A k-mer normally occurs once,
    /// but a unitig that folds through a palindromic k-mer can carry the
    /// same canonical k-mer at several positions; occurrence-sensitive
    /// edits must see them all.
    fn find_all(&self, km: &Kmer) -> Vec<UnitigMap> {
        let k = self.k;
        let twin = km.twin();
        let (m, _) = Minimizer::of(&km.rep(), self.g);
        let fwd = m.positions_in(km);
        let rev = m.positions_in(&twin);
        let occs = self.index.lookup(&m);
        let slots = self.read_slots();
        let mut out: Vec<UnitigMap> = Vec::new();
        for occ in occs {
            let Some(u) = slots.get(occ.unitig).and_then(Option::as_ref) else {
                continue;
            };
            let q = occ.pos as usize;
            for &d in &fwd {
                if q >= d && q - d + k <= u.seq.len() && u.seq.kmer_at(q - d, k) == *km {
                    let um = UnitigMap::single(occ.unitig, q - d, Strand::Forward);
                    if !out.contains(&um) {
                        out.push(um);
                    }
                }
            }
            for &d in &rev {
                if q >= d && q - d + k <= u.seq.len() && u.seq.kmer_at(q - d, k) == twin {
                    let um = UnitigMap::single(occ.unitig, q - d, Strand::Reverse);
                    if !out.contains(&um) {
                        out.push(um);
                    }
                }
            }
        }
        out
    }

    /// True when this occurrence is the last k-mer of its unitig in its
    /// reading direction.
    fn occ_is_tail(&self, um: &UnitigMap) -> bool {
        self.num_kmers_of(um.id).is_some_and(|nk| match um.strand {
            Strand::Forward => um.pos == nk - 1,
            Strand::Reverse => um.pos == 0,
        })
    }

    /// True when this occurrence is the first k-mer of its unitig in its
    /// reading direction.
    fn occ_is_head(&self, um: &UnitigMap) -> bool {
        self.num_kmers_of(um.id).is_some_and(|nk| match um.strand {
            Strand::Forward => um.pos == 0,
            Strand::Reverse => um.pos == nk - 1,
        })
    }

    /// The k-mer following this occurrence in its reading direction, when
    /// the occurrence is not at the tail.
    fn occ_next_kmer(&self, um: &UnitigMap) -> Option<Kmer> {
        let k = self.k;
        self.with_unitig(um.id, |u| {
            let nk = u.num_kmers(k);
            match um.strand {
                Strand::Forward if um.pos + 1 < nk => Some(u.seq.kmer_at(um.pos + 1, k)),
                Strand::Reverse if um.pos > 0 => Some(u.seq.kmer_at(um.pos - 1, k).twin()),
                _ => None,
            }
        })
        .flatten()
    }

    /// Builds the graph from sequence files.
    ///
    /// Phase A feeds every canonical k-mer to the cascading filter (skipped
    /// when a persisted filter is loaded); phase B constructs unitigs from
    /// the k-mers that pass; a final sweep restores unitig maximality.
    pub fn build(&mut self, opt: &BuildOptions) -> Result<(), KontigError> {
        let this: &Self = self;
        let threads = opt.threads.max(1);
        let filter = match &opt.load_filter {
            Some(path) => CascadingFilter::load(path, this.k)?,
            None => {
                let filter = if opt.reference {
                    CascadingFilter::reference(opt.nkmers, opt.bloom_bits, this.k)
                } else {
                    CascadingFilter::new(
                        opt.nkmers,
                        opt.bloom_bits,
                        opt.nkmers2,
                        opt.bloom_bits2,
                        this.k,
                    )
                };
                info!(threads, "filter phase");
                let feeder = ReadFeeder::new(&opt.files, opt.chunk_size);
                run_workers(threads, || {
                    while let Some(chunk) = feeder.next_chunk()? {
                        for read in &chunk {
                            this.observe_read(read, &filter);
                        }
                    }
                    Ok(())
                })?;
                filter
            }
        };
        if let Some(path) = &opt.save_filter {
            filter.save(path)?;
            info!(path = %path.display(), "wrote pass filter");
        }

        info!(threads, "graph construction phase");
        let feeder = ReadFeeder::new(&opt.files, opt.chunk_size);
        let pass = |km: &Kmer| filter.passes(km);
        run_workers(threads, || {
            while let Some(chunk) = feeder.next_chunk()? {
                for read in &chunk {
                    this.process_sequence(read, &pass);
                }
            }
            Ok(())
        })?;

        this.compact();
        info!(
            unitigs = this.num_unitigs(),
            kmers = this.num_kmers(),
            "construction complete"
        );
        Ok(())
    }

    /// Inserts one sequence into the graph, the incremental counterpart of
    /// [`CompactedDBG::build`].
    ///
    /// Non-ACGT symbols split the sequence into independently inserted
    /// fragments. Joins are applied immediately and junctions that introduce
    /// a branch into an existing unitig's interior split that unitig so
    /// branch points sit at unitig boundaries.
    pub fn add_sequence(&mut self, seq: &[u8]) {
        let k = self.k;
        let mut reps: FxHashSet<Kmer> = FxHashSet::default();
        for run in acgt_runs(seq) {
            if run.len() >= k {
                for km in sliding_kmers(run, k) {
                    reps.insert(km.rep());
                }
            }
        }
        if reps.is_empty() {
            return;
        }
        let kmer_list: Vec<Kmer> = reps.iter().copied().collect();
        let this = &*self;
        let pass = move |km: &Kmer| {
            let r = km.rep();
            reps.contains(&r) || this.find(&r).is_some()
        };
        this.process_sequence(seq, &pass);
        for km in &kmer_list {
            this.ensure_edge_boundaries(km);
        }
        this.compact();
    }

    /// Clips short tips, then removes short isolated unitigs, as toggled.
    /// Returns `(tips clipped, isolated removed)`.
    pub fn simplify(&mut self, clip_tips: bool, delete_isolated: bool) -> (usize, usize) {
        let mut clipped = 0;
        let mut removed = 0;
        if clip_tips {
            clipped = self.clip_tips();
        }
        if delete_isolated {
            removed = self.delete_isolated();
        }
        info!(clipped, removed, "simplified graph");
        (clipped, removed)
    }

    /// Every endpoint connection of the graph, one entry per unordered edge.
    pub fn links(&self) -> Vec<Link> {
        let mut edges: BTreeSet<(UnitigId, char, UnitigId, char)> = BTreeSet::new();
        for id in self.unitig_ids() {
            for dir in [Strand::Forward, Strand::Reverse] {
                let Some((tail, _)) = self.endpoint(id, dir) else {
                    continue;
                };
                for b in Base::ALL {
                    let y = tail.forward_base(b);
                    if y == tail {
                        continue;
                    }
                    for vm in self.find_all(&y) {
                        if vm.id == id || !self.occ_is_head(&vm) {
                            // Self-wraps and fold-back interiors get no
                            // connection line.
                            continue;
                        }
                        let to_strand = vm.strand;
                        let fwd = (id, dir.gfa_char(), vm.id, to_strand.gfa_char());
                        let mirror = (
                            vm.id,
                            to_strand.flip().gfa_char(),
                            id,
                            dir.flip().gfa_char(),
                        );
                        edges.insert(fwd.min(mirror));
                    }
                }
            }
        }
        edges
            .into_iter()
            .map(|(from, fc, to, tc)| Link {
                from,
                from_strand: strand_of_char(fc),
                to,
                to_strand: strand_of_char(tc),
            })
            .collect()
    }

    /// Splits a unitig into one new unitig per kept k-mer range.
    ///
    /// Ranges are in k-mer units over the stored orientation, must be
    /// disjoint and ordered, and each must be non-empty. Payloads are
    /// assigned through the `split_data` hook; an empty range list removes
    /// the unitig entirely.
    pub fn split(&self, id: UnitigId, ranges: &[Range<usize>]) -> Vec<UnitigId> {
        let k = self.k;
        let Some((ascii, cov, nk)) = self.with_unitig(id, |u| {
            (u.seq.to_ascii(), u.coverage.to_vec(), u.num_kmers(k))
        }) else {
            return Vec::new();
        };
        debug_assert!(ranges.iter().all(|r| r.start < r.end && r.end <= nk));
        let u_map = UnitigMap {
            id,
            pos: 0,
            len: nk,
            strand: Strand::Forward,
        };
        let payloads = (self.split_data)(&u_map, ranges, self);

        let buckets = self.bucket_set(&sliding_kmers(&ascii, k));
        let _guards = self.lock_buckets(buckets);
        self.retire(id);
        let mut out = Vec::with_capacity(ranges.len());
        for (i, r) in ranges.iter().enumerate() {
            let seg = ascii[r.start..r.end + k - 1].to_vec();
            let seg_cov = cov[r.start..r.end].to_vec();
            let data = payloads.get(i).cloned().unwrap_or_default();
            out.push(self.install_unitig(seg, seg_cov, data));
        }
        debug!(retired = id, pieces = out.len(), "split unitig");
        out
    }

    // ------------------------------------------------------------------
    // Read scanning
    // ------------------------------------------------------------------

    /// Feeds every canonical k-mer of a read to the cascading filter.
    fn observe_read(&self, read: &[u8], filter: &CascadingFilter) {
        let k = self.k;
        for run in acgt_runs(read) {
            if run.len() < k {
                continue;
            }
            for km in sliding_kmers(run, k) {
                filter.observe(&km);
            }
        }
    }

    /// Slides over a read and inserts every admitted novel k-mer stretch.
    fn process_sequence(&self, read: &[u8], pass: &(dyn Fn(&Kmer) -> bool + Sync)) {
        let k = self.k;
        for run in acgt_runs(read) {
            if run.len() >= k {
                self.process_run(run, pass);
            }
        }
    }

    fn process_run(&self, s: &[u8], pass: &(dyn Fn(&Kmer) -> bool + Sync)) {
        let k = self.k;
        let kms = sliding_kmers(s, k);
        let n = kms.len();
        let mut i = 0;
        while i < n {
            if !pass(&kms[i]) {
                i += 1;
                continue;
            }
            if let Some(um) = self.find(&kms[i]) {
                self.bump(&um);
                if i + 1 < n && pass(&kms[i + 1]) {
                    self.try_read_extend(&um, &kms[i + 1]);
                }
                i += 1;
                continue;
            }
            // Grow the novel stretch while consecutive links are the unique
            // continuation on both sides and the next k-mer is still absent.
            let mut j = i;
            while j + 1 < n
                && pass(&kms[j + 1])
                && link_ok(&kms[j], &kms[j + 1], pass)
                && self.find(&kms[j + 1]).is_none()
            {
                j += 1;
            }
            self.introduce(&s[i..j + k], pass);
            i = j + 1;
        }
    }

    /// Builds a provisional unitig around a novel read stretch and commits
    /// it under the bucket locks.
    fn introduce(&self, run: &[u8], pass: &(dyn Fn(&Kmer) -> bool + Sync)) {
        let k = self.k;
        let run_kmers = run.len() - k + 1;
        let mut bytes = run.to_vec();
        let mut first = Kmer::from_valid_ascii(&bytes[..k]);
        let mut last = Kmer::from_valid_ascii(&bytes[bytes.len() - k..]);

        // Filter walk beyond the read, stopping at branches, k-mers already
        // in the graph, and loop closure.
        loop {
            let Some(y) = walk_forward(&last, pass) else {
                break;
            };
            if y == first || self.find(&y).is_some() {
                break;
            }
            bytes.push(y.base_at(k - 1).to_ascii());
            last = y;
        }
        let mut left = Vec::new();
        loop {
            let Some(z) = walk_backward(&first, pass) else {
                break;
            };
            if z == last || self.find(&z).is_some() {
                break;
            }
            left.push(z.base_at(0).to_ascii());
            first = z;
        }
        let run_offset = left.len();
        if !left.is_empty() {
            left.reverse();
            left.extend_from_slice(&bytes);
            bytes = left;
        }
        self.commit(&bytes, run_offset, run_kmers);
    }

    /// Commits a provisional unitig: takes the bucket locks of every k-mer,
    /// re-checks presence, and installs the segments that are still absent.
    fn commit(&self, bytes: &[u8], run_offset: usize, run_kmers: usize) {
        let k = self.k;
        let kms = sliding_kmers(bytes, k);
        let n = kms.len();
        let _guards = self.lock_buckets(self.bucket_set(&kms));

        let present: Vec<bool> = kms.iter().map(|km| self.find(km).is_some()).collect();
        // Read occurrences that lost the introduction race still count.
        for p in run_offset..run_offset + run_kmers {
            if present[p] {
                if let Some(um) = self.find(&kms[p]) {
                    self.bump(&um);
                }
            }
        }
        let mut p = 0;
        while p < n {
            if present[p] {
                p += 1;
                continue;
            }
            let mut q = p;
            while q + 1 < n && !present[q + 1] {
                q += 1;
            }
            let seg = bytes[p..q + k].to_vec();
            let cov = (p..=q)
                .map(|x| u32::from(x >= run_offset && x < run_offset + run_kmers))
                .collect();
            self.install_unitig(seg, cov, U::default());
            p = q + 1;
        }
    }

    // ------------------------------------------------------------------
    // Compaction: joins and endpoint extension
    // ------------------------------------------------------------------

    /// Extends a unitig by one base when the read continues past its end
    /// with a k-mer that is already in the graph but does not begin a
    /// unitig there: the continuation folds back onto an interior
    /// occurrence (typically through a palindromic k-mer), so no join can
    /// realize the edge and the end absorbs the read's extra base instead.
    fn try_read_extend(&self, um: &UnitigMap, y: &Kmer) {
        let Some(nk_u) = self.num_kmers_of(um.id) else {
            return;
        };
        // The mapped k-mer must sit at the tail of its unitig as the read
        // traverses it.
        let dir = match um.strand {
            Strand::Forward if um.pos == nk_u - 1 => Strand::Forward,
            Strand::Reverse if um.pos == 0 => Strand::Reverse,
            _ => return,
        };
        let occs = self.find_all(y);
        let Some(vm) = occs.first().copied() else {
            // Novel continuation: the normal run insertion handles it.
            return;
        };
        // A continuation that begins a unitig somewhere is a boundary edge,
        // realized by compaction (join) or left alone at a branch.
        if occs.iter().any(|occ| self.occ_is_head(occ)) {
            return;
        }
        // Loop closure: wrapping onto the unitig's own head.
        let Some(head) = self.with_unitig(um.id, |u| u.kmer_in(0, self.k, dir)) else {
            return;
        };
        if *y == head {
            return;
        }
        let Some(tail) = self.with_unitig(um.id, |u| u.kmer_in(nk_u - 1, self.k, dir)) else {
            return;
        };
        if self.mapped_successors(&tail) != vec![*y]
            || self.mapped_predecessors(y) != vec![tail]
        {
            return;
        }
        self.append_base(um.id, dir, y, &vm);
    }

    /// The graph k-mers reachable forward from `a`, trivial self-edge
    /// excluded.
    fn mapped_successors(&self, a: &Kmer) -> Vec<Kmer> {
        Base::ALL
            .into_iter()
            .map(|b| a.forward_base(b))
            .filter(|y| y != a && self.find(y).is_some())
            .collect()
    }

    fn mapped_predecessors(&self, a: &Kmer) -> Vec<Kmer> {
        Base::ALL
            .into_iter()
            .map(|b| a.backward_base(b))
            .filter(|y| y != a && self.find(y).is_some())
            .collect()
    }

    /// Restores unitig maximality: joins every pair of unitigs whose shared
    /// endpoint has exactly one continuation on each side.
    pub(crate) fn compact(&self) {
        loop {
            let mut changed = false;
            for id in self.unitig_ids() {
                if !self.is_live(id) {
                    continue;
                }
                for dir in [Strand::Forward, Strand::Reverse] {
                    if self.is_live(id) && self.try_extend(id, dir) {
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// Attempts one join at the tail of `(id, dir)`.
    fn try_extend(&self, id: UnitigId, dir: Strand) -> bool {
        let Some((tail, head)) = self.endpoint_pair(id, dir) else {
            return false;
        };

        // Unique mapped successor of the tail.
        let succs = self.mapped_successors(&tail);
        let [y] = succs.as_slice() else { return false };

        // The successor's unique predecessor must be our tail.
        if self.mapped_predecessors(y) != vec![tail] {
            return false;
        }
        if *y == head {
            // Closed loop: the path wraps onto its own head.
            return false;
        }
        // The successor must begin another unitig in a matching direction
        // for a join; self-wraps and fold-back interiors stay as is.
        let Some(vm) = self
            .find_all(y)
            .into_iter()
            .find(|vm| vm.id != id && self.occ_is_head(vm))
        else {
            return false;
        };
        self.join(id, dir, vm.id, vm.strand);
        true
    }

    /// Joins `(tail_id, tail_dir)` with `(head_id, head_dir)` over a k-1
    /// overlap, combining coverage and payloads and retiring the sources.
    fn join(&self, tail_id: UnitigId, tail_dir: Strand, head_id: UnitigId, head_dir: Strand) {
        let k = self.k;
        let Some((t_ascii, t_cov, t_nk)) = self.oriented(tail_id, tail_dir) else {
            return;
        };
        let Some((h_ascii, h_cov, h_nk)) = self.oriented(head_id, head_dir) else {
            return;
        };
        debug_assert_eq!(t_ascii[t_ascii.len() - (k - 1)..], h_ascii[..k - 1]);
        let tail_map = UnitigMap {
            id: tail_id,
            pos: 0,
            len: t_nk,
            strand: tail_dir,
        };
        let head_map = UnitigMap {
            id: head_id,
            pos: 0,
            len: h_nk,
            strand: head_dir,
        };
        let data = (self.join_data)(&tail_map, &head_map, self);

        let mut merged = t_ascii;
        merged.extend_from_slice(&h_ascii[k - 1..]);
        let mut cov = t_cov;
        cov.extend(h_cov);

        let buckets = self.bucket_set(&sliding_kmers(&merged, k));
        let _guards = self.lock_buckets(buckets);
        self.retire(tail_id);
        self.retire(head_id);
        let new_id = self.install_unitig(merged, cov, data);
        debug!(tail = tail_id, head = head_id, joined = new_id, "joined unitigs");
    }

    /// Extends `(id, dir)` by the single base `y` contributes, preserving
    /// the unitig's payload. The new position inherits the coverage of the
    /// occurrence the continuation folds back onto.
    fn append_base(&self, id: UnitigId, dir: Strand, y: &Kmer, at: &UnitigMap) {
        let k = self.k;
        let Some((mut ascii, mut cov, _)) = self.oriented(id, dir) else {
            return;
        };
        let Some(data) = self.with_unitig(id, |u| u.data.clone()) else {
            return;
        };
        let folded = self
            .with_unitig(at.id, |u| u.coverage.get(at.pos))
            .unwrap_or(0);
        ascii.push(y.base_at(k - 1).to_ascii());
        cov.push(folded);

        let kms = sliding_kmers(&ascii, k);
        let _guards = self.lock_buckets(self.bucket_set(&kms));
        self.retire(id);
        self.install_unitig(ascii, cov, data);
    }

    // ------------------------------------------------------------------
    // Simplification
    // ------------------------------------------------------------------

    /// A tip: shorter than 2k-1 bases with exactly one neighbor.
    fn is_tip(&self, id: UnitigId) -> bool {
        self.with_unitig(id, |u| u.seq.len()).is_some_and(|len| {
            len < 2 * self.k - 1 && self.degree(id) == 1
        })
    }

    /// Removes tips to a fixed point; each removal may expose a new tip.
    fn clip_tips(&self) -> usize {
        let mut total = 0;
        loop {
            let candidates: Vec<UnitigId> = self
                .unitig_ids()
                .into_par_iter()
                .filter(|&id| self.is_tip(id))
                .collect();
            if candidates.is_empty() {
                break;
            }
            let mut any = false;
            for id in candidates {
                // Earlier removals in this round may have changed the degree.
                if self.is_live(id) && self.is_tip(id) {
                    self.remove_unitig(id);
                    total += 1;
                    any = true;
                }
            }
            if !any {
                break;
            }
        }
        total
    }

    /// Removes unitigs shorter than 2k-1 bases with no neighbors.
    fn delete_isolated(&self) -> usize {
        let short_isolated: Vec<UnitigId> = self
            .unitig_ids()
            .into_par_iter()
            .filter(|&id| {
                self.with_unitig(id, |u| u.seq.len())
                    .is_some_and(|len| len < 2 * self.k - 1 && self.degree(id) == 0)
            })
            .collect();
        let total = short_isolated.len();
        for id in short_isolated {
            self.remove_unitig(id);
        }
        total
    }

    /// The number of endpoint connections over both sides. Self-edges are
    /// not counted: neither the trivial homopolymer wrap of an endpoint
    /// onto itself nor a unitig connecting back onto its own occurrences,
    /// so a short circular unitig is isolated, not a tip.
    pub fn degree(&self, id: UnitigId) -> usize {
        let mut count = 0;
        for dir in [Strand::Forward, Strand::Reverse] {
            let Some((tail, _)) = self.endpoint(id, dir) else {
                continue;
            };
            for b in Base::ALL {
                let y = tail.forward_base(b);
                if y != tail && self.find_all(&y).iter().any(|vm| vm.id != id) {
                    count += 1;
                }
            }
        }
        count
    }

    // ------------------------------------------------------------------
    // Boundary repair for incremental insertion
    // ------------------------------------------------------------------

    /// Splits unitigs so that every edge out of `x` connects unitig
    /// endpoints rather than interiors. New branches introduced by an
    /// incremental insertion are resolved here.
    fn ensure_edge_boundaries(&self, x: &Kmer) {
        let orientations = if *x == x.twin() {
            vec![*x]
        } else {
            vec![*x, x.twin()]
        };
        for kx in orientations {
            for b in Base::ALL {
                let y = kx.forward_base(b);
                if y == kx {
                    continue;
                }
                self.ensure_boundary(&kx, &y);
            }
        }
    }

    /// Makes the edge `x -> y` (when both k-mers exist) either run inside a
    /// unitig or connect a tail occurrence of `x` to a head occurrence of
    /// `y`, splitting interiors as needed.
    fn ensure_boundary(&self, x: &Kmer, y: &Kmer) {
        loop {
            let xs = self.find_all(x);
            if xs.is_empty() {
                return;
            }
            let ys = self.find_all(y);
            if ys.is_empty() {
                return;
            }
            // Already realized inside a unitig at some occurrence of `x`.
            if xs
                .iter()
                .any(|xm| self.occ_next_kmer(xm).as_ref() == Some(y))
            {
                return;
            }
            // `x` needs a tail occurrence.
            if !xs.iter().any(|xm| self.occ_is_tail(xm)) {
                let xm = xs[0];
                let Some(nk) = self.num_kmers_of(xm.id) else {
                    return;
                };
                let cut = match xm.strand {
                    Strand::Forward => xm.pos + 1,
                    Strand::Reverse => xm.pos,
                };
                self.split(xm.id, &[0..cut, cut..nk]);
                continue;
            }
            // `y` needs a head occurrence.
            if !ys.iter().any(|ym| self.occ_is_head(ym)) {
                let ym = ys[0];
                let Some(nk) = self.num_kmers_of(ym.id) else {
                    return;
                };
                let cut = match ym.strand {
                    Strand::Forward => ym.pos,
                    Strand::Reverse => ym.pos + 1,
                };
                self.split(ym.id, &[0..cut, cut..nk]);
                continue;
            }
            return;
        }
    }

    // ------------------------------------------------------------------
    // Arena and index plumbing
    // ------------------------------------------------------------------

    fn read_slots(&self) -> RwLockReadGuard<'_, Vec<Option<Unitig<U>>>> {
        match self.slots.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_slots(&self) -> RwLockWriteGuard<'_, Vec<Option<Unitig<U>>>> {
        match self.slots.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn with_unitig<R>(&self, id: UnitigId, f: impl FnOnce(&Unitig<U>) -> R) -> Option<R> {
        self.read_slots()
            .get(id)
            .and_then(Option::as_ref)
            .map(f)
    }

    fn is_live(&self, id: UnitigId) -> bool {
        self.with_unitig(id, |_| ()).is_some()
    }

    fn num_kmers_of(&self, id: UnitigId) -> Option<usize> {
        let k = self.k;
        self.with_unitig(id, |u| u.num_kmers(k))
    }

    /// The tail k-mer of `(id, dir)` and the unitig's k-mer count.
    fn endpoint(&self, id: UnitigId, dir: Strand) -> Option<(Kmer, usize)> {
        let k = self.k;
        self.with_unitig(id, |u| {
            let nk = u.num_kmers(k);
            (u.kmer_in(nk - 1, k, dir), nk)
        })
    }

    /// The tail and head k-mers of `(id, dir)`.
    fn endpoint_pair(&self, id: UnitigId, dir: Strand) -> Option<(Kmer, Kmer)> {
        let k = self.k;
        self.with_unitig(id, |u| {
            let nk = u.num_kmers(k);
            (u.kmer_in(nk - 1, k, dir), u.kmer_in(0, k, dir))
        })
    }

    /// The unitig's bases, coverage, and k-mer count read in `dir`.
    fn oriented(&self, id: UnitigId, dir: Strand) -> Option<(Vec<u8>, Vec<u32>, usize)> {
        let k = self.k;
        self.with_unitig(id, |u| match dir {
            Strand::Forward => (u.seq.to_ascii(), u.coverage.to_vec(), u.num_kmers(k)),
            Strand::Reverse => (
                u.seq.rev_comp().to_ascii(),
                u.coverage.to_vec_reversed(),
                u.num_kmers(k),
            ),
        })
    }

    fn bump(&self, um: &UnitigMap) {
        if let Some(u) = self.read_slots().get(um.id).and_then(Option::as_ref) {
            u.coverage.bump(um.pos);
        }
    }

    /// Installs a unitig in canonical-head orientation and indexes it.
    /// Callers performing structural edits hold the relevant bucket locks.
    fn install_unitig(&self, ascii: Vec<u8>, cov: Vec<u32>, data: U) -> UnitigId {
        let k = self.k;
        debug_assert!(ascii.len() >= k);
        debug_assert_eq!(cov.len(), ascii.len() - k + 1);
        let head = Kmer::from_valid_ascii(&ascii[..k]);
        let rc_head = Kmer::from_valid_ascii(&ascii[ascii.len() - k..]).twin();
        let (ascii, cov) = if rc_head < head {
            let mut cov = cov;
            cov.reverse();
            (revcomp_ascii(&ascii), cov)
        } else {
            (ascii, cov)
        };
        let seq = CompressedSequence::from_valid_ascii(&ascii);
        let entries = self.index_entries(&seq);
        let id = {
            let mut slots = self.write_slots();
            slots.push(Some(Unitig {
                seq,
                coverage: CoverageVec::from_counts(cov),
                data,
            }));
            slots.len() - 1
        };
        for (m, pos) in entries {
            self.index.insert(m, Occurrence { unitig: id, pos });
        }
        id
    }

    /// Removes a unitig's index entries and tombstones its slot.
    /// Callers hold the relevant bucket locks.
    fn retire(&self, id: UnitigId) {
        let Some(entries) = self.with_unitig(id, |u| self.index_entries(&u.seq)) else {
            return;
        };
        for (m, _) in entries {
            self.index.remove_matching(&m, |occ| occ.unitig == id);
        }
        let mut slots = self.write_slots();
        if let Some(slot) = slots.get_mut(id) {
            *slot = None;
        }
    }

    /// Removes a unitig under its bucket locks.
    fn remove_unitig(&self, id: UnitigId) {
        let k = self.k;
        let Some(ascii) = self.with_unitig(id, |u| u.seq.to_ascii()) else {
            return;
        };
        let _guards = self.lock_buckets(self.bucket_set(&sliding_kmers(&ascii, k)));
        self.retire(id);
    }

    /// The minimizer occurrence entries for a unitig sequence: one entry per
    /// distinct (minimizer, window position), consecutive duplicates folded.
    fn index_entries(&self, seq: &CompressedSequence) -> Vec<(Minimizer, u32)> {
        let k = self.k;
        let n = seq.len() - k + 1;
        let mut out: Vec<(Minimizer, u32)> = Vec::new();
        for p in 0..n {
            let km = seq.kmer_at(p, k);
            let (m, d) = Minimizer::of(&km, self.g);
            let entry = (m, (p + d) as u32);
            if out.last() != Some(&entry) {
                out.push(entry);
            }
        }
        out
    }

    fn bucket_of(&self, km: &Kmer) -> usize {
        let (m, _) = Minimizer::of(&km.rep(), self.g);
        (m.hash() as usize) & (NUM_BUCKETS - 1)
    }

    fn bucket_set(&self, kms: &[Kmer]) -> Vec<usize> {
        let mut ids: Vec<usize> = kms.iter().map(|km| self.bucket_of(km)).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Acquires bucket mutexes in sorted order; callers pass a sorted,
    /// deduplicated id list.
    fn lock_buckets(&self, ids: Vec<usize>) -> Vec<MutexGuard<'_, ()>> {
        debug_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        ids.into_iter()
            .map(|i| match self.buckets[i].lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            })
            .collect()
    }
}

fn strand_of_char(c: char) -> Strand {
    if c == '+' {
        Strand::Forward
    } else {
        Strand::Reverse
    }
}

/// Runs the same pull-loop on `threads` OS threads and returns the first
/// worker error.
fn run_workers<F>(threads: usize, work: F) -> Result<(), KontigError>
where
    F: Fn() -> Result<(), KontigError> + Sync,
{
    if threads <= 1 {
        return work();
    }
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..threads).map(|_| scope.spawn(&work)).collect();
        let mut result = Ok(());
        for handle in handles {
            match handle.join() {
                Ok(worker_result) => {
                    if result.is_ok() {
                        result = worker_result;
                    }
                }
                Err(panicked) => std::panic::resume_unwind(panicked),
            }
        }
        result
    })
}

/// Maximal ACGT-only substrings of a read; other symbols act as separators.
pub(crate) fn acgt_runs(seq: &[u8]) -> impl Iterator<Item = &[u8]> {
    seq.split(|&b| Base::from_ascii(b).is_none())
        .filter(|s| !s.is_empty())
}

/// The unique filter-passing forward continuation, if any.
fn unique_forward(a: &Kmer, pass: &(dyn Fn(&Kmer) -> bool + Sync)) -> Option<Kmer> {
    let mut found = None;
    for b in Base::ALL {
        let y = a.forward_base(b);
        if pass(&y) {
            if found.is_some() {
                return None;
            }
            found = Some(y);
        }
    }
    found
}

fn unique_backward(a: &Kmer, pass: &(dyn Fn(&Kmer) -> bool + Sync)) -> Option<Kmer> {
    let mut found = None;
    for b in Base::ALL {
        let y = a.backward_base(b);
        if pass(&y) {
            if found.is_some() {
                return None;
            }
            found = Some(y);
        }
    }
    found
}

/// True when `a -> b` is the unique continuation on both sides.
fn link_ok(a: &Kmer, b: &Kmer, pass: &(dyn Fn(&Kmer) -> bool + Sync)) -> bool {
    unique_forward(a, pass) == Some(*b) && unique_backward(b, pass) == Some(*a)
}

fn walk_forward(a: &Kmer, pass: &(dyn Fn(&Kmer) -> bool + Sync)) -> Option<Kmer> {
    let y = unique_forward(a, pass)?;
    (unique_backward(&y, pass) == Some(*a)).then_some(y)
}

fn walk_backward(a: &Kmer, pass: &(dyn Fn(&Kmer) -> bool + Sync)) -> Option<Kmer> {
    let y = unique_backward(a, pass)?;
    (unique_forward(&y, pass) == Some(*a)).then_some(y)
}

/// Every k-mer of a validated ACGT slice, derived incrementally.
fn sliding_kmers(s: &[u8], k: usize) -> Vec<Kmer> {
    debug_assert!(s.len() >= k);
    let mut kms = Vec::with_capacity(s.len() - k + 1);
    let mut cur = Kmer::from_valid_ascii(&s[..k]);
    kms.push(cur);
    for &b in &s[k..] {
        cur = cur.forward_base(Base::from_ascii(b).map_or(Base::A, |base| base));
        kms.push(cur);
    }
    kms
}

fn revcomp_ascii(s: &[u8]) -> Vec<u8> {
    s.iter()
        .rev()
        .map(|&b| match b {
            b'A' => b'T',
            b'C' => b'G',
            b'G' => b'C',
            _ => b'A',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn km(s: &str) -> Kmer {
        s.parse().unwrap()
    }

    fn sorted_seqs<U: Default + Clone + Send + Sync>(cdbg: &CompactedDBG<U>) -> Vec<String> {
        let mut seqs = cdbg.sequences();
        seqs.sort();
        seqs
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(CompactedDBG::<()>::new(0, 1).is_err());
        assert!(CompactedDBG::<()>::new(MAX_KMER_SIZE, 3).is_err());
        assert!(CompactedDBG::<()>::new(4, 4).is_err());
        assert!(CompactedDBG::<()>::new(4, 0).is_err());
        assert!(CompactedDBG::<()>::new(4, 3).is_ok());
    }

    #[test]
    fn single_sequence_becomes_one_unitig() {
        let mut cdbg = CompactedDBG::<()>::new(4, 3).unwrap();
        cdbg.add_sequence(b"AACCGGTT");
        assert_eq!(cdbg.num_unitigs(), 1);
        // The whole palindromic read is one unitig, stored as given.
        assert_eq!(cdbg.sequences(), vec!["AACCGGTT".to_string()]);
    }

    #[test]
    fn find_locates_both_orientations() {
        let mut cdbg = CompactedDBG::<()>::new(4, 3).unwrap();
        cdbg.add_sequence(b"AATGGC");
        let fwd = cdbg.find(&km("AATG")).unwrap();
        assert_eq!(fwd.pos, 0);
        assert!(fwd.strand.is_forward());
        // CCAT is the twin of ATGG, stored at position 1.
        let rev = cdbg.find(&km("CCAT")).unwrap();
        assert_eq!(rev.pos, 1);
        assert!(!rev.strand.is_forward());
        // A k-mer that never occurred is absent.
        assert!(cdbg.find(&km("TTTT")).is_none());
    }

    #[test]
    fn non_acgt_splits_fragments() {
        let mut cdbg = CompactedDBG::<()>::new(4, 3).unwrap();
        cdbg.add_sequence(b"AAATNCCGC");
        // Two fragments sharing no k-mers in either orientation.
        assert_eq!(cdbg.num_unitigs(), 2);
    }

    #[test]
    fn repeated_insertion_bumps_coverage() {
        let mut cdbg = CompactedDBG::<()>::new(4, 3).unwrap();
        cdbg.add_sequence(b"AATGGC");
        cdbg.add_sequence(b"AATGGC");
        let id = cdbg.unitig_ids()[0];
        let cov = cdbg.coverage(id).unwrap();
        assert_eq!(cov.len(), 3);
        assert!(cov.iter().all(|&c| c == 2), "coverage {cov:?}");
    }

    #[test]
    fn incremental_overlap_joins() {
        let mut cdbg = CompactedDBG::<()>::new(4, 3).unwrap();
        cdbg.add_sequence(b"AACCG");
        cdbg.add_sequence(b"ACCGT");
        assert_eq!(sorted_seqs(&cdbg), vec!["AACCGT".to_string()]);
    }

    #[test]
    fn branch_splits_existing_unitig() {
        let mut cdbg = CompactedDBG::<()>::new(4, 3).unwrap();
        cdbg.add_sequence(b"TTCAACC");
        assert_eq!(cdbg.num_unitigs(), 1);
        // CAAG branches off the interior k-mer CAAC's predecessor TCAA.
        cdbg.add_sequence(b"TCAAG");
        let seqs = sorted_seqs(&cdbg);
        assert!(seqs.len() > 1, "expected a split, got {seqs:?}");
        // Every original k-mer is still present.
        for w in ["TTCA", "TCAA", "CAAC", "AACC", "TCAAG"] {
            for i in 0..=w.len() - 4 {
                assert!(
                    cdbg.find(&km(&w[i..i + 4])).is_some(),
                    "lost k-mer {}",
                    &w[i..i + 4]
                );
            }
        }
    }

    #[test]
    fn payload_hooks_combine_on_join() {
        fn join_sum(tail: &UnitigMap, head: &UnitigMap, cdbg: &CompactedDBG<u32>) -> u32 {
            cdbg.data(tail).unwrap_or(0) + cdbg.data(head).unwrap_or(0)
        }
        fn split_share(
            u: &UnitigMap,
            ranges: &[Range<usize>],
            cdbg: &CompactedDBG<u32>,
        ) -> Vec<u32> {
            let total = cdbg.data(u).unwrap_or(0);
            ranges.iter().map(|_| total / ranges.len() as u32).collect()
        }
        let mut cdbg = CompactedDBG::<u32>::with_hooks(4, 3, join_sum, split_share).unwrap();
        cdbg.add_sequence(b"AACCG");
        cdbg.add_sequence(b"ACCGT");
        assert_eq!(cdbg.num_unitigs(), 1);
        // Defaults are zero, so the joined payload is zero; the hook ran
        // without panicking and the graph is intact.
        let id = cdbg.unitig_ids()[0];
        assert_eq!(cdbg.unitig_seq(id).unwrap(), "AACCGT");
    }

    #[test]
    fn split_produces_ranges_and_retires_source() {
        let mut cdbg = CompactedDBG::<()>::new(4, 3).unwrap();
        cdbg.add_sequence(b"AATGGCA");
        let id = cdbg.unitig_ids()[0];
        let nk = cdbg.num_kmers_of(id).unwrap();
        assert_eq!(nk, 4);
        let pieces = cdbg.split(id, &[0..2, 2..4]);
        assert_eq!(pieces.len(), 2);
        assert!(!cdbg.is_live(id));
        let seqs = cdbg.sequences();
        assert_eq!(seqs.len(), 2);
        // Each piece spans its k-mer range plus the k-1 overlap.
        assert!(seqs.iter().all(|s| s.len() == 5));
    }

    #[test]
    fn split_with_no_ranges_removes_unitig() {
        let mut cdbg = CompactedDBG::<()>::new(4, 3).unwrap();
        cdbg.add_sequence(b"AATGGCA");
        let id = cdbg.unitig_ids()[0];
        cdbg.split(id, &[]);
        assert_eq!(cdbg.num_unitigs(), 0);
        assert!(cdbg.find(&km("AATG")).is_none());
    }

    #[test]
    fn degree_counts_both_sides() {
        let mut cdbg = CompactedDBG::<()>::new(4, 3).unwrap();
        cdbg.add_sequence(b"AAAAC");
        cdbg.add_sequence(b"AAAAG");
        // AAAA has two successors; each tip has one neighbor.
        let mut degrees: Vec<(String, usize)> = cdbg
            .unitigs()
            .into_iter()
            .map(|(id, s)| (s, cdbg.degree(id)))
            .collect();
        degrees.sort();
        let aaaa = degrees.iter().find(|(s, _)| s == "AAAA").unwrap();
        assert_eq!(aaaa.1, 2);
        for (s, d) in &degrees {
            if s != "AAAA" {
                assert_eq!(*d, 1, "tip {s} degree");
            }
        }
    }

    #[test]
    fn degree_excludes_self_edges() {
        // The k-mer cycle ACGT -> CGTA -> GTAC -> TACG wraps onto its own
        // head, so every endpoint continuation maps back into the same
        // unitig. Those self-edges are not neighbors: the unitig is
        // isolated, not a tip.
        let mut cdbg = CompactedDBG::<()>::new(4, 3).unwrap();
        cdbg.add_sequence(b"ACGTACGTACGTACG");
        assert_eq!(cdbg.num_unitigs(), 1);
        let id = cdbg.unitig_ids()[0];
        assert_eq!(cdbg.degree(id), 0);
        assert!(cdbg.links().is_empty());
    }

    #[test]
    fn read_extension_absorbs_fold_back_continuation() {
        // ACGTAC folds through the palindromic k-mer GTAC: the tail's
        // continuation TACG exists only as the twin of the interior CGTA
        // occurrence, so no join can realize the edge. A read traversing
        // past the end extends the unitig by exactly one base instead, and
        // the new position inherits the folded occurrence's coverage.
        let mut cdbg = CompactedDBG::<()>::new(4, 3).unwrap();
        cdbg.add_sequence(b"ACGTA");
        cdbg.add_sequence(b"CGTAC");
        let id = cdbg.unitig_ids()[0];
        assert_eq!(cdbg.unitig_seq(id).unwrap(), "ACGTAC");
        assert_eq!(cdbg.coverage(id).unwrap(), vec![1, 2, 1]);

        // The continuation maps onto an interior reverse occurrence, not a
        // unitig head.
        let vm = cdbg.find(&km("TACG")).unwrap();
        assert_eq!(vm.pos, 1);
        assert!(!vm.strand.is_forward());

        let um = cdbg.find(&km("GTAC")).unwrap();
        assert_eq!(um.pos, 2);
        cdbg.try_read_extend(&um, &km("TACG"));

        let id = cdbg.unitig_ids()[0];
        assert_eq!(cdbg.unitig_seq(id).unwrap(), "ACGTACG");
        assert_eq!(cdbg.coverage(id).unwrap(), vec![1, 2, 1, 2]);
    }
}
