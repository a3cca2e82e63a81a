//! # Kontig
//!
//! Kontig is a fast, parallel constructor of compacted de Bruijn graphs
//! (cDBG) from DNA sequencing reads or reference sequences in FASTA and
//! FASTQ files, run from the command line or used as a library.
//!
//! Given one or more input files, kontig builds a graph whose vertices
//! ("unitigs") are maximal non-branching paths of canonical k-mers and
//! whose edges are implicit k-1 overlaps, optionally simplifies it, and
//! writes it in the GFA 1.0 interchange format:
//!
//! ```bash
//! kontig -n 100000000 -N 70000000 -o graph -t 8 -c -r reads_1.fq.gz reads_2.fq.gz
//! ```
//!
//! Sequencing errors are isolated by a two-stage cascading Bloom filter so
//! only k-mers occurring at least twice reach the graph; `--ref` disables
//! the second stage for error-free reference input.
//!
//! The building blocks are exposed as a library: [`kmer::Kmer`] packed DNA
//! words, [`bloom::BlockedBloomFilter`], the [`graph::CompactedDBG`] with
//! its polymorphic per-unitig payload, and the [`gfa`] writer.

pub mod bloom;
pub mod cascade;
pub mod cli;
pub mod coverage;
pub mod error;
pub mod feeder;
pub mod gfa;
pub mod graph;
pub mod index;
pub mod kmer;
pub mod minimizer;
pub mod sequence;
pub mod unitig;

pub use error::KontigError;
pub use graph::{BuildOptions, CompactedDBG};
pub use kmer::{Kmer, MAX_KMER_SIZE};
