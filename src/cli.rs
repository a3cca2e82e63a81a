//! Command-line interface definition.

use clap::Parser;
use std::path::PathBuf;

use crate::graph::BuildOptions;
use crate::kmer::MAX_KMER_SIZE;

/// A fast, parallel compacted de Bruijn graph constructor for DNA sequences
/// in FASTA and FASTQ files.
///
/// Builds a graph whose vertices are maximal non-branching paths of
/// canonical k-mers, optionally simplifies it, and writes it as GFA 1.0.
///
/// # Examples
///
/// ```bash
/// # Sequencing reads: keep k-mers occurring at least twice
/// kontig -n 100000000 -N 70000000 -o graph -t 8 reads.fq.gz
///
/// # Reference sequences: no filtering
/// kontig -n 3000000 --ref -o graph genome.fa
///
/// # Clip tips and drop isolated short unitigs
/// kontig -n 100000000 -N 70000000 -o graph -c -r reads_1.fq reads_2.fq
/// ```
#[derive(Parser, Debug)]
#[command(name = "kontig")]
#[command(version, author, about, long_about = None)]
pub struct Args {
    /// Estimated number (upper bound) of distinct k-mers in the input
    #[arg(short = 'n', long = "num-kmers")]
    pub nkmers: usize,

    /// Estimated number (upper bound) of k-mers occurring twice or more
    /// (required unless --ref)
    #[arg(short = 'N', long = "num-kmers2")]
    pub nkmers2: Option<usize>,

    /// Prefix for the output GFA file (writes <prefix>.gfa)
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Number of worker threads
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    pub threads: usize,

    /// Length of k-mers
    #[arg(short = 'k', long = "kmer-length", default_value_t = 31)]
    pub kmer_length: usize,

    /// Length of minimizers
    #[arg(short = 'g', long = "minimizer-length", default_value_t = 23)]
    pub minimizer_length: usize,

    /// Bloom filter bits per k-mer occurring at least once
    #[arg(short = 'b', long = "bloom-bits", default_value_t = 14)]
    pub bloom_bits: usize,

    /// Bloom filter bits per k-mer occurring at least twice
    #[arg(short = 'B', long = "bloom-bits2", default_value_t = 14)]
    pub bloom_bits2: usize,

    /// Load a persisted Bloom filter and skip the filtering phase
    #[arg(short = 'l', long = "load-filter")]
    pub load_filter: Option<PathBuf>,

    /// Write the pass Bloom filter after the filtering phase
    #[arg(short = 'f', long = "save-filter")]
    pub save_filter: Option<PathBuf>,

    /// Number of reads in each work chunk shared between threads
    #[arg(short = 's', long = "chunk-size", default_value_t = 10_000)]
    pub chunk_size: usize,

    /// Reference mode: no filtering, every observed k-mer is kept
    #[arg(long = "ref")]
    pub reference: bool,

    /// Clip tips shorter than 2k-1 bases
    #[arg(short = 'c', long = "clip-tips")]
    pub clip_tips: bool,

    /// Remove isolated unitigs shorter than 2k-1 bases
    #[arg(short = 'r', long = "rm-isolated")]
    pub rm_isolated: bool,

    /// Print progress messages during construction
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Input FASTA/FASTQ files, plain or gzipped
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

impl Args {
    /// The output GFA path: `<prefix>.gfa`.
    pub fn gfa_path(&self) -> PathBuf {
        let mut s = self.output.as_os_str().to_os_string();
        s.push(".gfa");
        PathBuf::from(s)
    }

    /// Checks every option up front so no thread is started against an
    /// unusable configuration. Returns one message per violation.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let max_threads = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1);
        if self.threads == 0 {
            errors.push("number of threads cannot be 0".to_string());
        } else if self.threads > max_threads {
            errors.push(format!(
                "number of threads cannot be greater than {max_threads}"
            ));
        }

        if self.chunk_size == 0 {
            errors.push("read chunk size cannot be 0".to_string());
        }

        if self.kmer_length == 0 || self.kmer_length >= MAX_KMER_SIZE {
            errors.push(format!(
                "length k of k-mers must be between 1 and {}",
                MAX_KMER_SIZE - 1
            ));
        }
        if self.minimizer_length == 0 || self.minimizer_length >= self.kmer_length {
            errors.push("length g of minimizers must be between 1 and k-1".to_string());
        }

        if self.nkmers == 0 {
            errors.push("estimated number of distinct k-mers cannot be 0".to_string());
        }
        if self.bloom_bits == 0 {
            errors.push("number of Bloom filter bits per k-mer cannot be 0".to_string());
        }
        if !self.reference {
            match self.nkmers2 {
                None => errors.push(
                    "estimated number of k-mers occurring twice or more is required \
                     without --ref"
                        .to_string(),
                ),
                Some(0) => errors.push(
                    "estimated number of k-mers occurring twice or more cannot be 0".to_string(),
                ),
                Some(n2) if n2 > self.nkmers => errors.push(
                    "the estimated number of k-mers occurring twice or more cannot be \
                     greater than the estimated number of distinct k-mers"
                        .to_string(),
                ),
                Some(_) => {}
            }
            if self.bloom_bits2 == 0 {
                errors.push("number of Bloom filter bits per non-unique k-mer cannot be 0".to_string());
            }
        }

        for file in &self.files {
            if !file.exists() {
                errors.push(format!("file not found: {}", file.display()));
            }
        }

        if let Some(path) = &self.load_filter {
            if std::fs::File::open(path).is_err() {
                errors.push(format!(
                    "could not read input Bloom filter file: {}",
                    path.display()
                ));
            }
        }
        if let Some(path) = &self.save_filter {
            if std::fs::File::create(path).is_err() {
                errors.push(format!(
                    "could not open file for writing output Bloom filter: {}",
                    path.display()
                ));
            }
        }

        let gfa = self.gfa_path();
        if std::fs::File::create(&gfa).is_err() {
            errors.push(format!(
                "could not open file for writing output graph: {}",
                gfa.display()
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// The build parameters implied by these arguments.
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            files: self.files.clone(),
            nkmers: self.nkmers,
            nkmers2: self.nkmers2.unwrap_or(0),
            bloom_bits: self.bloom_bits,
            bloom_bits2: self.bloom_bits2,
            reference: self.reference,
            threads: self.threads,
            chunk_size: self.chunk_size,
            load_filter: self.load_filter.clone(),
            save_filter: self.save_filter.clone(),
        }
    }
}
