//! Chunked producer over input sequence files.
//!
//! A single [`ReadFeeder`] is shared by every worker thread: each worker
//! atomically reserves the next chunk of reads, processes it to completion,
//! then pulls again. File handles advance lazily, FASTA and FASTQ are
//! detected from the extension, and gzip input is decompressed
//! transparently.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bio::io::{fasta, fastq};
use bytes::Bytes;
use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::KontigError;

type BoxedReader = BufReader<Box<dyn Read + Send>>;

enum Records {
    Fasta(fasta::Records<BoxedReader>),
    Fastq(fastq::Records<BoxedReader>),
}

impl Records {
    fn next_seq(&mut self) -> Option<Result<Bytes, KontigError>> {
        match self {
            Records::Fasta(records) => records.next().map(|r| {
                r.map(|rec| Bytes::copy_from_slice(rec.seq()))
                    .map_err(|e| KontigError::SequenceParse {
                        details: e.to_string(),
                    })
            }),
            Records::Fastq(records) => records.next().map(|r| {
                r.map(|rec| Bytes::copy_from_slice(rec.seq()))
                    .map_err(|e| KontigError::SequenceParse {
                        details: e.to_string(),
                    })
            }),
        }
    }
}

struct FeederState {
    next_file: usize,
    records: Option<Records>,
}

/// Shared multi-consumer source of read chunks.
pub struct ReadFeeder {
    files: Vec<PathBuf>,
    chunk_size: usize,
    state: Mutex<FeederState>,
}

impl ReadFeeder {
    /// Creates a feeder over `files`, handing out chunks of `chunk_size`
    /// reads.
    pub fn new(files: &[PathBuf], chunk_size: usize) -> Self {
        Self {
            files: files.to_vec(),
            chunk_size: chunk_size.max(1),
            state: Mutex::new(FeederState {
                next_file: 0,
                records: None,
            }),
        }
    }

    /// Reserves the next chunk of reads, or `None` when every file is
    /// drained. A chunk may be short at a file boundary.
    pub fn next_chunk(&self) -> Result<Option<Vec<Bytes>>, KontigError> {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        loop {
            if state.records.is_none() {
                let Some(path) = self.files.get(state.next_file) else {
                    return Ok(None);
                };
                debug!(path = %path.display(), "opening input file");
                state.records = Some(open_records(path)?);
                state.next_file += 1;
            }

            let mut chunk = Vec::with_capacity(self.chunk_size);
            if let Some(records) = state.records.as_mut() {
                while chunk.len() < self.chunk_size {
                    match records.next_seq() {
                        Some(seq) => chunk.push(seq?),
                        None => break,
                    }
                }
            }
            if chunk.is_empty() {
                // Current file is drained; move on to the next one.
                state.records = None;
                continue;
            }
            return Ok(Some(chunk));
        }
    }
}

fn open_records(path: &Path) -> Result<Records, KontigError> {
    let file = File::open(path).map_err(|e| KontigError::SequenceRead {
        source: e,
        path: path.to_path_buf(),
    })?;
    let reader: Box<dyn Read + Send> = if is_gzip(path) {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    let buffered = BufReader::new(reader);
    Ok(if is_fastq(path) {
        Records::Fastq(fastq::Reader::from_bufread(buffered).records())
    } else {
        Records::Fasta(fasta::Reader::from_bufread(buffered).records())
    })
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// FASTQ when the extension (after stripping `.gz`) is `fq`/`fastq`;
/// everything else is read as FASTA.
fn is_fastq(path: &Path) -> bool {
    let effective = if is_gzip(path) {
        path.file_stem().map(Path::new).and_then(Path::extension)
    } else {
        path.extension()
    };
    effective.is_some_and(|ext| {
        ext.eq_ignore_ascii_case("fq") || ext.eq_ignore_ascii_case("fastq")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_fasta_in_chunks() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "reads.fa",
            ">r1\nACGT\n>r2\nGGGG\n>r3\nTTTT\n",
        );

        let feeder = ReadFeeder::new(&[path], 2);
        let chunk = feeder.next_chunk().unwrap().unwrap();
        assert_eq!(chunk, vec![Bytes::from_static(b"ACGT"), Bytes::from_static(b"GGGG")]);
        let chunk = feeder.next_chunk().unwrap().unwrap();
        assert_eq!(chunk, vec![Bytes::from_static(b"TTTT")]);
        assert!(feeder.next_chunk().unwrap().is_none());
    }

    #[test]
    fn reads_fastq() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "reads.fq",
            "@r1\nACGTA\n+\nIIIII\n@r2\nCCCCC\n+\nIIIII\n",
        );

        let feeder = ReadFeeder::new(&[path], 10);
        let chunk = feeder.next_chunk().unwrap().unwrap();
        assert_eq!(chunk.len(), 2);
        assert_eq!(chunk[0], Bytes::from_static(b"ACGTA"));
    }

    #[test]
    fn crosses_file_boundaries() {
        let dir = tempdir().unwrap();
        let a = write_file(dir.path(), "a.fa", ">r1\nAAAA\n");
        let b = write_file(dir.path(), "b.fa", ">r2\nCCCC\n");

        let feeder = ReadFeeder::new(&[a, b], 10);
        let first = feeder.next_chunk().unwrap().unwrap();
        assert_eq!(first, vec![Bytes::from_static(b"AAAA")]);
        let second = feeder.next_chunk().unwrap().unwrap();
        assert_eq!(second, vec![Bytes::from_static(b"CCCC")]);
        assert!(feeder.next_chunk().unwrap().is_none());
    }

    #[test]
    fn reads_gzipped_fasta() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reads.fa.gz");
        let file = File::create(&path).unwrap();
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        encoder.write_all(b">r1\nACGTACGT\n").unwrap();
        encoder.finish().unwrap();

        let feeder = ReadFeeder::new(&[path], 10);
        let chunk = feeder.next_chunk().unwrap().unwrap();
        assert_eq!(chunk, vec![Bytes::from_static(b"ACGTACGT")]);
    }

    #[test]
    fn missing_file_reports_path() {
        let feeder = ReadFeeder::new(&[PathBuf::from("/no/such/file.fa")], 10);
        let err = feeder.next_chunk().unwrap_err();
        assert!(matches!(err, KontigError::SequenceRead { .. }));
    }

    #[test]
    fn format_detection() {
        assert!(is_fastq(Path::new("x.fq")));
        assert!(is_fastq(Path::new("x.fastq.gz")));
        assert!(!is_fastq(Path::new("x.fa")));
        assert!(!is_fastq(Path::new("x.fasta.gz")));
        assert!(is_gzip(Path::new("x.fa.gz")));
        assert!(!is_gzip(Path::new("x.fa")));
    }
}
